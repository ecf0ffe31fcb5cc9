//! 扫描过滤器

use crate::metadata::TypeMetadata;

/// 类型过滤器
pub trait TypeFilter: Send + Sync {
    fn matches(&self, metadata: &TypeMetadata) -> bool;
}

impl<F> TypeFilter for F
where
    F: Fn(&TypeMetadata) -> bool + Send + Sync,
{
    fn matches(&self, metadata: &TypeMetadata) -> bool {
        self(metadata)
    }
}

/// 匹配带有指定注解的类型
#[derive(Debug, Clone)]
pub struct AnnotationTypeFilter {
    annotation: String,
}

impl AnnotationTypeFilter {
    pub fn new(annotation: impl Into<String>) -> Self {
        Self {
            annotation: annotation.into(),
        }
    }
}

impl TypeFilter for AnnotationTypeFilter {
    fn matches(&self, metadata: &TypeMetadata) -> bool {
        metadata.has_annotation(&self.annotation)
    }
}

/// 匹配所有类型
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAllFilter;

impl TypeFilter for AcceptAllFilter {
    fn matches(&self, _metadata: &TypeMetadata) -> bool {
        true
    }
}

/// 匹配包说明记录
#[derive(Debug, Clone, Copy, Default)]
pub struct PackageInfoFilter;

impl TypeFilter for PackageInfoFilter {
    fn matches(&self, metadata: &TypeMetadata) -> bool {
        metadata.is_package_info()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::AnnotationMetadata;

    #[test]
    fn test_annotation_filter() {
        let filter = AnnotationTypeFilter::new("ProxyBean");
        let marked = TypeMetadata::interface("a::Marked").with_annotation(AnnotationMetadata::new("ProxyBean"));
        assert!(filter.matches(&marked));
        assert!(!filter.matches(&TypeMetadata::interface("a::Plain")));
    }

    #[test]
    fn test_closure_filter() {
        let filter = |m: &TypeMetadata| m.simple_name().ends_with("Repository");
        assert!(filter.matches(&TypeMetadata::interface("a::UserRepository")));
        assert!(!filter.matches(&TypeMetadata::interface("a::UserService")));
    }
}
