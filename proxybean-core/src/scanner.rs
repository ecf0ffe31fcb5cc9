//! 候选类型扫描
//!
//! 在指定包中查找带标记注解、可独立访问的 trait，生成候选 Bean 定义。
//! 扫描器只读注册表（用于名称冲突检查），不会写入。

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use crate::bean::{BeanDefinition, BeanDefinitionHolder};
use crate::bean_factory::BeanDefinitionRegistry;
use crate::constants::{
    NAME_ATTRIBUTE, PROXY_MODE_ATTRIBUTE, PROXY_MODE_INTERFACES, SCOPE_ANNOTATION,
    SCOPE_ATTRIBUTE_ALIAS,
};
use crate::filter::{AcceptAllFilter, AnnotationTypeFilter, PackageInfoFilter, TypeFilter};
use crate::metadata::{TypeMetadata, TypeMetadataSource};
use crate::scan::MarkerFilter;
use crate::scope::Scope;
use crate::scoped_proxy::create_scoped_proxy;
use crate::utils::naming::decapitalize;

/// Bean 名称生成策略
pub trait BeanNameGenerator: Send + Sync {
    fn generate_bean_name(&self, metadata: &TypeMetadata) -> String;
}

/// 默认名称生成：注解上的 `name` 属性优先，否则使用首字母小写的类型名
#[derive(Debug, Default, Clone, Copy)]
pub struct AnnotationBeanNameGenerator;

impl BeanNameGenerator for AnnotationBeanNameGenerator {
    fn generate_bean_name(&self, metadata: &TypeMetadata) -> String {
        metadata
            .annotations()
            .iter()
            .find_map(|annotation| annotation.first_text_attribute(&[NAME_ATTRIBUTE]))
            .map(|name| name.trim().to_string())
            .unwrap_or_else(|| decapitalize(metadata.simple_name()))
    }
}

/// 被跳过的候选
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedCandidate {
    pub bean_name: String,
    pub type_name: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// 名称已被其它定义占用
    NameConflict { existing_type: String },
}

/// 一次扫描的结果
#[derive(Debug, Default)]
pub struct ScanReport {
    pub candidates: Vec<BeanDefinitionHolder>,
    pub skipped: Vec<SkippedCandidate>,
}

/// 代理 Bean 定义扫描器
pub struct ProxyBeanDefinitionScanner {
    registry: Weak<dyn BeanDefinitionRegistry>,
    type_source: Arc<dyn TypeMetadataSource>,
    include_filters: Vec<Arc<dyn TypeFilter>>,
    exclude_filters: Vec<Arc<dyn TypeFilter>>,
    name_generator: Arc<dyn BeanNameGenerator>,
}

impl ProxyBeanDefinitionScanner {
    pub fn new(
        registry: Weak<dyn BeanDefinitionRegistry>,
        type_source: Arc<dyn TypeMetadataSource>,
    ) -> Self {
        Self {
            registry,
            type_source,
            include_filters: Vec::new(),
            exclude_filters: Vec::new(),
            name_generator: Arc::new(AnnotationBeanNameGenerator),
        }
    }

    pub fn with_name_generator(mut self, generator: Arc<dyn BeanNameGenerator>) -> Self {
        self.name_generator = generator;
        self
    }

    pub fn add_include_filter(&mut self, filter: Arc<dyn TypeFilter>) {
        self.include_filters.push(filter);
    }

    pub fn add_exclude_filter(&mut self, filter: Arc<dyn TypeFilter>) {
        self.exclude_filters.push(filter);
    }

    /// 注册默认过滤器
    ///
    /// 有标记时只接受带标记的类型，没有标记时接受所有类型；包说明记录始终排除
    pub fn register_filters(&mut self, marker: Option<&MarkerFilter>) {
        match marker {
            Some(MarkerFilter::Annotation(annotation)) => {
                self.add_include_filter(Arc::new(AnnotationTypeFilter::new(annotation.clone())));
            }
            Some(MarkerFilter::Predicate(predicate)) => {
                self.add_include_filter(predicate.clone());
            }
            None => self.add_include_filter(Arc::new(AcceptAllFilter)),
        }
        self.add_exclude_filter(Arc::new(PackageInfoFilter));
    }

    /// 候选资格：可独立访问的 trait
    pub fn is_candidate_component(&self, metadata: &TypeMetadata) -> bool {
        metadata.is_interface() && metadata.is_independent()
    }

    fn passes_filters(&self, metadata: &TypeMetadata) -> bool {
        if self.exclude_filters.iter().any(|f| f.matches(metadata)) {
            return false;
        }
        self.include_filters.iter().any(|f| f.matches(metadata))
    }

    /// 在单个包中查找候选类型
    pub fn find_candidate_components(&self, base_package: &str) -> Vec<Arc<TypeMetadata>> {
        let candidates: Vec<Arc<TypeMetadata>> = self
            .type_source
            .find_types(base_package)
            .into_iter()
            .filter(|metadata| {
                let matched = self.passes_filters(metadata) && self.is_candidate_component(metadata);
                if !matched {
                    tracing::trace!("Ignored type '{}' in '{}'", metadata.type_name(), base_package);
                }
                matched
            })
            .collect();

        tracing::debug!(
            "Found {} candidate type(s) in package '{}'",
            candidates.len(),
            base_package
        );
        candidates
    }

    /// 扫描所有包，返回通过冲突检查的候选
    ///
    /// 注册表不可用时记录警告并返回空结果
    pub fn scan(&self, base_packages: &[String]) -> ScanReport {
        let mut report = ScanReport::default();

        let Some(registry) = self.registry.upgrade() else {
            tracing::warn!("The bean definition registry is unavailable, no candidates will be scanned");
            return report;
        };

        // bean name -> type name，用于本次扫描内的去重
        let mut accepted: HashMap<String, String> = HashMap::new();

        for base_package in base_packages {
            tracing::info!("Starting component scan of package '{}'", base_package);

            for metadata in self.find_candidate_components(base_package) {
                let bean_name = self.name_generator.generate_bean_name(&metadata);

                if let Some(existing) = accepted.get(&bean_name) {
                    if existing == metadata.type_name() {
                        // 重叠的包被扫描了两次
                        continue;
                    }
                    report.skipped.push(self.skip(&bean_name, &metadata, existing.clone()));
                    continue;
                }

                if let Err(skipped) = self.check_candidate(registry.as_ref(), &bean_name, &metadata) {
                    report.skipped.push(skipped);
                    continue;
                }

                accepted.insert(bean_name.clone(), metadata.type_name().to_string());
                report.candidates.push(self.build_candidate(bean_name, metadata));
            }
        }

        tracing::info!(
            "Component scan finished: {} candidate(s), {} skipped",
            report.candidates.len(),
            report.skipped.len()
        );
        report
    }

    /// 名称冲突检查
    fn check_candidate(
        &self,
        registry: &dyn BeanDefinitionRegistry,
        bean_name: &str,
        metadata: &TypeMetadata,
    ) -> Result<(), SkippedCandidate> {
        if !registry.contains_bean_definition(bean_name) {
            return Ok(());
        }
        let existing_type = registry
            .get_bean_definition(bean_name)
            .map(|definition| definition.bean_class_name().to_string())
            .unwrap_or_default();
        Err(self.skip(bean_name, metadata, existing_type))
    }

    fn skip(&self, bean_name: &str, metadata: &TypeMetadata, existing_type: String) -> SkippedCandidate {
        tracing::warn!(
            "Skipping factory bean with name '{}' and type '{}': bean already defined with the same name",
            bean_name,
            metadata.type_name()
        );
        SkippedCandidate {
            bean_name: bean_name.to_string(),
            type_name: metadata.type_name().to_string(),
            reason: SkipReason::NameConflict { existing_type },
        }
    }

    /// 构建候选定义，处理宿主自身的 `Scope` 注解
    fn build_candidate(&self, bean_name: String, metadata: Arc<TypeMetadata>) -> BeanDefinitionHolder {
        let scope_annotation = metadata.annotation(SCOPE_ANNOTATION).cloned();
        let mut definition = BeanDefinition::annotated(metadata);

        let Some(scope_annotation) = scope_annotation else {
            return BeanDefinitionHolder::new(bean_name, definition);
        };

        if let Some(scope) = scope_annotation.first_text_attribute(&[SCOPE_ATTRIBUTE_ALIAS]) {
            definition.set_scope(Scope::parse(scope));
        }

        let holder = BeanDefinitionHolder::new(bean_name, definition);
        let proxied = scope_annotation
            .attribute(PROXY_MODE_ATTRIBUTE)
            .is_some_and(|mode| mode.eq_ignore_ascii_case(PROXY_MODE_INTERFACES));
        if proxied {
            tracing::debug!("Creating scoped proxy for candidate '{}'", holder.bean_name());
            create_scoped_proxy(holder)
        } else {
            holder
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bean_factory::DefaultListableBeanFactory;
    use crate::metadata::{AnnotationMetadata, StaticTypeSource};

    fn marked(type_name: &str) -> TypeMetadata {
        TypeMetadata::interface(type_name).with_annotation(AnnotationMetadata::new("ProxyBean"))
    }

    fn source() -> Arc<dyn TypeMetadataSource> {
        Arc::new(
            StaticTypeSource::new()
                .with_type(marked("app::repo::UserRepository"))
                .with_type(marked("app::repo::OrderRepository"))
                .with_type(TypeMetadata::interface("app::repo::Unmarked"))
                .with_type(marked("app::repo::PlainStruct").nested())
                .with_type(TypeMetadata::structure("app::repo::Entity").with_annotation(AnnotationMetadata::new("ProxyBean")))
                .with_type(TypeMetadata::package_info("app::repo").with_annotation(AnnotationMetadata::new("ProxyBean")))
                .with_type(marked("other::Elsewhere")),
        )
    }

    fn scanner(factory: &Arc<DefaultListableBeanFactory>, marker: Option<MarkerFilter>) -> ProxyBeanDefinitionScanner {
        let registry: Arc<dyn BeanDefinitionRegistry> = factory.clone();
        let mut scanner = ProxyBeanDefinitionScanner::new(Arc::downgrade(&registry), source());
        scanner.register_filters(marker.as_ref());
        scanner
    }

    /// 收集测试期间输出的日志
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn names(report: &ScanReport) -> Vec<&str> {
        let mut names: Vec<&str> = report.candidates.iter().map(|h| h.bean_name()).collect();
        names.sort();
        names
    }

    #[test]
    fn test_marker_filter_selects_independent_interfaces() {
        let factory = DefaultListableBeanFactory::new();
        let report = scanner(&factory, Some(MarkerFilter::Annotation("ProxyBean".into())))
            .scan(&["app".to_string()]);

        assert_eq!(names(&report), vec!["orderRepository", "userRepository"]);
        assert!(report.skipped.is_empty());
        // 扫描不写注册表
        assert_eq!(factory.get_bean_definition_count(), 0);
    }

    #[test]
    fn test_accept_all_without_marker() {
        let factory = DefaultListableBeanFactory::new();
        let report = scanner(&factory, None).scan(&["app::repo".to_string()]);
        assert_eq!(names(&report), vec!["orderRepository", "unmarked", "userRepository"]);
    }

    #[test]
    fn test_predicate_marker() {
        let factory = DefaultListableBeanFactory::new();
        let predicate = MarkerFilter::predicate(|m: &TypeMetadata| m.simple_name().starts_with("User"));
        let report = scanner(&factory, Some(predicate)).scan(&["app".to_string()]);
        assert_eq!(names(&report), vec!["userRepository"]);
    }

    #[test]
    fn test_name_conflict_is_skipped_with_warning() {
        let factory = DefaultListableBeanFactory::new();
        factory
            .register_bean_definition("userRepository", BeanDefinition::from_supplier(|_| Ok(1_u8)))
            .unwrap();

        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer({
                let logs = logs.clone();
                move || logs.clone()
            })
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        let report = tracing::subscriber::with_default(subscriber, || {
            scanner(&factory, Some(MarkerFilter::Annotation("ProxyBean".into()))).scan(&["app".to_string()])
        });

        let output = logs.contents();
        assert!(output.contains("WARN"), "missing warning: {}", output);
        assert!(output.contains("'userRepository'"));
        assert!(output.contains("'app::repo::UserRepository'"));
        assert!(!output.contains("orderRepository"));

        assert_eq!(names(&report), vec!["orderRepository"]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].bean_name, "userRepository");
        assert_eq!(report.skipped[0].type_name, "app::repo::UserRepository");
        assert_eq!(
            report.skipped[0].reason,
            SkipReason::NameConflict { existing_type: "u8".to_string() }
        );
    }

    #[test]
    fn test_overlapping_packages_are_deduplicated() {
        let factory = DefaultListableBeanFactory::new();
        let report = scanner(&factory, Some(MarkerFilter::Annotation("ProxyBean".into())))
            .scan(&["app".to_string(), "app::repo".to_string()]);
        assert_eq!(report.candidates.len(), 2);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_explicit_name_attribute() {
        let factory = DefaultListableBeanFactory::new();
        let registry: Arc<dyn BeanDefinitionRegistry> = factory.clone();
        let source = StaticTypeSource::new().with_type(
            TypeMetadata::interface("app::Users")
                .with_annotation(AnnotationMetadata::new("ProxyBean").with_attribute("name", "people")),
        );
        let mut scanner = ProxyBeanDefinitionScanner::new(Arc::downgrade(&registry), Arc::new(source));
        scanner.register_filters(None);
        let report = scanner.scan(&["app".to_string()]);
        assert_eq!(names(&report), vec!["people"]);
    }

    #[test]
    fn test_host_scope_annotation_produces_scoped_proxy() {
        let factory = DefaultListableBeanFactory::new();
        let registry: Arc<dyn BeanDefinitionRegistry> = factory.clone();
        let source = StaticTypeSource::new().with_type(
            marked("app::Cart").with_annotation(
                AnnotationMetadata::new("Scope")
                    .with_attribute("value", "request")
                    .with_attribute("proxyMode", "interfaces"),
            ),
        );
        let mut scanner = ProxyBeanDefinitionScanner::new(Arc::downgrade(&registry), Arc::new(source));
        scanner.register_filters(None);
        let report = scanner.scan(&["app".to_string()]);

        let holder = &report.candidates[0];
        assert!(holder.definition().is_scoped_proxy());
        let target = holder.definition().decorated_definition().unwrap();
        assert_eq!(target.bean_name(), "scopedTarget.cart");
        assert_eq!(target.definition().scope(), &Scope::Custom("request".into()));
    }

    #[test]
    fn test_unavailable_registry_scans_nothing() {
        let registry: Arc<dyn BeanDefinitionRegistry> = DefaultListableBeanFactory::new();
        let weak = Arc::downgrade(&registry);
        drop(registry);

        let mut scanner = ProxyBeanDefinitionScanner::new(weak, source());
        scanner.register_filters(None);
        let report = scanner.scan(&["app".to_string()]);
        assert!(report.candidates.is_empty());
    }
}
