//! 仓库扫描预设
//!
//! `RepositoryScan` 是绑定了 `SqlRepositoryFactoryBean` 的扫描声明，只暴露
//! 包、默认作用域和延迟初始化三个选项，标记注解固定为 `ProxyBean`。

use proxybean_core::constants::SCOPE_SINGLETON;
use proxybean_core::{BeanScan, Environment};

use crate::factory_bean::repository_factory_bean;

/// 配置前缀
pub const REPOSITORY_PREFIX: &str = "repository";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryScan {
    /// 为空时扫描声明位置所在的包
    pub base_packages: Vec<String>,
    pub bean_scope: String,
    pub lazy_initialization: bool,
}

impl Default for RepositoryScan {
    fn default() -> Self {
        Self {
            base_packages: Vec::new(),
            bean_scope: SCOPE_SINGLETON.to_string(),
            lazy_initialization: false,
        }
    }
}

impl RepositoryScan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_package(mut self, package: impl Into<String>) -> Self {
        self.base_packages.push(package.into());
        self
    }

    pub fn with_bean_scope(mut self, scope: impl Into<String>) -> Self {
        self.bean_scope = scope.into();
        self
    }

    pub fn with_lazy_initialization(mut self, lazy: bool) -> Self {
        self.lazy_initialization = lazy;
        self
    }

    /// 读取 `repository.base-packages`、`repository.bean-scope` 和
    /// `repository.lazy-initialization`
    pub fn from_environment(env: &Environment) -> Self {
        let scan = BeanScan::from_environment(env, REPOSITORY_PREFIX);
        Self {
            base_packages: scan.base_packages,
            bean_scope: scan.bean_scope,
            lazy_initialization: scan.lazy_initialization,
        }
    }

    /// 转换为通用扫描声明
    pub fn to_bean_scan(&self) -> BeanScan {
        BeanScan::new()
            .with_base_packages(self.base_packages.iter().cloned())
            .with_factory_bean(repository_factory_bean())
            .with_bean_scope(self.bean_scope.clone())
            .with_lazy_initialization(self.lazy_initialization)
    }
}

impl From<RepositoryScan> for BeanScan {
    fn from(scan: RepositoryScan) -> Self {
        scan.to_bean_scan()
    }
}

/// 在编译期登记一个仓库扫描
///
/// ```ignore
/// pub struct RepositoryConfig;
///
/// repository_scan!(RepositoryConfig);
/// repository_scan!(RepositoryConfig, RepositoryScan::new().with_bean_scope("prototype"));
/// ```
#[macro_export]
macro_rules! repository_scan {
    ($site:ty $(,)?) => {
        $crate::repository_scan!($site, $crate::RepositoryScan::new());
    };
    ($site:ty, $scan:expr $(,)?) => {
        $crate::proxybean_core::bean_scan!($site, $crate::RepositoryScan::to_bean_scan(&$scan));
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory_bean::REPOSITORY_FACTORY_BEAN;
    use proxybean_core::{MapPropertySource, ScanRequest, ScanSite};

    #[test]
    fn test_bean_scan_is_bound_to_repository_factory() {
        let scan = RepositoryScan::new()
            .with_base_package("app::repo")
            .with_bean_scope("prototype")
            .to_bean_scan();
        assert_eq!(scan.base_packages, vec!["app::repo".to_string()]);
        assert_eq!(scan.bean_scope, "prototype");
        assert!(scan.bean_annotation.is_none());
        assert_eq!(
            scan.factory_bean.as_ref().map(|f| f.type_name()),
            Some(REPOSITORY_FACTORY_BEAN)
        );
    }

    #[test]
    fn test_defaults_translate_to_site_package() {
        let request = ScanRequest::from_bean_scan(
            &ScanSite::new("app::config::RepositoryConfig"),
            &RepositoryScan::new().into(),
        )
        .unwrap();
        assert_eq!(request.base_packages(), ["app::config".to_string()]);
        assert_eq!(request.marker_annotation(), Some("ProxyBean"));
        assert!(request.bean_scope().is_singleton());
        assert!(!request.lazy_initialization());
    }

    #[test]
    fn test_from_environment() {
        let env = Environment::new();
        env.add_property_source(Box::new(
            MapPropertySource::new("m")
                .with_property("repository.base-packages", "app::a, app::b")
                .with_property("repository.lazy-initialization", true),
        ));
        let scan = RepositoryScan::from_environment(&env);
        assert_eq!(scan.base_packages, vec!["app::a".to_string(), "app::b".to_string()]);
        assert_eq!(scan.bean_scope, SCOPE_SINGLETON);
        assert!(scan.lazy_initialization);
    }
}
