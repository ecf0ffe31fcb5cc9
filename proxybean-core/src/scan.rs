//! 声明式扫描
//!
//! `BeanScan` 描述一次扫描声明（包、FactoryBean 类型、标记注解、作用域、延迟加载），
//! 由 `BeanScanRegistrar` 翻译成 `ScanRequest`，并为每个声明位置注册一个
//! 编排用的 `BeanDefinitionRegistryPostProcessor`。
//!
//! ```ignore
//! pub struct RepositoryConfig;
//!
//! proxybean_core::bean_scan!(
//!     RepositoryConfig,
//!     BeanScan::new()
//!         .with_base_package("app::repo")
//!         .with_factory_bean(my_factory_bean())
//! );
//! ```

use std::fmt;
use std::sync::{Arc, Weak};

use crate::bean::{BeanDefinition, FactoryBeanClass};
use crate::bean_factory::BeanDefinitionRegistry;
use crate::config::Environment;
use crate::constants::{DEFAULT_BEAN_ANNOTATION, SCAN_REGISTRAR_NAME, SCOPE_SINGLETON};
use crate::error::{ApplicationResult, ScanError, ScanResult};
use crate::filter::TypeFilter;
use crate::lifecycle::{BeanDefinitionRegistryPostProcessor, SharedRegistryPostProcessor};
use crate::metadata::{TypeMetadata, TypeMetadataSource};
use crate::registrar::FactoryBeanDefinitionProcessor;
use crate::scanner::{ProxyBeanDefinitionScanner, SkippedCandidate};
use crate::scope::Scope;
use crate::utils::naming::package_of;

/// 包名列表的分隔符
const PACKAGE_DELIMITERS: &[char] = &[',', ';', ' ', '\t', '\n'];

/// 候选类型的标记
#[derive(Clone)]
pub enum MarkerFilter {
    /// 类型上必须带有该名称的注解
    Annotation(String),
    /// 自定义断言
    Predicate(Arc<dyn TypeFilter>),
}

impl MarkerFilter {
    pub fn annotation(name: impl Into<String>) -> Self {
        MarkerFilter::Annotation(name.into())
    }

    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&TypeMetadata) -> bool + Send + Sync + 'static,
    {
        MarkerFilter::Predicate(Arc::new(predicate))
    }
}

impl fmt::Debug for MarkerFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerFilter::Annotation(name) => f.debug_tuple("Annotation").field(name).finish(),
            MarkerFilter::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// 一次扫描请求，构建后不再修改
#[derive(Debug, Clone)]
pub struct ScanRequest {
    base_packages: Vec<String>,
    marker: Option<MarkerFilter>,
    factory_bean: FactoryBeanClass,
    bean_scope: Scope,
    lazy_initialization: bool,
}

impl ScanRequest {
    pub fn new(base_packages: Vec<String>, factory_bean: FactoryBeanClass) -> Self {
        Self {
            base_packages,
            marker: None,
            factory_bean,
            bean_scope: Scope::Singleton,
            lazy_initialization: false,
        }
    }

    pub fn with_marker(mut self, marker: MarkerFilter) -> Self {
        self.marker = Some(marker);
        self
    }

    pub fn with_bean_scope(mut self, scope: Scope) -> Self {
        self.bean_scope = scope;
        self
    }

    pub fn with_lazy_initialization(mut self, lazy: bool) -> Self {
        self.lazy_initialization = lazy;
        self
    }

    /// 将声明翻译为扫描请求
    ///
    /// 未指定包时使用声明位置所在的包，未指定标记时使用 `ProxyBean`，
    /// 未指定 FactoryBean 类型时返回 `ScanError::Configuration`。
    pub fn from_bean_scan(site: &ScanSite, scan: &BeanScan) -> ScanResult<Self> {
        let factory_bean = scan.factory_bean.clone().ok_or_else(|| {
            ScanError::Configuration(format!(
                "Bean scan declared on '{}' has no factory bean type, please specify a valid factory bean",
                site.type_name()
            ))
        })?;

        let mut base_packages = tokenize_packages(&scan.base_packages);
        if base_packages.is_empty() {
            base_packages.push(site.package().to_string());
        }

        let marker = scan
            .bean_annotation
            .as_deref()
            .map(str::trim)
            .filter(|annotation| !annotation.is_empty())
            .unwrap_or(DEFAULT_BEAN_ANNOTATION);

        Ok(Self::new(base_packages, factory_bean)
            .with_marker(MarkerFilter::annotation(marker))
            .with_bean_scope(Scope::parse(&scan.bean_scope))
            .with_lazy_initialization(scan.lazy_initialization))
    }

    pub fn base_packages(&self) -> &[String] {
        &self.base_packages
    }

    pub fn marker(&self) -> Option<&MarkerFilter> {
        self.marker.as_ref()
    }

    /// 标记注解名（自定义断言时为 `None`）
    pub fn marker_annotation(&self) -> Option<&str> {
        match &self.marker {
            Some(MarkerFilter::Annotation(name)) => Some(name),
            _ => None,
        }
    }

    pub fn factory_bean(&self) -> &FactoryBeanClass {
        &self.factory_bean
    }

    pub fn bean_scope(&self) -> &Scope {
        &self.bean_scope
    }

    pub fn lazy_initialization(&self) -> bool {
        self.lazy_initialization
    }
}

/// 按 `,; \t\n` 拆分包名，丢弃空白项
pub fn tokenize_packages(packages: &[String]) -> Vec<String> {
    packages
        .iter()
        .flat_map(|entry| entry.split(PACKAGE_DELIMITERS))
        .map(|package| package.trim().trim_end_matches("::"))
        .filter(|package| !package.is_empty())
        .map(String::from)
        .collect()
}

/// 扫描声明
#[derive(Debug, Clone)]
pub struct BeanScan {
    pub base_packages: Vec<String>,
    pub factory_bean: Option<FactoryBeanClass>,
    pub bean_annotation: Option<String>,
    pub bean_scope: String,
    pub lazy_initialization: bool,
}

impl Default for BeanScan {
    fn default() -> Self {
        Self {
            base_packages: Vec::new(),
            factory_bean: None,
            bean_annotation: None,
            bean_scope: SCOPE_SINGLETON.to_string(),
            lazy_initialization: false,
        }
    }
}

impl BeanScan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_package(mut self, package: impl Into<String>) -> Self {
        self.base_packages.push(package.into());
        self
    }

    pub fn with_base_packages<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.base_packages.extend(packages.into_iter().map(Into::into));
        self
    }

    pub fn with_factory_bean(mut self, factory_bean: FactoryBeanClass) -> Self {
        self.factory_bean = Some(factory_bean);
        self
    }

    pub fn with_bean_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.bean_annotation = Some(annotation.into());
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

    /// 从配置读取扫描声明
    ///
    /// 读取 `{prefix}.base-packages`、`{prefix}.bean-scope`、
    /// `{prefix}.lazy-initialization` 和 `{prefix}.bean-annotation`，
    /// FactoryBean 类型需要由调用方指定。
    pub fn from_environment(env: &Environment, prefix: &str) -> Self {
        let key = |name: &str| format!("{}.{}", prefix, name);
        let mut scan = Self::new();
        if let Some(packages) = env.get_string_array(&key("base-packages")) {
            scan.base_packages = packages;
        }
        if let Some(scope) = env.get_string(&key("bean-scope")) {
            scan.bean_scope = scope;
        }
        if let Some(lazy) = env.get_bool(&key("lazy-initialization")) {
            scan.lazy_initialization = lazy;
        }
        scan.bean_annotation = env.get_string(&key("bean-annotation"));
        scan
    }
}

/// 扫描声明所在的位置
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScanSite {
    type_name: String,
}

impl ScanSite {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
        }
    }

    pub fn of<T: ?Sized>() -> Self {
        Self::new(std::any::type_name::<T>())
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn package(&self) -> &str {
        package_of(&self.type_name)
    }

    /// 编排 Bean 的名称：`<声明类型>#BeanScanRegistrar`
    pub fn registrar_bean_name(&self) -> String {
        format!("{}#{}", self.type_name, SCAN_REGISTRAR_NAME)
    }
}

/// 一次扫描注册的结果
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub registered: Vec<String>,
    pub skipped: Vec<SkippedCandidate>,
}

/// 扫描并注册的编排步骤
pub struct ScanningPostProcessor {
    name: String,
    request: ScanRequest,
    type_source: Arc<dyn TypeMetadataSource>,
}

impl ScanningPostProcessor {
    pub fn new(
        name: impl Into<String>,
        request: ScanRequest,
        type_source: Arc<dyn TypeMetadataSource>,
    ) -> Self {
        Self {
            name: name.into(),
            request,
            type_source,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn request(&self) -> &ScanRequest {
        &self.request
    }

    /// 扫描候选并交给注册器处理
    pub fn execute(&self, registry: Weak<dyn BeanDefinitionRegistry>) -> ScanResult<ScanOutcome> {
        let mut scanner = ProxyBeanDefinitionScanner::new(registry.clone(), self.type_source.clone());
        scanner.register_filters(self.request.marker());

        let report = scanner.scan(self.request.base_packages());
        if report.candidates.is_empty() {
            tracing::warn!(
                "No candidate interfaces found in {:?}, please check your configuration",
                self.request.base_packages()
            );
        }

        let registry = registry.upgrade();
        let registered = FactoryBeanDefinitionProcessor::from_request(&self.request)
            .process(report.candidates, registry.as_deref())?;

        Ok(ScanOutcome {
            registered,
            skipped: report.skipped,
        })
    }
}

impl BeanDefinitionRegistryPostProcessor for ScanningPostProcessor {
    fn post_process_bean_definition_registry(
        &self,
        registry: &Arc<dyn BeanDefinitionRegistry>,
    ) -> ApplicationResult<()> {
        tracing::debug!("Running bean scan '{}'", self.name);
        let outcome = self.execute(Arc::downgrade(registry))?;
        tracing::info!(
            "Bean scan '{}' registered {} bean(s), skipped {}",
            self.name,
            outcome.registered.len(),
            outcome.skipped.len()
        );
        Ok(())
    }
}

/// 把扫描声明注册为编排 Bean
pub struct BeanScanRegistrar {
    type_source: Arc<dyn TypeMetadataSource>,
}

impl BeanScanRegistrar {
    pub fn new(type_source: Arc<dyn TypeMetadataSource>) -> Self {
        Self { type_source }
    }

    /// 每个声明位置注册一个编排 Bean，返回其名称
    ///
    /// 声明不合法时不注册任何内容；同一位置重复注册时保留已有定义。
    pub fn register_bean_definitions(
        &self,
        site: &ScanSite,
        scan: &BeanScan,
        registry: &dyn BeanDefinitionRegistry,
    ) -> ScanResult<String> {
        let request = ScanRequest::from_bean_scan(site, scan)?;
        let bean_name = site.registrar_bean_name();

        if registry.contains_bean_definition(&bean_name) {
            tracing::debug!("Bean scan '{}' is already registered", bean_name);
            return Ok(bean_name);
        }

        let processor: SharedRegistryPostProcessor = Arc::new(ScanningPostProcessor::new(
            bean_name.clone(),
            request,
            self.type_source.clone(),
        ));
        registry.register_bean_definition(&bean_name, BeanDefinition::from_instance(Arc::new(processor)))?;

        tracing::debug!("Registered bean scan '{}'", bean_name);
        Ok(bean_name)
    }
}

/// 编译期登记的扫描声明
pub struct BeanScanDeclaration {
    pub site: fn() -> ScanSite,
    pub scan: fn() -> BeanScan,
}

inventory::collect!(BeanScanDeclaration);

/// 收集所有通过 `bean_scan!` 登记的声明
pub fn declared_bean_scans() -> Vec<(ScanSite, BeanScan)> {
    let mut scans: Vec<(ScanSite, BeanScan)> = inventory::iter::<BeanScanDeclaration>
        .into_iter()
        .map(|declaration| ((declaration.site)(), (declaration.scan)()))
        .collect();
    scans.sort_by(|(a, _), (b, _)| a.type_name().cmp(b.type_name()));
    scans
}

/// 在编译期登记一个扫描声明
#[macro_export]
macro_rules! bean_scan {
    ($site:ty, $scan:expr $(,)?) => {
        $crate::inventory::submit! {
            $crate::scan::BeanScanDeclaration {
                site: || $crate::scan::ScanSite::of::<$site>(),
                scan: || $scan,
            }
        }
    };
}
