//! 应用上下文
//!
//! `refresh` 的顺序：
//! 1. 注册 Environment
//! 2. 注册扫描声明对应的编排 Bean
//! 3. 调用 registry post processor（扫描与注册在这里发生）
//! 4. 执行自动配置，再调用新注册的 registry post processor
//! 5. 冻结配置，预实例化非延迟单例

use std::any::Any;
use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::bean::{BeanDefinition, BeanObject};
use crate::bean_factory::{
    BeanDefinitionRegistry, BeanFactory, BeanFactoryExt, ConfigurableBeanFactory,
    ConfigurableListableBeanFactory, DefaultListableBeanFactory, ListableBeanFactory,
};
use crate::config::{Environment, PropertySource};
use crate::constants::{ENVIRONMENT_BEAN_NAME, SCOPE_REQUEST};
use crate::error::{ApplicationResult, ContainerError, ContainerResult};
use crate::lifecycle::{registry_post_processor_type_id, SharedRegistryPostProcessor};
use crate::metadata::{InventoryTypeSource, TypeMetadataSource};
use crate::plugin::{load_auto_configurations, AutoConfiguration, AutoConfigurationRegistry};
use crate::scan::{declared_bean_scans, BeanScan, BeanScanRegistrar, ScanSite};
use crate::scope::{ContextualScope, ScopeHandler};

/// 应用上下文
pub struct ApplicationContext {
    bean_factory: Arc<DefaultListableBeanFactory>,

    environment: Arc<Environment>,

    type_source: Arc<dyn TypeMetadataSource>,

    /// 默认注册的 `request` 作用域
    request_scope: Arc<ContextualScope>,

    bean_scans: Vec<(ScanSite, BeanScan)>,

    auto_configurations: RwLock<AutoConfigurationRegistry>,

    /// 已调用过的 registry post processor
    invoked_post_processors: RwLock<HashSet<String>>,

    refreshed: RwLock<bool>,
}

impl ApplicationContext {
    pub fn builder() -> ApplicationContextBuilder {
        ApplicationContextBuilder::new()
    }

    pub fn bean_factory(&self) -> &Arc<DefaultListableBeanFactory> {
        &self.bean_factory
    }

    /// 以注册表能力视图访问 Bean 工厂
    pub fn registry(&self) -> Arc<dyn BeanDefinitionRegistry> {
        self.bean_factory.clone()
    }

    pub fn environment(&self) -> &Arc<Environment> {
        &self.environment
    }

    pub fn type_source(&self) -> &Arc<dyn TypeMetadataSource> {
        &self.type_source
    }

    pub fn request_scope(&self) -> &Arc<ContextualScope> {
        &self.request_scope
    }

    pub fn is_refreshed(&self) -> bool {
        *self.refreshed.read()
    }

    /// 添加自动配置（需要在 `refresh` 之前）
    pub fn add_auto_configuration(&self, configuration: Arc<dyn AutoConfiguration>) {
        self.auto_configurations.write().register(configuration);
    }

    pub fn register_bean_definition(&self, name: &str, definition: BeanDefinition) -> ContainerResult<()> {
        self.bean_factory.register_bean_definition(name, definition)
    }

    /// 注册一个已经创建好的单例
    pub fn register_singleton<T: Any + Send + Sync>(&self, name: &str, instance: Arc<T>) -> ContainerResult<()> {
        self.register_bean_definition(name, BeanDefinition::from_instance(instance))
    }

    /// 注册一个以 `Arc<dyn Trait>` 形式保存的单例，用 `get_interface` 获取
    pub fn register_interface<T: ?Sized + Send + Sync + 'static>(
        &self,
        name: &str,
        instance: Arc<T>,
    ) -> ContainerResult<()> {
        self.register_bean_definition(name, BeanDefinition::from_instance(Arc::new(instance)))
    }

    pub fn get_bean(&self, name: &str) -> ContainerResult<BeanObject> {
        self.bean_factory.get_bean(name)
    }

    pub fn get_bean_of<T: Any + Send + Sync>(&self, name: &str) -> ContainerResult<Arc<T>> {
        self.bean_factory.get_bean_of::<T>(name)
    }

    pub fn get_bean_by_type<T: Any + Send + Sync>(&self) -> ContainerResult<Arc<T>> {
        self.bean_factory.get_bean_by_type::<T>()
    }

    pub fn get_interface<T: ?Sized + Send + Sync + 'static>(&self, name: &str) -> ContainerResult<Arc<T>> {
        self.bean_factory.get_interface::<T>(name)
    }

    pub fn contains_bean(&self, name: &str) -> bool {
        self.bean_factory.contains_bean(name)
    }

    pub fn contains_bean_by_type<T: Any + Send + Sync>(&self) -> bool {
        self.bean_factory.contains_bean_by_type::<T>()
    }

    pub fn get_bean_names(&self) -> Vec<String> {
        self.bean_factory.get_bean_names()
    }

    pub fn get_bean_names_for_type_name(&self, type_name: &str) -> Vec<String> {
        self.bean_factory.get_bean_names_for_type_name(type_name)
    }

    /// 刷新上下文，只能执行一次
    pub fn refresh(self: &Arc<Self>) -> ApplicationResult<()> {
        if self.is_refreshed() {
            return Err(ContainerError::ConfigurationFrozen("context already refreshed".to_string()).into());
        }

        tracing::info!("Refreshing application context");
        self.register_environment()?;
        self.register_bean_scans()?;
        self.invoke_registry_post_processors()?;

        let auto_configurations = self.auto_configurations.read().clone();
        let applied = auto_configurations.configure_all(self)?;
        tracing::debug!("Applied {} auto-configuration(s)", applied);
        self.invoke_registry_post_processors()?;

        self.bean_factory.freeze_configuration();
        tracing::info!("Initializing non-lazy singleton beans");
        self.bean_factory.preinstantiate_singletons()?;

        *self.refreshed.write() = true;
        tracing::info!(
            "Application context refreshed with {} bean definition(s)",
            self.bean_factory.get_bean_definition_count()
        );
        Ok(())
    }

    /// 执行自动配置的启动回调
    pub async fn start(self: &Arc<Self>) -> ApplicationResult<()> {
        let auto_configurations = self.auto_configurations.read().clone();
        auto_configurations.startup_all(self).await
    }

    /// 关闭上下文，释放所有单例
    pub async fn shutdown(self: &Arc<Self>) {
        tracing::info!("Shutting down application context");
        let auto_configurations = self.auto_configurations.read().clone();
        auto_configurations.shutdown_all(self).await;
        self.bean_factory.destroy_singletons();
    }

    fn register_environment(&self) -> ApplicationResult<()> {
        if !self.bean_factory.contains_bean_definition(ENVIRONMENT_BEAN_NAME) {
            self.register_singleton(ENVIRONMENT_BEAN_NAME, self.environment.clone())?;
        }
        Ok(())
    }

    fn register_bean_scans(&self) -> ApplicationResult<()> {
        let registrar = BeanScanRegistrar::new(self.type_source.clone());
        for (site, scan) in &self.bean_scans {
            registrar.register_bean_definitions(site, scan, self.bean_factory.as_ref())?;
        }
        Ok(())
    }

    /// 调用尚未调用过的 registry post processor，直到没有新的出现
    fn invoke_registry_post_processors(&self) -> ApplicationResult<()> {
        let registry = self.registry();
        loop {
            let pending: Vec<String> = {
                let invoked = self.invoked_post_processors.read();
                self.bean_factory
                    .get_bean_names_for_type_id(registry_post_processor_type_id())
                    .into_iter()
                    .filter(|name| !invoked.contains(name))
                    .collect()
            };
            if pending.is_empty() {
                return Ok(());
            }

            let mut processors = Vec::with_capacity(pending.len());
            for name in pending {
                let processor = self.bean_factory.get_bean_of::<SharedRegistryPostProcessor>(&name)?;
                processors.push((name, processor));
            }
            processors.sort_by_key(|(_, processor)| processor.order());

            for (name, processor) in processors {
                tracing::debug!("Invoking registry post processor '{}'", name);
                self.invoked_post_processors.write().insert(name);
                processor.post_process_bean_definition_registry(&registry)?;
            }
        }
    }
}

impl std::fmt::Debug for ApplicationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationContext")
            .field("beans", &self.bean_factory.get_bean_definition_count())
            .field("bean_scans", &self.bean_scans.len())
            .field("refreshed", &self.is_refreshed())
            .finish()
    }
}

/// ApplicationContext 构建器
pub struct ApplicationContextBuilder {
    environment: Environment,
    type_source: Option<Arc<dyn TypeMetadataSource>>,
    bean_scans: Vec<(ScanSite, BeanScan)>,
    auto_configurations: AutoConfigurationRegistry,
    scopes: Vec<(String, Arc<dyn ScopeHandler>)>,
    declared_scans: bool,
    inventory_auto_configurations: bool,
}

impl ApplicationContextBuilder {
    pub fn new() -> Self {
        Self {
            environment: Environment::new(),
            type_source: None,
            bean_scans: Vec::new(),
            auto_configurations: AutoConfigurationRegistry::new(),
            scopes: Vec::new(),
            declared_scans: true,
            inventory_auto_configurations: true,
        }
    }

    pub fn add_property_source(mut self, source: Box<dyn PropertySource>) -> Self {
        self.add_property_source_mut(source);
        self
    }

    pub fn add_property_source_mut(&mut self, source: Box<dyn PropertySource>) {
        self.environment.add_property_source(source);
    }

    pub fn active_profiles(self, profiles: Vec<String>) -> Self {
        self.environment.set_active_profiles(profiles);
        self
    }

    /// 类型元数据来源，默认使用 inventory 登记的记录
    pub fn type_source(mut self, source: Arc<dyn TypeMetadataSource>) -> Self {
        self.type_source = Some(source);
        self
    }

    pub fn bean_scan(mut self, site: ScanSite, scan: BeanScan) -> Self {
        self.bean_scans.push((site, scan));
        self
    }

    pub fn auto_configuration(mut self, configuration: Arc<dyn AutoConfiguration>) -> Self {
        self.auto_configurations.register(configuration);
        self
    }

    pub fn scope(mut self, name: impl Into<String>, handler: Arc<dyn ScopeHandler>) -> Self {
        self.scopes.push((name.into(), handler));
        self
    }

    /// 是否包含 `bean_scan!` 登记的声明
    pub fn declared_scans(mut self, enabled: bool) -> Self {
        self.declared_scans = enabled;
        self
    }

    /// 是否包含 `submit_auto_configuration!` 登记的自动配置
    pub fn inventory_auto_configurations(mut self, enabled: bool) -> Self {
        self.inventory_auto_configurations = enabled;
        self
    }

    pub fn build(self) -> Arc<ApplicationContext> {
        let bean_factory = DefaultListableBeanFactory::new();
        let request_scope = Arc::new(ContextualScope::new(SCOPE_REQUEST));
        bean_factory.register_scope(SCOPE_REQUEST, request_scope.clone());
        for (name, handler) in self.scopes {
            bean_factory.register_scope(&name, handler);
        }

        let mut bean_scans = self.bean_scans;
        if self.declared_scans {
            bean_scans.extend(declared_bean_scans());
        }

        let mut auto_configurations = self.auto_configurations;
        if self.inventory_auto_configurations {
            for configuration in load_auto_configurations().configurations() {
                auto_configurations.register(configuration.clone());
            }
        }

        tracing::debug!(
            "Building application context with {} bean scan(s) and {} auto-configuration(s)",
            bean_scans.len(),
            auto_configurations.len()
        );

        Arc::new(ApplicationContext {
            bean_factory,
            environment: Arc::new(self.environment),
            type_source: self
                .type_source
                .unwrap_or_else(|| Arc::new(InventoryTypeSource)),
            request_scope,
            bean_scans,
            auto_configurations: RwLock::new(auto_configurations),
            invoked_post_processors: RwLock::new(HashSet::new()),
            refreshed: RwLock::new(false),
        })
    }
}

impl Default for ApplicationContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bean::{BeanClass, ConstructorArgumentValues, FactoryBean, FactoryBeanClass};
    use crate::config::MapPropertySource;
    use crate::error::{ApplicationError, ScanError};
    use crate::lifecycle::BeanDefinitionRegistryPostProcessor;
    use crate::metadata::{AnnotationMetadata, StaticTypeSource, TypeMetadata};
    use std::sync::atomic::{AtomicUsize, Ordering};

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct PrefixedGreeter {
        prefix: Arc<String>,
        type_name: String,
        serial: usize,
    }

    impl Greeter for PrefixedGreeter {
        fn greet(&self) -> String {
            format!("{} {} #{}", self.prefix, self.type_name, self.serial)
        }
    }

    /// 依赖容器中 `String` 前缀的 FactoryBean
    struct GreeterFactoryBean {
        prefix: Arc<String>,
        type_name: String,
        serial: Arc<AtomicUsize>,
    }

    impl FactoryBean for GreeterFactoryBean {
        fn get_object(&self) -> ContainerResult<BeanObject> {
            let greeter: Arc<dyn Greeter> = Arc::new(PrefixedGreeter {
                prefix: self.prefix.clone(),
                type_name: self.type_name.clone(),
                serial: self.serial.fetch_add(1, Ordering::SeqCst),
            });
            Ok(Arc::new(greeter))
        }

        fn object_type(&self) -> Option<&str> {
            Some(&self.type_name)
        }
    }

    fn greeter_factory() -> FactoryBeanClass {
        let serial = Arc::new(AtomicUsize::new(0));
        FactoryBeanClass::from_fn(
            "GreeterFactoryBean",
            move |args: &ConstructorArgumentValues, bean_factory: Option<&dyn BeanFactory>| {
                let bean_factory = bean_factory.ok_or_else(|| {
                    ContainerError::BeanCreationFailed("factory requires autowiring".into())
                })?;
                Ok(Arc::new(GreeterFactoryBean {
                    prefix: bean_factory.get_bean_by_type::<String>()?,
                    type_name: args.first().unwrap_or_default().to_string(),
                    serial: serial.clone(),
                }) as Arc<dyn FactoryBean>)
            },
        )
    }

    fn type_source() -> Arc<dyn TypeMetadataSource> {
        Arc::new(
            StaticTypeSource::new()
                .with_type(
                    TypeMetadata::interface("app::api::HelloService")
                        .with_annotation(AnnotationMetadata::new("ProxyBean")),
                )
                .with_type(
                    TypeMetadata::interface("app::api::SessionGreeter").with_annotation(
                        AnnotationMetadata::new("ProxyBean").with_attribute("scope", "request"),
                    ),
                ),
        )
    }

    /// 在配置阶段注册前缀 Bean
    struct PrefixAutoConfiguration {
        started: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl AutoConfiguration for PrefixAutoConfiguration {
        fn name(&self) -> &str {
            "prefix"
        }

        fn matches(&self, context: &ApplicationContext) -> bool {
            !context.contains_bean_by_type::<String>()
        }

        fn configure(&self, context: &Arc<ApplicationContext>) -> ApplicationResult<()> {
            let prefix = context.environment().get_string_or("greeting.prefix", "Hello");
            context.register_singleton("greetingPrefix", Arc::new(prefix))?;
            Ok(())
        }

        async fn on_startup(&self, _context: &Arc<ApplicationContext>) -> ApplicationResult<()> {
            self.started.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn context(started: Arc<AtomicUsize>) -> Arc<ApplicationContext> {
        ApplicationContext::builder()
            .add_property_source(Box::new(
                MapPropertySource::new("test").with_property("greeting.prefix", "Hi"),
            ))
            .type_source(type_source())
            .declared_scans(false)
            .inventory_auto_configurations(false)
            .bean_scan(
                ScanSite::new("app::api::ApiConfig"),
                BeanScan::new().with_factory_bean(greeter_factory()),
            )
            .auto_configuration(Arc::new(PrefixAutoConfiguration { started }))
            .build()
    }

    #[test]
    fn test_refresh_scans_and_autowires_factory_beans() {
        let context = context(Arc::new(AtomicUsize::new(0)));
        context.refresh().unwrap();

        assert!(context.is_refreshed());
        assert!(context.bean_factory().is_configuration_frozen());
        assert!(context.contains_bean(ENVIRONMENT_BEAN_NAME));
        assert!(context.contains_bean("app::api::ApiConfig#BeanScanRegistrar"));

        let hello = context.get_interface::<dyn Greeter>("helloService").unwrap();
        assert_eq!(hello.greet(), "Hi app::api::HelloService #0");
        assert_eq!(
            context.get_bean_names_for_type_name("app::api::HelloService"),
            vec!["helloService"]
        );
    }

    #[test]
    fn test_request_scoped_interfaces_resolve_per_request() {
        let context = context(Arc::new(AtomicUsize::new(0)));
        context.refresh().unwrap();

        let scope = context.request_scope().clone();
        let (first, same) = {
            let _request = scope.activate("req-1");
            (
                context.get_interface::<dyn Greeter>("sessionGreeter").unwrap().greet(),
                context.get_interface::<dyn Greeter>("sessionGreeter").unwrap().greet(),
            )
        };
        let second = {
            let _request = scope.activate("req-2");
            context.get_interface::<dyn Greeter>("sessionGreeter").unwrap().greet()
        };

        assert_eq!(first, same);
        assert_ne!(first, second);
        assert!(matches!(
            context.get_interface::<dyn Greeter>("sessionGreeter"),
            Err(ContainerError::ScopeNotActive(_))
        ));
    }

    #[test]
    fn test_missing_factory_bean_aborts_refresh() {
        let context = ApplicationContext::builder()
            .type_source(type_source())
            .declared_scans(false)
            .inventory_auto_configurations(false)
            .bean_scan(ScanSite::new("app::api::ApiConfig"), BeanScan::new())
            .build();

        let err = context.refresh().unwrap_err();
        assert!(matches!(err, ApplicationError::Scan(ScanError::Configuration(_))));
        assert!(!context.is_refreshed());
        assert!(!context.contains_bean("helloService"));
    }

    #[test]
    fn test_refresh_twice_is_rejected() {
        let context = context(Arc::new(AtomicUsize::new(0)));
        context.refresh().unwrap();
        assert!(context.refresh().is_err());
    }

    /// 在自动配置阶段注册的 post processor 也会被调用
    struct MarkerPostProcessor {
        invoked: Arc<AtomicUsize>,
    }

    impl BeanDefinitionRegistryPostProcessor for MarkerPostProcessor {
        fn post_process_bean_definition_registry(
            &self,
            registry: &Arc<dyn BeanDefinitionRegistry>,
        ) -> ApplicationResult<()> {
            self.invoked.fetch_add(1, Ordering::SeqCst);
            registry.register_bean_definition(
                "late",
                BeanDefinition::new(BeanClass::Declared("app::Late".into())).with_lazy(true),
            )?;
            Ok(())
        }
    }

    struct LateAutoConfiguration {
        invoked: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl AutoConfiguration for LateAutoConfiguration {
        fn name(&self) -> &str {
            "late"
        }

        fn configure(&self, context: &Arc<ApplicationContext>) -> ApplicationResult<()> {
            let processor: SharedRegistryPostProcessor = Arc::new(MarkerPostProcessor {
                invoked: self.invoked.clone(),
            });
            context.register_singleton("latePostProcessor", Arc::new(processor))?;
            Ok(())
        }
    }

    #[test]
    fn test_post_processors_from_auto_configuration_are_invoked_once() {
        let invoked = Arc::new(AtomicUsize::new(0));
        let context = ApplicationContext::builder()
            .declared_scans(false)
            .inventory_auto_configurations(false)
            .type_source(Arc::new(StaticTypeSource::new()))
            .auto_configuration(Arc::new(LateAutoConfiguration { invoked: invoked.clone() }))
            .build();

        context.refresh().unwrap();
        assert_eq!(invoked.load(Ordering::SeqCst), 1);
        assert!(context.contains_bean("late"));
    }

    #[tokio::test]
    async fn test_start_and_shutdown() {
        let started = Arc::new(AtomicUsize::new(0));
        let context = context(started.clone());
        context.refresh().unwrap();

        context.start().await.unwrap();
        assert_eq!(started.load(Ordering::SeqCst), 1);

        context.get_interface::<dyn Greeter>("helloService").unwrap();
        context.shutdown().await;
        assert!(context.bean_factory().get_singleton("helloService").is_none());
    }
}
