// proxybean-core: 接口扫描与 FactoryBean 注册
//
// 在指定包中扫描带标记注解的 trait，为每个 trait 注册一个由 FactoryBean
// 生产实例的 Bean 定义，支持：
// - 单例、原型与自定义作用域（非单例自动包装为 scoped proxy）
// - 声明式扫描（`bean_scan!`）与编程式扫描
// - 按条件执行的自动配置
// - TOML / 环境变量配置与 tracing 日志

extern crate self as proxybean_core;

pub mod app;
pub mod bean;
pub mod bean_factory;
pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod filter;
pub mod lifecycle;
pub mod logging;
pub mod metadata;
pub mod plugin;
pub mod registrar;
pub mod scan;
pub mod scanner;
pub mod scope;
pub mod scoped_proxy;
pub mod utils;

// 重新导出常用类型
pub use app::ProxyBeanApplication;
pub use bean::{
    AutowireMode, BeanClass, BeanDefinition, BeanDefinitionHolder, BeanObject,
    ConstructorArgumentValues, FactoryBean, FactoryBeanClass, FactoryBeanType,
};
pub use bean_factory::{
    BeanDefinitionRegistry, BeanFactory, BeanFactoryExt, ConfigurableBeanFactory,
    ConfigurableListableBeanFactory, DefaultListableBeanFactory, ListableBeanFactory,
};
pub use config::{
    ConfigValue, Environment, EnvironmentPropertySource, MapPropertySource, PropertySource,
    TomlPropertySource,
};
pub use context::{ApplicationContext, ApplicationContextBuilder};
pub use error::{
    ApplicationError, ApplicationResult, ConfigError, ContainerError, ContainerResult, Result,
    ScanError, ScanResult,
};
pub use lifecycle::{BeanDefinitionRegistryPostProcessor, SharedRegistryPostProcessor};
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use metadata::{InventoryTypeSource, StaticTypeSource, TypeMetadata, TypeMetadataSource};
pub use plugin::{load_auto_configurations, AutoConfiguration, AutoConfigurationRegistry};
pub use registrar::FactoryBeanDefinitionProcessor;
pub use scan::{BeanScan, BeanScanRegistrar, MarkerFilter, ScanRequest, ScanSite};
pub use scanner::{ProxyBeanDefinitionScanner, ScanReport, SkipReason, SkippedCandidate};
pub use scope::{ContextualScope, Scope, ScopeHandler, ScopeSession};
pub use scoped_proxy::ScopedProxy;

// 导出 async_trait 和 inventory，供宏使用
pub use async_trait;
pub use inventory;

/// Prelude 模块，包含常用的 traits 和类型
pub mod prelude {
    pub use crate::app::ProxyBeanApplication;
    pub use crate::bean::{BeanDefinition, BeanObject, ConstructorArgumentValues, FactoryBean, FactoryBeanClass};
    pub use crate::bean_factory::{
        BeanDefinitionRegistry, BeanFactory, BeanFactoryExt, ConfigurableBeanFactory,
        ConfigurableListableBeanFactory, ListableBeanFactory,
    };
    pub use crate::config::{ConfigValue, Environment, MapPropertySource, PropertySource};
    pub use crate::context::ApplicationContext;
    pub use crate::error::{ApplicationError, ApplicationResult, ContainerError, ContainerResult, Result};
    pub use crate::lifecycle::BeanDefinitionRegistryPostProcessor;
    pub use crate::logging::{LogFormat, LogLevel, LoggingConfig};
    pub use crate::plugin::AutoConfiguration;
    pub use crate::scan::{BeanScan, ScanSite};
    pub use crate::scope::Scope;
    pub use crate::scoped_proxy::ScopedProxy;
    pub use anyhow::{anyhow, Context};
}
