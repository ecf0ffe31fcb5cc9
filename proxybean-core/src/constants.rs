//! 容器与扫描共用的名称常量
//!
//! 宏、扫描器和注册器都通过这里的常量访问同一组标识符

/// 单例作用域名称
pub const SCOPE_SINGLETON: &str = "singleton";

/// 原型作用域名称
pub const SCOPE_PROTOTYPE: &str = "prototype";

/// 请求作用域名称（由 `ContextualScope` 提供）
pub const SCOPE_REQUEST: &str = "request";

/// 通过 `&name` 获取 FactoryBean 本身而不是它生产的对象
pub const FACTORY_BEAN_PREFIX: &str = "&";

/// Bean 定义属性：FactoryBean 生产对象的类型名
pub const OBJECT_TYPE_ATTRIBUTE: &str = "factoryBeanObjectType";

/// scoped proxy 目标 Bean 的名称前缀
pub const SCOPED_TARGET_NAME_PREFIX: &str = "scopedTarget.";

/// 默认的标记注解名（`#[proxy_bean]`）
pub const DEFAULT_BEAN_ANNOTATION: &str = "ProxyBean";

/// 标记注解上的作用域属性及其别名
pub const SCOPE_ATTRIBUTE: &str = "scope";
pub const SCOPE_ATTRIBUTE_ALIAS: &str = "value";

/// 标记注解上的显式 Bean 名称属性
pub const NAME_ATTRIBUTE: &str = "name";

/// 宿主容器自身的作用域注解
pub const SCOPE_ANNOTATION: &str = "Scope";
pub const PROXY_MODE_ATTRIBUTE: &str = "proxyMode";
pub const PROXY_MODE_INTERFACES: &str = "interfaces";

/// 包说明记录的名称后缀
pub const PACKAGE_INFO_NAME: &str = "package_info";

/// 编排用 registry post processor 的名称后缀
pub const SCAN_REGISTRAR_NAME: &str = "BeanScanRegistrar";

/// Environment Bean 名称
pub const ENVIRONMENT_BEAN_NAME: &str = "environment";
