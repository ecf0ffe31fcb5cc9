//! Bean 定义
//!
//! `BeanDefinition` 描述一个 Bean 如何被创建：由声明类型、实例供应函数、
//! FactoryBean 类型，或者 scoped proxy 产生。

use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::bean_factory::BeanFactory;
use crate::error::ContainerResult;
use crate::metadata::TypeMetadata;
use crate::Scope;

/// 容器中保存的 Bean 实例
pub type BeanObject = Arc<dyn Any + Send + Sync>;

/// FactoryBean - 由容器管理、负责生产另一个对象的 Bean
pub trait FactoryBean: Send + Sync {
    /// 生产对象
    fn get_object(&self) -> ContainerResult<BeanObject>;

    /// 生产对象的类型名
    fn object_type(&self) -> Option<&str>;

    /// 生产的对象是否可以缓存复用
    fn is_singleton(&self) -> bool {
        true
    }
}

/// FactoryBean 类型
///
/// 相当于一个可以被实例化的 FactoryBean 类：容器用 Bean 定义上的构造参数
/// 创建 FactoryBean 实例。当定义的装配模式为按类型装配时，`bean_factory`
/// 用于解析 FactoryBean 自身的依赖。
pub trait FactoryBeanType: Send + Sync {
    fn type_name(&self) -> &str;

    fn instantiate(
        &self,
        args: &ConstructorArgumentValues,
        bean_factory: Option<&dyn BeanFactory>,
    ) -> ContainerResult<Arc<dyn FactoryBean>>;
}

/// 共享的 FactoryBean 类型句柄
#[derive(Clone)]
pub struct FactoryBeanClass(Arc<dyn FactoryBeanType>);

impl FactoryBeanClass {
    pub fn new<T: FactoryBeanType + 'static>(factory_type: T) -> Self {
        Self(Arc::new(factory_type))
    }

    /// 用闭包定义一个 FactoryBean 类型
    pub fn from_fn<F>(type_name: impl Into<String>, instantiate: F) -> Self
    where
        F: Fn(&ConstructorArgumentValues, Option<&dyn BeanFactory>) -> ContainerResult<Arc<dyn FactoryBean>>
            + Send
            + Sync
            + 'static,
    {
        Self::new(FnFactoryBeanType {
            type_name: type_name.into(),
            instantiate: Box::new(instantiate),
        })
    }

    pub fn type_name(&self) -> &str {
        self.0.type_name()
    }

    pub fn instantiate(
        &self,
        args: &ConstructorArgumentValues,
        bean_factory: Option<&dyn BeanFactory>,
    ) -> ContainerResult<Arc<dyn FactoryBean>> {
        self.0.instantiate(args, bean_factory)
    }
}

impl fmt::Debug for FactoryBeanClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FactoryBeanClass").field(&self.type_name()).finish()
    }
}

type InstantiateFn = Box<
    dyn Fn(&ConstructorArgumentValues, Option<&dyn BeanFactory>) -> ContainerResult<Arc<dyn FactoryBean>>
        + Send
        + Sync,
>;

struct FnFactoryBeanType {
    type_name: String,
    instantiate: InstantiateFn,
}

impl FactoryBeanType for FnFactoryBeanType {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn instantiate(
        &self,
        args: &ConstructorArgumentValues,
        bean_factory: Option<&dyn BeanFactory>,
    ) -> ContainerResult<Arc<dyn FactoryBean>> {
        (self.instantiate)(args, bean_factory)
    }
}

/// 构造参数（按追加顺序的通用参数）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstructorArgumentValues {
    generic: Vec<String>,
}

impl ConstructorArgumentValues {
    pub fn add_generic_argument_value(&mut self, value: impl Into<String>) {
        self.generic.push(value.into());
    }

    pub fn generic_argument_values(&self) -> &[String] {
        &self.generic
    }

    pub fn first(&self) -> Option<&str> {
        self.generic.first().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.generic.is_empty()
    }
}

/// 自动装配模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutowireMode {
    #[default]
    No,
    ByName,
    ByType,
    Constructor,
}

type SupplierFn = Arc<dyn Fn(&dyn BeanFactory) -> ContainerResult<BeanObject> + Send + Sync>;

/// 实例供应函数
#[derive(Clone)]
pub struct InstanceSupplier {
    type_id: TypeId,
    type_name: &'static str,
    supply: SupplierFn,
}

impl InstanceSupplier {
    pub fn new<T, F>(supply: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&dyn BeanFactory) -> ContainerResult<T> + Send + Sync + 'static,
    {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            supply: Arc::new(move |factory: &dyn BeanFactory| -> ContainerResult<BeanObject> {
                Ok(Arc::new(supply(factory)?))
            }),
        }
    }

    /// 直接提供共享实例
    pub fn from_instance<T: Any + Send + Sync>(instance: Arc<T>) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            supply: Arc::new(move |_: &dyn BeanFactory| -> ContainerResult<BeanObject> {
                Ok(instance.clone())
            }),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn supply(&self, factory: &dyn BeanFactory) -> ContainerResult<BeanObject> {
        (self.supply)(factory)
    }
}

impl fmt::Debug for InstanceSupplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceSupplier")
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// Bean 的来源
#[derive(Debug, Clone)]
pub enum BeanClass {
    /// 扫描得到的声明类型（接口本身无法直接实例化）
    Declared(String),
    /// 通过供应函数创建
    Supplier(InstanceSupplier),
    /// 由 FactoryBean 生产
    Factory(FactoryBeanClass),
    /// 作用域代理，目标在 decorated definition 中
    ScopedProxy,
}

impl BeanClass {
    pub fn name(&self) -> &str {
        match self {
            BeanClass::Declared(name) => name,
            BeanClass::Supplier(supplier) => supplier.type_name(),
            BeanClass::Factory(factory) => factory.type_name(),
            BeanClass::ScopedProxy => "ScopedProxy",
        }
    }
}

/// Bean 定义 - 描述如何创建和管理 Bean
#[derive(Debug, Clone)]
pub struct BeanDefinition {
    bean_class: BeanClass,
    scope: Scope,
    lazy_init: bool,
    autowire_mode: AutowireMode,
    autowire_candidate: bool,
    primary: bool,
    constructor_args: ConstructorArgumentValues,
    attributes: BTreeMap<String, String>,
    dependencies: Vec<String>,
    metadata: Option<Arc<TypeMetadata>>,
    decorated: Option<Box<BeanDefinitionHolder>>,
}

impl BeanDefinition {
    pub fn new(bean_class: BeanClass) -> Self {
        Self {
            bean_class,
            scope: Scope::default(),
            lazy_init: false,
            autowire_mode: AutowireMode::No,
            autowire_candidate: true,
            primary: false,
            constructor_args: ConstructorArgumentValues::default(),
            attributes: BTreeMap::new(),
            dependencies: Vec::new(),
            metadata: None,
            decorated: None,
        }
    }

    /// 扫描得到的类型定义
    pub fn annotated(metadata: Arc<TypeMetadata>) -> Self {
        let mut definition = Self::new(BeanClass::Declared(metadata.type_name().to_string()));
        definition.metadata = Some(metadata);
        definition
    }

    /// 供应函数定义
    pub fn from_supplier<T, F>(supply: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&dyn BeanFactory) -> ContainerResult<T> + Send + Sync + 'static,
    {
        Self::new(BeanClass::Supplier(InstanceSupplier::new(supply)))
    }

    /// 共享实例定义
    pub fn from_instance<T: Any + Send + Sync>(instance: Arc<T>) -> Self {
        Self::new(BeanClass::Supplier(InstanceSupplier::from_instance(instance)))
    }

    pub fn bean_class(&self) -> &BeanClass {
        &self.bean_class
    }

    pub fn set_bean_class(&mut self, bean_class: BeanClass) {
        self.bean_class = bean_class;
    }

    /// 原始声明类型名
    pub fn bean_class_name(&self) -> &str {
        self.bean_class.name()
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn set_scope(&mut self, scope: Scope) {
        self.scope = scope;
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn is_lazy_init(&self) -> bool {
        self.lazy_init
    }

    pub fn set_lazy_init(&mut self, lazy: bool) {
        self.lazy_init = lazy;
    }

    pub fn with_lazy(mut self, lazy: bool) -> Self {
        self.lazy_init = lazy;
        self
    }

    pub fn autowire_mode(&self) -> AutowireMode {
        self.autowire_mode
    }

    pub fn set_autowire_mode(&mut self, mode: AutowireMode) {
        self.autowire_mode = mode;
    }

    pub fn is_autowire_candidate(&self) -> bool {
        self.autowire_candidate
    }

    pub fn set_autowire_candidate(&mut self, candidate: bool) {
        self.autowire_candidate = candidate;
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    pub fn set_primary(&mut self, primary: bool) {
        self.primary = primary;
    }

    pub fn with_primary(mut self, primary: bool) -> Self {
        self.primary = primary;
        self
    }

    pub fn constructor_argument_values(&self) -> &ConstructorArgumentValues {
        &self.constructor_args
    }

    pub fn constructor_argument_values_mut(&mut self) -> &mut ConstructorArgumentValues {
        &mut self.constructor_args
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// 设置依赖列表
    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// 扫描时记录的类型元数据
    pub fn metadata(&self) -> Option<&Arc<TypeMetadata>> {
        self.metadata.as_ref()
    }

    /// 被装饰（代理）的原始定义
    pub fn decorated_definition(&self) -> Option<&BeanDefinitionHolder> {
        self.decorated.as_deref()
    }

    pub fn set_decorated_definition(&mut self, holder: Option<BeanDefinitionHolder>) {
        self.decorated = holder.map(Box::new);
    }

    pub fn is_scoped_proxy(&self) -> bool {
        matches!(self.bean_class, BeanClass::ScopedProxy)
    }

    /// 实例的类型 ID（仅对供应函数定义可知）
    pub fn supplied_type_id(&self) -> Option<TypeId> {
        match &self.bean_class {
            BeanClass::Supplier(supplier) => Some(supplier.type_id()),
            _ => None,
        }
    }
}

/// 带名称的 Bean 定义
#[derive(Debug, Clone)]
pub struct BeanDefinitionHolder {
    bean_name: String,
    definition: BeanDefinition,
}

impl BeanDefinitionHolder {
    pub fn new(bean_name: impl Into<String>, definition: BeanDefinition) -> Self {
        Self {
            bean_name: bean_name.into(),
            definition,
        }
    }

    pub fn bean_name(&self) -> &str {
        &self.bean_name
    }

    pub fn definition(&self) -> &BeanDefinition {
        &self.definition
    }

    pub fn definition_mut(&mut self) -> &mut BeanDefinition {
        &mut self.definition
    }

    pub fn into_parts(self) -> (String, BeanDefinition) {
        (self.bean_name, self.definition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::TypeMetadata;

    #[test]
    fn test_annotated_definition_defaults() {
        let metadata = Arc::new(TypeMetadata::interface("app::repo::UserRepository"));
        let definition = BeanDefinition::annotated(metadata);

        assert_eq!(definition.bean_class_name(), "app::repo::UserRepository");
        assert_eq!(definition.scope(), &Scope::Singleton);
        assert!(!definition.is_lazy_init());
        assert!(definition.is_autowire_candidate());
        assert_eq!(definition.autowire_mode(), AutowireMode::No);
        assert!(definition.constructor_argument_values().is_empty());
        assert!(definition.decorated_definition().is_none());
    }

    #[test]
    fn test_supplier_records_type() {
        let definition = BeanDefinition::from_supplier(|_| Ok(42_u32));
        assert_eq!(definition.supplied_type_id(), Some(TypeId::of::<u32>()));
        assert_eq!(definition.bean_class_name(), "u32");
    }

    #[test]
    fn test_constructor_args_keep_order() {
        let mut args = ConstructorArgumentValues::default();
        args.add_generic_argument_value("first");
        args.add_generic_argument_value("second");
        assert_eq!(args.first(), Some("first"));
        assert_eq!(args.generic_argument_values(), ["first", "second"]);
    }
}
