//! Bean Factory - 核心容器接口
//!
//! 参考 Spring 的 BeanFactory / BeanDefinitionRegistry 分层设计：
//! 扫描与注册只依赖 `BeanDefinitionRegistry`，Bean 的获取走 `BeanFactory`。

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::bean::{AutowireMode, BeanClass, BeanDefinition, BeanObject, FactoryBean};
use crate::constants::{FACTORY_BEAN_PREFIX, OBJECT_TYPE_ATTRIBUTE};
use crate::error::{ContainerError, ContainerResult};
use crate::scope::{Scope, ScopeHandler};
use crate::scoped_proxy::ScopedProxy;
use crate::utils::dependency::CreationTracker;

/// BeanFactory - 最基础的容器接口
///
/// 注意：此 trait 不包含泛型方法，因此可以作为 trait object 使用
pub trait BeanFactory: Send + Sync {
    /// 通过名称获取 Bean，`&name` 返回 FactoryBean 本身
    fn get_bean(&self, name: &str) -> ContainerResult<BeanObject>;

    /// 检查是否包含指定名称的 Bean
    fn contains_bean(&self, name: &str) -> bool;

    /// 是否为单例
    fn is_singleton(&self, name: &str) -> ContainerResult<bool>;

    /// Bean 对外暴露的类型名
    fn get_type(&self, name: &str) -> ContainerResult<Option<String>>;

    /// 获取指定实例类型的所有 Bean 名称（仅自动装配候选）
    fn get_bean_names_for_type_id(&self, type_id: TypeId) -> Vec<String>;
}

/// BeanFactoryExt - BeanFactory 的扩展 trait
///
/// 提供泛型方法，对所有 BeanFactory（包括 trait object）自动实现
pub trait BeanFactoryExt: BeanFactory {
    /// 通过名称获取指定类型的 Bean
    fn get_bean_of<T: Any + Send + Sync>(&self, name: &str) -> ContainerResult<Arc<T>> {
        self.get_bean(name)?
            .downcast::<T>()
            .map_err(|_| type_mismatch::<T, Self>(self, name))
    }

    /// 通过类型获取唯一的 Bean
    fn get_bean_by_type<T: Any + Send + Sync>(&self) -> ContainerResult<Arc<T>> {
        let type_name = std::any::type_name::<T>();
        let names = self.get_bean_names_for_type_id(TypeId::of::<T>());
        match names.as_slice() {
            [name] => self.get_bean_of::<T>(name),
            [] => Err(ContainerError::BeanNotFound(format!(
                "No bean found for type '{}'",
                type_name
            ))),
            _ => Err(ContainerError::BeanCreationFailed(format!(
                "Expected a single bean of type '{}' but found {}: {:?}",
                type_name,
                names.len(),
                names
            ))),
        }
    }

    /// 检查是否包含指定类型的 Bean
    fn contains_bean_by_type<T: Any + Send + Sync>(&self) -> bool {
        !self.get_bean_names_for_type_id(TypeId::of::<T>()).is_empty()
    }

    /// 获取以 `Arc<dyn Trait>` 形式保存的接口实现
    ///
    /// scoped proxy 会在调用时解析为当前作用域内的目标对象
    fn get_interface<T: ?Sized + Send + Sync + 'static>(&self, name: &str) -> ContainerResult<Arc<T>> {
        let bean = self.get_bean(name)?;
        let bean = match bean.downcast::<ScopedProxy>() {
            Ok(proxy) => proxy.target()?,
            Err(bean) => bean,
        };
        bean.downcast::<Arc<T>>()
            .map(|inner| Arc::clone(&*inner))
            .map_err(|_| type_mismatch::<Arc<T>, Self>(self, name))
    }
}

impl<F: BeanFactory + ?Sized> BeanFactoryExt for F {}

fn type_mismatch<T: ?Sized, F: BeanFactory + ?Sized>(factory: &F, name: &str) -> ContainerError {
    ContainerError::TypeMismatch {
        expected: std::any::type_name::<T>().to_string(),
        found: factory
            .get_type(name)
            .ok()
            .flatten()
            .unwrap_or_else(|| "unknown".to_string()),
    }
}

/// BeanDefinitionRegistry - Bean 定义注册表
///
/// 扫描器与注册器只通过这个能力接口访问容器
pub trait BeanDefinitionRegistry: Send + Sync {
    /// 注册 Bean 定义，名称已存在时返回 `BeanAlreadyExists`
    fn register_bean_definition(&self, name: &str, definition: BeanDefinition) -> ContainerResult<()>;

    /// 移除 Bean 定义
    fn remove_bean_definition(&self, name: &str) -> ContainerResult<BeanDefinition>;

    /// 获取 Bean 定义的副本
    fn get_bean_definition(&self, name: &str) -> ContainerResult<BeanDefinition>;

    fn contains_bean_definition(&self, name: &str) -> bool;

    /// 按注册顺序返回所有 Bean 名称
    fn get_bean_definition_names(&self) -> Vec<String>;

    fn get_bean_definition_count(&self) -> usize;

    fn is_bean_name_in_use(&self, name: &str) -> bool {
        self.contains_bean_definition(name)
    }
}

/// ListableBeanFactory - 可列举的 Bean 工厂
pub trait ListableBeanFactory: BeanFactory {
    /// 获取所有 Bean 的名称
    fn get_bean_names(&self) -> Vec<String>;

    /// 按对外类型名查找 Bean（FactoryBean 以 `factoryBeanObjectType` 属性为准）
    fn get_bean_names_for_type_name(&self, type_name: &str) -> Vec<String>;
}

/// ConfigurableBeanFactory - 可配置的 Bean 工厂
pub trait ConfigurableBeanFactory: BeanFactory {
    /// 注册自定义作用域
    fn register_scope(&self, name: &str, handler: Arc<dyn ScopeHandler>);

    fn get_registered_scope(&self, name: &str) -> Option<Arc<dyn ScopeHandler>>;

    fn get_registered_scope_names(&self) -> Vec<String>;
}

/// ConfigurableListableBeanFactory - 可配置且可列举的 Bean 工厂
pub trait ConfigurableListableBeanFactory:
    ListableBeanFactory + ConfigurableBeanFactory + BeanDefinitionRegistry
{
    /// 预实例化所有非延迟加载的单例 Bean
    fn preinstantiate_singletons(&self) -> ContainerResult<()>;

    /// 冻结配置（不再允许修改 Bean 定义）
    fn freeze_configuration(&self);

    fn is_configuration_frozen(&self) -> bool;

    /// 销毁所有单例 Bean，返回释放的实例数
    fn destroy_singletons(&self) -> usize;
}

/// DefaultListableBeanFactory - ConfigurableListableBeanFactory 的默认实现
pub struct DefaultListableBeanFactory {
    /// 自身的弱引用，供 scoped proxy 回查目标 Bean
    self_ref: Weak<DefaultListableBeanFactory>,

    /// Bean 定义存储
    definitions: RwLock<HashMap<String, BeanDefinition>>,

    /// 注册顺序
    definition_names: RwLock<Vec<String>>,

    /// 单例 Bean 缓存
    singletons: RwLock<HashMap<String, BeanObject>>,

    /// 单例定义对应的 FactoryBean 实例
    factory_beans: RwLock<HashMap<String, Arc<dyn FactoryBean>>>,

    /// 自定义作用域
    scopes: RwLock<HashMap<String, Arc<dyn ScopeHandler>>>,

    /// 循环依赖检测
    creation_tracker: CreationTracker,

    /// 配置是否已冻结
    configuration_frozen: RwLock<bool>,
}

impl DefaultListableBeanFactory {
    /// 创建新的 Bean 工厂
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            self_ref: self_ref.clone(),
            definitions: RwLock::new(HashMap::new()),
            definition_names: RwLock::new(Vec::new()),
            singletons: RwLock::new(HashMap::new()),
            factory_beans: RwLock::new(HashMap::new()),
            scopes: RwLock::new(HashMap::new()),
            creation_tracker: CreationTracker::new(),
            configuration_frozen: RwLock::new(false),
        })
    }

    /// 修改 Bean 定义
    pub fn modify_bean_definition<F>(&self, name: &str, modifier: F) -> ContainerResult<()>
    where
        F: FnOnce(&mut BeanDefinition),
    {
        self.ensure_not_frozen("modify bean definition")?;

        let mut definitions = self.definitions.write();
        let definition = definitions
            .get_mut(name)
            .ok_or_else(|| ContainerError::BeanNotFound(name.to_string()))?;
        modifier(definition);
        tracing::debug!("Bean definition '{}' modified successfully", name);
        Ok(())
    }

    /// 已缓存的单例实例（不会触发创建）
    pub fn get_singleton(&self, name: &str) -> Option<BeanObject> {
        self.singletons.read().get(name).cloned()
    }

    fn ensure_not_frozen(&self, action: &str) -> ContainerResult<()> {
        if *self.configuration_frozen.read() {
            return Err(ContainerError::ConfigurationFrozen(format!("cannot {}", action)));
        }
        Ok(())
    }

    fn definition(&self, name: &str) -> ContainerResult<BeanDefinition> {
        self.definitions.read().get(name).cloned().ok_or_else(|| {
            tracing::debug!("Bean '{}' not found in container", name);
            ContainerError::BeanNotFound(name.to_string())
        })
    }

    /// 获取（必要时实例化）定义对应的 FactoryBean
    ///
    /// 单例定义的 FactoryBean 会被缓存，其它作用域每次都创建新的 FactoryBean
    fn factory_bean(&self, name: &str, definition: &BeanDefinition) -> ContainerResult<Arc<dyn FactoryBean>> {
        let BeanClass::Factory(factory_class) = definition.bean_class() else {
            return Err(ContainerError::BeanCreationFailed(format!(
                "Bean '{}' is not a factory bean",
                name
            )));
        };

        if definition.scope().is_singleton() {
            if let Some(existing) = self.factory_beans.read().get(name) {
                return Ok(existing.clone());
            }
        }

        let bean_factory: Option<&dyn BeanFactory> = match definition.autowire_mode() {
            AutowireMode::ByType => Some(self),
            _ => None,
        };

        tracing::debug!(
            "Instantiating factory bean '{}' of type '{}'",
            name,
            factory_class.type_name()
        );
        let factory_bean = factory_class
            .instantiate(definition.constructor_argument_values(), bean_factory)
            .map_err(|e| wrap_creation_error(name, e))?;

        if definition.scope().is_singleton() {
            let mut cache = self.factory_beans.write();
            return Ok(cache.entry(name.to_string()).or_insert(factory_bean).clone());
        }
        Ok(factory_bean)
    }

    /// 创建 Bean 实例
    fn create_bean(&self, name: &str, definition: &BeanDefinition) -> ContainerResult<BeanObject> {
        let Some(_guard) = self.creation_tracker.guard(name) else {
            let chain = self.creation_tracker.current_creating();
            return Err(ContainerError::CircularDependency(format!(
                "{} -> {}",
                chain.join(" -> "),
                name
            )));
        };

        match definition.bean_class() {
            BeanClass::Declared(type_name) => Err(ContainerError::BeanCreationFailed(format!(
                "'{}' is a bare type declaration ({}) with no factory bean bound",
                name, type_name
            ))),
            BeanClass::Supplier(supplier) => supplier
                .supply(self)
                .map_err(|e| wrap_creation_error(name, e)),
            BeanClass::Factory(_) => {
                let factory_bean = self.factory_bean(name, definition)?;
                factory_bean
                    .get_object()
                    .map_err(|e| wrap_creation_error(name, e))
            }
            BeanClass::ScopedProxy => {
                let target = definition.decorated_definition().ok_or_else(|| {
                    ContainerError::BeanCreationFailed(format!(
                        "Scoped proxy '{}' has no target definition",
                        name
                    ))
                })?;
                let bean_factory: Weak<dyn BeanFactory> = self.self_ref.clone();
                let proxy = ScopedProxy::new(
                    target.bean_name(),
                    exposed_type(target.definition()),
                    bean_factory,
                );
                Ok(Arc::new(proxy))
            }
        }
    }

    /// 单例定义的产物是否可以缓存（FactoryBean 可以声明非单例产物）
    fn is_shared_product(&self, name: &str, definition: &BeanDefinition) -> bool {
        match definition.bean_class() {
            BeanClass::Factory(_) => self
                .factory_beans
                .read()
                .get(name)
                .map(|fb| fb.is_singleton())
                .unwrap_or(true),
            _ => true,
        }
    }

    fn get_singleton_bean(&self, name: &str, definition: &BeanDefinition) -> ContainerResult<BeanObject> {
        if let Some(bean) = self.singletons.read().get(name) {
            tracing::trace!("Returning cached instance of singleton bean '{}'", name);
            return Ok(Arc::clone(bean));
        }

        tracing::debug!("Creating shared instance of singleton bean '{}'", name);
        let bean = self.create_bean(name, definition)?;

        if !self.is_shared_product(name, definition) {
            return Ok(bean);
        }

        let mut singletons = self.singletons.write();
        Ok(singletons.entry(name.to_string()).or_insert(bean).clone())
    }
}

/// 包装创建错误，保留循环依赖错误原样
fn wrap_creation_error(name: &str, error: ContainerError) -> ContainerError {
    match error {
        ContainerError::CircularDependency(_) | ContainerError::ScopeNotActive(_) => error,
        other => ContainerError::BeanCreationFailed(format!("{}: {}", name, other)),
    }
}

/// 定义对外暴露的类型名
fn exposed_type(definition: &BeanDefinition) -> String {
    if let Some(object_type) = definition.attribute(OBJECT_TYPE_ATTRIBUTE) {
        return object_type.to_string();
    }
    match (definition.bean_class(), definition.decorated_definition()) {
        (BeanClass::ScopedProxy, Some(target)) => exposed_type(target.definition()),
        (bean_class, _) => bean_class.name().to_string(),
    }
}

impl BeanFactory for DefaultListableBeanFactory {
    fn get_bean(&self, name: &str) -> ContainerResult<BeanObject> {
        tracing::trace!("Requesting bean: '{}'", name);

        if let Some(factory_name) = name.strip_prefix(FACTORY_BEAN_PREFIX) {
            let definition = self.definition(factory_name)?;
            let factory_bean = self.factory_bean(factory_name, &definition)?;
            return Ok(Arc::new(factory_bean));
        }

        let definition = self.definition(name)?;

        match definition.scope() {
            Scope::Singleton => self.get_singleton_bean(name, &definition),
            Scope::Prototype => {
                tracing::trace!("Creating new instance of prototype bean '{}'", name);
                self.create_bean(name, &definition)
            }
            Scope::Custom(scope_name) => {
                let handler = self
                    .get_registered_scope(scope_name)
                    .ok_or_else(|| ContainerError::NoSuchScope(scope_name.clone()))?;
                handler.get(name, &|| self.create_bean(name, &definition))
            }
        }
    }

    fn contains_bean(&self, name: &str) -> bool {
        let name = name.strip_prefix(FACTORY_BEAN_PREFIX).unwrap_or(name);
        self.definitions.read().contains_key(name)
    }

    fn is_singleton(&self, name: &str) -> ContainerResult<bool> {
        let definition = self.definition(name.strip_prefix(FACTORY_BEAN_PREFIX).unwrap_or(name))?;
        Ok(definition.scope().is_singleton())
    }

    fn get_type(&self, name: &str) -> ContainerResult<Option<String>> {
        if let Some(factory_name) = name.strip_prefix(FACTORY_BEAN_PREFIX) {
            let definition = self.definition(factory_name)?;
            return Ok(Some(definition.bean_class_name().to_string()));
        }
        Ok(Some(exposed_type(&self.definition(name)?)))
    }

    fn get_bean_names_for_type_id(&self, type_id: TypeId) -> Vec<String> {
        let definitions = self.definitions.read();
        self.definition_names
            .read()
            .iter()
            .filter(|name| {
                definitions.get(name.as_str()).is_some_and(|def| {
                    def.is_autowire_candidate() && def.supplied_type_id() == Some(type_id)
                })
            })
            .cloned()
            .collect()
    }
}

impl BeanDefinitionRegistry for DefaultListableBeanFactory {
    fn register_bean_definition(&self, name: &str, definition: BeanDefinition) -> ContainerResult<()> {
        self.ensure_not_frozen("register bean definition")?;

        tracing::trace!(
            "Attempting to register bean: name='{}', type='{}', scope={}",
            name,
            definition.bean_class_name(),
            definition.scope()
        );

        let mut definitions = self.definitions.write();
        if definitions.contains_key(name) {
            tracing::warn!("Bean '{}' already exists, registration failed", name);
            return Err(ContainerError::BeanAlreadyExists(name.to_string()));
        }
        definitions.insert(name.to_string(), definition);
        self.definition_names.write().push(name.to_string());

        tracing::debug!("Bean definition registered successfully: '{}'", name);
        Ok(())
    }

    fn remove_bean_definition(&self, name: &str) -> ContainerResult<BeanDefinition> {
        self.ensure_not_frozen("remove bean definition")?;

        let removed = self
            .definitions
            .write()
            .remove(name)
            .ok_or_else(|| ContainerError::BeanNotFound(name.to_string()))?;
        self.definition_names.write().retain(|n| n != name);
        self.singletons.write().remove(name);
        self.factory_beans.write().remove(name);

        tracing::debug!("Bean definition removed: '{}'", name);
        Ok(removed)
    }

    fn get_bean_definition(&self, name: &str) -> ContainerResult<BeanDefinition> {
        self.definition(name)
    }

    fn contains_bean_definition(&self, name: &str) -> bool {
        self.definitions.read().contains_key(name)
    }

    fn get_bean_definition_names(&self) -> Vec<String> {
        self.definition_names.read().clone()
    }

    fn get_bean_definition_count(&self) -> usize {
        self.definitions.read().len()
    }
}

impl ListableBeanFactory for DefaultListableBeanFactory {
    fn get_bean_names(&self) -> Vec<String> {
        self.get_bean_definition_names()
    }

    fn get_bean_names_for_type_name(&self, type_name: &str) -> Vec<String> {
        let definitions = self.definitions.read();
        self.definition_names
            .read()
            .iter()
            .filter(|name| {
                definitions.get(name.as_str()).is_some_and(|def| {
                    def.is_autowire_candidate() && exposed_type(def) == type_name
                })
            })
            .cloned()
            .collect()
    }
}

impl ConfigurableBeanFactory for DefaultListableBeanFactory {
    fn register_scope(&self, name: &str, handler: Arc<dyn ScopeHandler>) {
        tracing::debug!("Registering scope '{}'", name);
        self.scopes.write().insert(name.to_string(), handler);
    }

    fn get_registered_scope(&self, name: &str) -> Option<Arc<dyn ScopeHandler>> {
        self.scopes.read().get(name).cloned()
    }

    fn get_registered_scope_names(&self) -> Vec<String> {
        self.scopes.read().keys().cloned().collect()
    }
}

impl ConfigurableListableBeanFactory for DefaultListableBeanFactory {
    fn preinstantiate_singletons(&self) -> ContainerResult<()> {
        let bean_names: Vec<String> = {
            let definitions = self.definitions.read();
            self.definition_names
                .read()
                .iter()
                .filter(|name| {
                    definitions.get(name.as_str()).is_some_and(|def| {
                        def.scope().is_singleton()
                            && !def.is_lazy_init()
                            && !matches!(def.bean_class(), BeanClass::Declared(_))
                    })
                })
                .cloned()
                .collect()
        };

        tracing::debug!("Pre-instantiating {} singleton beans", bean_names.len());

        for name in bean_names {
            self.get_bean(&name)?;
        }

        Ok(())
    }

    fn freeze_configuration(&self) {
        *self.configuration_frozen.write() = true;
        tracing::debug!("Bean factory configuration frozen");
    }

    fn is_configuration_frozen(&self) -> bool {
        *self.configuration_frozen.read()
    }

    fn destroy_singletons(&self) -> usize {
        let released = {
            let mut singletons = self.singletons.write();
            let count = singletons.len();
            singletons.clear();
            count
        };
        self.factory_beans.write().clear();
        tracing::info!("Destroyed {} singleton bean(s)", released);
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bean::{ConstructorArgumentValues, FactoryBeanClass};
    use crate::scope::ContextualScope;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Greeter {
        greeting: String,
    }

    struct GreeterFactoryBean {
        greeting: String,
        non_singleton: bool,
    }

    impl FactoryBean for GreeterFactoryBean {
        fn get_object(&self) -> ContainerResult<BeanObject> {
            Ok(Arc::new(Greeter {
                greeting: self.greeting.clone(),
            }))
        }

        fn object_type(&self) -> Option<&str> {
            Some("Greeter")
        }

        fn is_singleton(&self) -> bool {
            !self.non_singleton
        }
    }

    fn greeter_factory(non_singleton: bool) -> FactoryBeanClass {
        FactoryBeanClass::from_fn("GreeterFactoryBean", move |args: &ConstructorArgumentValues, _| {
            Ok(Arc::new(GreeterFactoryBean {
                greeting: args.first().unwrap_or("hello").to_string(),
                non_singleton,
            }) as Arc<dyn FactoryBean>)
        })
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let factory = DefaultListableBeanFactory::new();
        factory
            .register_bean_definition("a", BeanDefinition::from_supplier(|_| Ok(1_u32)))
            .unwrap();
        let err = factory
            .register_bean_definition("a", BeanDefinition::from_supplier(|_| Ok(2_u32)))
            .unwrap_err();
        assert!(matches!(err, ContainerError::BeanAlreadyExists(name) if name == "a"));
        assert_eq!(*factory.get_bean_of::<u32>("a").unwrap(), 1);
    }

    #[test]
    fn test_singleton_and_prototype() {
        let factory = DefaultListableBeanFactory::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let c1 = counter.clone();
        let c2 = counter.clone();
        factory
            .register_bean_definition(
                "single",
                BeanDefinition::from_supplier(move |_| Ok(c1.fetch_add(1, Ordering::SeqCst))),
            )
            .unwrap();
        factory
            .register_bean_definition(
                "proto",
                BeanDefinition::from_supplier(move |_| Ok(c2.fetch_add(1, Ordering::SeqCst)))
                    .with_scope(Scope::Prototype),
            )
            .unwrap();

        let a = factory.get_bean("single").unwrap();
        let b = factory.get_bean("single").unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let p1 = factory.get_bean("proto").unwrap();
        let p2 = factory.get_bean("proto").unwrap();
        assert!(!Arc::ptr_eq(&p1, &p2));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_get_bean_by_type_uses_supplied_type() {
        let factory = DefaultListableBeanFactory::new();
        factory
            .register_bean_definition("name", BeanDefinition::from_supplier(|_| Ok(String::from("x"))))
            .unwrap();
        assert_eq!(factory.get_bean_by_type::<String>().unwrap().as_str(), "x");
        assert!(factory.contains_bean_by_type::<String>());
        assert!(!factory.contains_bean_by_type::<u64>());
    }

    #[test]
    fn test_factory_bean_product_and_ampersand_lookup() {
        let factory = DefaultListableBeanFactory::new();
        let mut definition = BeanDefinition::new(BeanClass::Factory(greeter_factory(false)));
        definition
            .constructor_argument_values_mut()
            .add_generic_argument_value("hi");
        definition.set_attribute(OBJECT_TYPE_ATTRIBUTE, "Greeter");
        factory.register_bean_definition("greeter", definition).unwrap();

        let greeter = factory.get_bean_of::<Greeter>("greeter").unwrap();
        assert_eq!(greeter.greeting, "hi");
        assert!(Arc::ptr_eq(&greeter, &factory.get_bean_of::<Greeter>("greeter").unwrap()));

        let factory_bean = factory
            .get_bean_of::<Arc<dyn FactoryBean>>("&greeter")
            .unwrap();
        assert_eq!(factory_bean.object_type(), Some("Greeter"));
        assert_eq!(factory.get_type("greeter").unwrap().as_deref(), Some("Greeter"));
        assert_eq!(factory.get_bean_names_for_type_name("Greeter"), vec!["greeter"]);
    }

    #[test]
    fn test_non_singleton_factory_product_is_not_cached() {
        let factory = DefaultListableBeanFactory::new();
        factory
            .register_bean_definition(
                "greeter",
                BeanDefinition::new(BeanClass::Factory(greeter_factory(true))),
            )
            .unwrap();
        let a = factory.get_bean("greeter").unwrap();
        let b = factory.get_bean("greeter").unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_declared_type_cannot_be_instantiated() {
        let factory = DefaultListableBeanFactory::new();
        factory
            .register_bean_definition("raw", BeanDefinition::new(BeanClass::Declared("app::Repo".into())))
            .unwrap();
        assert!(matches!(
            factory.get_bean("raw"),
            Err(ContainerError::BeanCreationFailed(_))
        ));
        // 预实例化跳过纯声明
        factory.preinstantiate_singletons().unwrap();
    }

    #[test]
    fn test_circular_dependency_detected() {
        let factory = DefaultListableBeanFactory::new();
        factory
            .register_bean_definition(
                "a",
                BeanDefinition::from_supplier(|f: &dyn BeanFactory| {
                    f.get_bean("b")?;
                    Ok(1_u8)
                }),
            )
            .unwrap();
        factory
            .register_bean_definition(
                "b",
                BeanDefinition::from_supplier(|f: &dyn BeanFactory| {
                    f.get_bean("a")?;
                    Ok(2_u8)
                }),
            )
            .unwrap();

        let err = factory.get_bean("a").unwrap_err();
        assert!(matches!(err, ContainerError::CircularDependency(chain) if chain == "a -> b -> a"));
    }

    #[test]
    fn test_custom_scope_requires_registration() {
        let factory = DefaultListableBeanFactory::new();
        factory
            .register_bean_definition(
                "scoped",
                BeanDefinition::from_supplier(|_| Ok(1_u8)).with_scope(Scope::Custom("request".into())),
            )
            .unwrap();
        assert!(matches!(
            factory.get_bean("scoped"),
            Err(ContainerError::NoSuchScope(name)) if name == "request"
        ));

        let scope = Arc::new(ContextualScope::new("request"));
        factory.register_scope("request", scope.clone());
        let _guard = scope.activate("r1");
        assert_eq!(*factory.get_bean_of::<u8>("scoped").unwrap(), 1);
    }

    #[test]
    fn test_frozen_configuration_rejects_changes() {
        let factory = DefaultListableBeanFactory::new();
        factory.freeze_configuration();
        assert!(matches!(
            factory.register_bean_definition("a", BeanDefinition::from_supplier(|_| Ok(1_u8))),
            Err(ContainerError::ConfigurationFrozen(_))
        ));
    }

    #[test]
    fn test_remove_keeps_registration_order() {
        let factory = DefaultListableBeanFactory::new();
        for name in ["a", "b", "c"] {
            factory
                .register_bean_definition(name, BeanDefinition::from_supplier(|_| Ok(0_u8)))
                .unwrap();
        }
        factory.remove_bean_definition("b").unwrap();
        assert_eq!(factory.get_bean_definition_names(), vec!["a", "c"]);
        assert_eq!(factory.get_bean_definition_count(), 2);
    }

    trait Named: Send + Sync {
        fn name(&self) -> &str;
    }

    struct Fixed(&'static str);

    impl Named for Fixed {
        fn name(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn test_get_interface_returns_trait_object() {
        let factory = DefaultListableBeanFactory::new();
        factory
            .register_bean_definition(
                "named",
                BeanDefinition::from_supplier(|_| Ok(Arc::new(Fixed("fixed")) as Arc<dyn Named>)),
            )
            .unwrap();

        let named: Arc<dyn Named> = factory.get_interface::<dyn Named>("named").unwrap();
        assert_eq!(named.name(), "fixed");
        assert!(matches!(
            factory.get_interface::<dyn std::fmt::Debug + Send + Sync>("named"),
            Err(ContainerError::TypeMismatch { .. })
        ));
    }
}
