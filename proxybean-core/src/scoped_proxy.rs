//! 作用域代理
//!
//! 非单例作用域的 Bean 以代理形式注册在原名称下，真正的目标定义以
//! `scopedTarget.` 前缀注册。代理本身是单例，每次访问时从当前作用域中解析目标。

use std::any::Any;
use std::sync::{Arc, Weak};

use crate::bean::{BeanClass, BeanDefinition, BeanDefinitionHolder, BeanObject};
use crate::bean_factory::{BeanDefinitionRegistry, BeanFactory};
use crate::constants::{OBJECT_TYPE_ATTRIBUTE, SCOPED_TARGET_NAME_PREFIX};
use crate::error::{ContainerError, ContainerResult};

/// 目标 Bean 的注册名称
pub fn get_target_bean_name(original_bean_name: &str) -> String {
    format!("{}{}", SCOPED_TARGET_NAME_PREFIX, original_bean_name)
}

pub fn is_scoped_target(bean_name: &str) -> bool {
    bean_name.starts_with(SCOPED_TARGET_NAME_PREFIX)
}

/// 为定义创建作用域代理
///
/// 代理继承目标的 primary / 自动装配候选标记，目标本身不再参与自动装配。
pub fn create_scoped_proxy(definition: BeanDefinitionHolder) -> BeanDefinitionHolder {
    let (original_name, mut target) = definition.into_parts();
    let target_name = get_target_bean_name(&original_name);

    let mut proxy = BeanDefinition::new(BeanClass::ScopedProxy);
    proxy.set_autowire_candidate(target.is_autowire_candidate());
    proxy.set_primary(target.is_primary());
    let object_type = target
        .attribute(OBJECT_TYPE_ATTRIBUTE)
        .unwrap_or_else(|| target.bean_class_name())
        .to_string();
    proxy.set_attribute(OBJECT_TYPE_ATTRIBUTE, object_type);

    target.set_autowire_candidate(false);
    target.set_primary(false);

    proxy.set_decorated_definition(Some(BeanDefinitionHolder::new(target_name, target)));
    BeanDefinitionHolder::new(original_name, proxy)
}

/// 注册代理及其目标，覆盖两个名称下已有的定义
pub fn register_scoped_proxy(
    proxy: &BeanDefinitionHolder,
    registry: &dyn BeanDefinitionRegistry,
) -> ContainerResult<()> {
    let target = proxy.definition().decorated_definition().ok_or_else(|| {
        ContainerError::BeanCreationFailed(format!(
            "Scoped proxy '{}' has no target definition",
            proxy.bean_name()
        ))
    })?;

    register_replacing(registry, target.bean_name(), target.definition().clone())?;
    register_replacing(registry, proxy.bean_name(), proxy.definition().clone())
}

/// 注册定义，名称已存在时先移除旧定义
pub(crate) fn register_replacing(
    registry: &dyn BeanDefinitionRegistry,
    name: &str,
    definition: BeanDefinition,
) -> ContainerResult<()> {
    if registry.contains_bean_definition(name) {
        tracing::debug!("Replacing existing bean definition '{}'", name);
        registry.remove_bean_definition(name)?;
    }
    registry.register_bean_definition(name, definition)
}

/// 运行时的作用域代理对象
///
/// 不持有目标实例，每次 `target()` 都回到容器中按当前作用域获取。
pub struct ScopedProxy {
    target_bean_name: String,
    target_type: String,
    bean_factory: Weak<dyn BeanFactory>,
}

impl ScopedProxy {
    pub fn new(
        target_bean_name: impl Into<String>,
        target_type: impl Into<String>,
        bean_factory: Weak<dyn BeanFactory>,
    ) -> Self {
        Self {
            target_bean_name: target_bean_name.into(),
            target_type: target_type.into(),
            bean_factory,
        }
    }

    pub fn target_bean_name(&self) -> &str {
        &self.target_bean_name
    }

    pub fn target_type(&self) -> &str {
        &self.target_type
    }

    /// 当前作用域内的目标实例
    pub fn target(&self) -> ContainerResult<BeanObject> {
        let bean_factory = self.bean_factory.upgrade().ok_or_else(|| {
            ContainerError::BeanCreationFailed(format!(
                "Bean factory of scoped proxy for '{}' has been dropped",
                self.target_bean_name
            ))
        })?;
        bean_factory.get_bean(&self.target_bean_name)
    }

    pub fn target_as<T: Any + Send + Sync>(&self) -> ContainerResult<Arc<T>> {
        self.target()?
            .downcast::<T>()
            .map_err(|_| ContainerError::TypeMismatch {
                expected: std::any::type_name::<T>().to_string(),
                found: self.target_type.clone(),
            })
    }
}

impl std::fmt::Debug for ScopedProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedProxy")
            .field("target_bean_name", &self.target_bean_name)
            .field("target_type", &self.target_type)
            .finish()
    }
}
