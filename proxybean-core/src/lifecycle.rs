//! 容器启动阶段的扩展点

use std::any::TypeId;
use std::sync::Arc;

use crate::bean_factory::BeanDefinitionRegistry;
use crate::error::ApplicationResult;

/// BeanDefinitionRegistryPostProcessor - 在任何 Bean 实例化之前修改注册表
///
/// 以 `Arc<dyn BeanDefinitionRegistryPostProcessor>` 的形式注册为 Bean，
/// 由 `ApplicationContext::refresh` 在定义注册阶段依次调用。
pub trait BeanDefinitionRegistryPostProcessor: Send + Sync {
    fn post_process_bean_definition_registry(
        &self,
        registry: &Arc<dyn BeanDefinitionRegistry>,
    ) -> ApplicationResult<()>;

    /// 执行顺序（数字越小越先执行）
    fn order(&self) -> i32 {
        0
    }
}

/// 注册表中 post processor Bean 的实例类型
pub type SharedRegistryPostProcessor = Arc<dyn BeanDefinitionRegistryPostProcessor>;

pub(crate) fn registry_post_processor_type_id() -> TypeId {
    TypeId::of::<SharedRegistryPostProcessor>()
}
