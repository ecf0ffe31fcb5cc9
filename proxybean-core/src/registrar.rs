//! 候选定义改写与注册
//!
//! 把扫描得到的接口定义改写为由 FactoryBean 生产的定义：原类型名作为
//! FactoryBean 的构造参数，并通过 `factoryBeanObjectType` 属性暴露给按类型查找。

use crate::bean::{AutowireMode, BeanClass, BeanDefinition, BeanDefinitionHolder, FactoryBeanClass};
use crate::bean_factory::BeanDefinitionRegistry;
use crate::constants::{
    DEFAULT_BEAN_ANNOTATION, OBJECT_TYPE_ATTRIBUTE, SCOPE_ATTRIBUTE, SCOPE_ATTRIBUTE_ALIAS,
};
use crate::error::{ScanError, ScanResult};
use crate::scan::ScanRequest;
use crate::scope::Scope;
use crate::scoped_proxy::{create_scoped_proxy, register_replacing, register_scoped_proxy};

/// FactoryBean 定义处理器
#[derive(Debug, Clone)]
pub struct FactoryBeanDefinitionProcessor {
    factory_bean: FactoryBeanClass,
    bean_annotation: String,
    bean_scope: Scope,
    lazy_initialization: bool,
}

impl FactoryBeanDefinitionProcessor {
    pub fn new(factory_bean: FactoryBeanClass) -> Self {
        Self {
            factory_bean,
            bean_annotation: DEFAULT_BEAN_ANNOTATION.to_string(),
            bean_scope: Scope::Singleton,
            lazy_initialization: false,
        }
    }

    pub fn from_request(request: &ScanRequest) -> Self {
        Self {
            factory_bean: request.factory_bean().clone(),
            bean_annotation: request
                .marker_annotation()
                .unwrap_or(DEFAULT_BEAN_ANNOTATION)
                .to_string(),
            bean_scope: request.bean_scope().clone(),
            lazy_initialization: request.lazy_initialization(),
        }
    }

    /// 读取逐个候选作用域的注解名
    pub fn with_bean_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.bean_annotation = annotation.into();
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

    /// 改写并注册候选定义，返回注册在原名称下的 Bean 名称
    ///
    /// 注册表不可用时记录警告并直接返回。
    pub fn process(
        &self,
        candidates: Vec<BeanDefinitionHolder>,
        registry: Option<&dyn BeanDefinitionRegistry>,
    ) -> ScanResult<Vec<String>> {
        let Some(registry) = registry else {
            tracing::warn!("The bean definition registry is unavailable, no beans will be registered");
            return Ok(Vec::new());
        };

        let mut registered = Vec::with_capacity(candidates.len());
        for holder in candidates {
            registered.push(self.process_candidate(holder, registry)?);
        }

        tracing::info!(
            "Registered {} bean(s) produced by factory bean '{}'",
            registered.len(),
            self.factory_bean.type_name()
        );
        Ok(registered)
    }

    fn process_candidate(
        &self,
        holder: BeanDefinitionHolder,
        registry: &dyn BeanDefinitionRegistry,
    ) -> ScanResult<String> {
        let (bean_name, definition) = holder.into_parts();

        // 已经是 scoped proxy 的候选：改写被装饰的目标，代理保持不变
        if definition.is_scoped_proxy() {
            let target = definition.decorated_definition().cloned().ok_or_else(|| {
                ScanError::Structural(format!(
                    "The target bean definition of scoped proxy bean '{}' not found",
                    bean_name
                ))
            })?;
            return self.register_unwrapped(bean_name, definition, target, registry);
        }

        let mut definition = definition;
        self.rewrite(&mut definition);

        let scope = self.resolve_scope(&definition);
        definition.set_scope(scope.clone());

        if scope.is_singleton() {
            registry.register_bean_definition(&bean_name, definition)?;
        } else {
            tracing::debug!("Wrapping '{}' in a scoped proxy for scope '{}'", bean_name, scope);
            let proxy = create_scoped_proxy(BeanDefinitionHolder::new(bean_name.clone(), definition));
            register_scoped_proxy(&proxy, registry)?;
        }

        tracing::debug!("Registered factory-produced bean '{}'", bean_name);
        Ok(bean_name)
    }

    fn register_unwrapped(
        &self,
        bean_name: String,
        mut proxy: BeanDefinition,
        target: BeanDefinitionHolder,
        registry: &dyn BeanDefinitionRegistry,
    ) -> ScanResult<String> {
        let (target_name, mut target_definition) = target.into_parts();
        self.rewrite(&mut target_definition);

        proxy.set_decorated_definition(Some(BeanDefinitionHolder::new(
            target_name.clone(),
            target_definition.clone(),
        )));

        register_replacing(registry, &target_name, target_definition)?;
        register_replacing(registry, &bean_name, proxy)?;

        tracing::debug!(
            "Registered factory-produced bean '{}' behind existing scoped proxy",
            bean_name
        );
        Ok(bean_name)
    }

    /// 改写为 FactoryBean 定义
    fn rewrite(&self, definition: &mut BeanDefinition) {
        let type_name = definition
            .metadata()
            .map(|metadata| metadata.type_name().to_string())
            .unwrap_or_else(|| definition.bean_class_name().to_string());

        definition
            .constructor_argument_values_mut()
            .add_generic_argument_value(type_name.clone());
        definition.set_bean_class(BeanClass::Factory(self.factory_bean.clone()));
        definition.set_attribute(OBJECT_TYPE_ATTRIBUTE, type_name);
        definition.set_autowire_mode(AutowireMode::ByType);
        definition.set_lazy_init(self.lazy_initialization);
    }

    /// 候选注解上的作用域优先于默认作用域
    fn resolve_scope(&self, definition: &BeanDefinition) -> Scope {
        definition
            .metadata()
            .and_then(|metadata| metadata.annotation(&self.bean_annotation))
            .and_then(|annotation| {
                annotation.first_text_attribute(&[SCOPE_ATTRIBUTE, SCOPE_ATTRIBUTE_ALIAS])
            })
            .map(Scope::parse)
            .unwrap_or_else(|| self.bean_scope.clone())
    }
}
