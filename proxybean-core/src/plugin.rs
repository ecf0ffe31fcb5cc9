//! 自动配置
//!
//! 自动配置在声明式扫描之后、Bean 预实例化之前执行，用于按条件补充 Bean 定义
//! （例如在配置了数据源且容器中没有客户端时注册一个客户端）。

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::ApplicationContext;
use crate::error::ApplicationResult;

/// 自动配置 trait
#[async_trait]
pub trait AutoConfiguration: Send + Sync {
    fn name(&self) -> &str;

    /// 执行顺序（数字越小越先执行）
    fn order(&self) -> i32 {
        100
    }

    /// 条件判断，返回 false 时跳过 `configure`
    fn matches(&self, _context: &ApplicationContext) -> bool {
        true
    }

    /// 配置阶段：注册 Bean 定义
    fn configure(&self, context: &Arc<ApplicationContext>) -> ApplicationResult<()>;

    /// 启动阶段：所有单例创建完成后执行
    async fn on_startup(&self, _context: &Arc<ApplicationContext>) -> ApplicationResult<()> {
        Ok(())
    }

    /// 关闭阶段
    async fn on_shutdown(&self, _context: &Arc<ApplicationContext>) -> ApplicationResult<()> {
        Ok(())
    }
}

/// 自动配置注册表
#[derive(Clone, Default)]
pub struct AutoConfigurationRegistry {
    configurations: Vec<Arc<dyn AutoConfiguration>>,
}

impl AutoConfigurationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, configuration: Arc<dyn AutoConfiguration>) {
        if self.contains(configuration.name()) {
            tracing::debug!("Auto-configuration '{}' already registered", configuration.name());
            return;
        }
        tracing::debug!("Registering auto-configuration: {}", configuration.name());
        self.configurations.push(configuration);
        self.configurations.sort_by_key(|c| c.order());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.configurations.iter().any(|c| c.name() == name)
    }

    pub fn configurations(&self) -> &[Arc<dyn AutoConfiguration>] {
        &self.configurations
    }

    pub fn len(&self) -> usize {
        self.configurations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configurations.is_empty()
    }

    /// 执行满足条件的配置，返回实际执行的数量
    pub fn configure_all(&self, context: &Arc<ApplicationContext>) -> ApplicationResult<usize> {
        let mut applied = 0;
        for configuration in &self.configurations {
            if !configuration.matches(context) {
                tracing::debug!("Auto-configuration '{}' did not match, skipped", configuration.name());
                continue;
            }
            tracing::info!("Applying auto-configuration: {}", configuration.name());
            configuration.configure(context)?;
            applied += 1;
        }
        Ok(applied)
    }

    pub async fn startup_all(&self, context: &Arc<ApplicationContext>) -> ApplicationResult<()> {
        for configuration in &self.configurations {
            tracing::debug!("Starting auto-configuration: {}", configuration.name());
            configuration.on_startup(context).await?;
        }
        Ok(())
    }

    /// 逆序关闭，失败只记录日志
    pub async fn shutdown_all(&self, context: &Arc<ApplicationContext>) {
        for configuration in self.configurations.iter().rev() {
            if let Err(e) = configuration.on_shutdown(context).await {
                tracing::error!(
                    "Failed to shut down auto-configuration {}: {}",
                    configuration.name(),
                    e
                );
            }
        }
    }
}

/// 编译期登记的自动配置
pub struct AutoConfigurationSubmission {
    pub create: fn() -> Arc<dyn AutoConfiguration>,
}

inventory::collect!(AutoConfigurationSubmission);

/// 登记一个实现了 `Default` 的自动配置
#[macro_export]
macro_rules! submit_auto_configuration {
    ($configuration:ty) => {
        $crate::inventory::submit! {
            $crate::plugin::AutoConfigurationSubmission {
                create: || ::std::sync::Arc::new(<$configuration>::default())
            }
        }
    };
}

/// 加载所有登记的自动配置
pub fn load_auto_configurations() -> AutoConfigurationRegistry {
    let mut registry = AutoConfigurationRegistry::new();
    for submission in inventory::iter::<AutoConfigurationSubmission> {
        registry.register((submission.create)());
    }
    registry
}
