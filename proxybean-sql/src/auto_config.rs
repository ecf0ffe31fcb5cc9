//! SQL 自动配置
//!
//! 配置了 `datasource.url` 且容器中没有数据源时注册 `DataSource`；存在数据源
//! 但没有客户端时注册 `SqlClient` 并安装所有登记的 sql object。

use std::sync::Arc;

use proxybean_core::prelude::*;
use proxybean_core::submit_auto_configuration;

use crate::client::SqlClient;
use crate::datasource::{DataSource, DataSourceProperties, DATASOURCE_PREFIX};

pub const DATA_SOURCE_BEAN_NAME: &str = "dataSource";
pub const SQL_CLIENT_BEAN_NAME: &str = "sqlClient";

/// 数据源自动配置
#[derive(Debug, Default)]
pub struct DataSourceAutoConfiguration;

#[async_trait::async_trait]
impl AutoConfiguration for DataSourceAutoConfiguration {
    fn name(&self) -> &str {
        "DataSourceAutoConfiguration"
    }

    fn order(&self) -> i32 {
        10
    }

    fn matches(&self, context: &ApplicationContext) -> bool {
        let configured = context
            .environment()
            .get_string(&format!("{}.url", DATASOURCE_PREFIX))
            .is_some_and(|url| !url.trim().is_empty());
        configured && !context.contains_bean_by_type::<DataSource>()
    }

    fn configure(&self, context: &Arc<ApplicationContext>) -> ApplicationResult<()> {
        let Some(properties) = DataSourceProperties::from_environment(context.environment())? else {
            return Ok(());
        };
        let data_source = DataSource::new(properties)?;
        context.register_singleton(DATA_SOURCE_BEAN_NAME, Arc::new(data_source))?;
        tracing::info!("DataSource configured");
        Ok(())
    }

    /// 按配置在阻塞线程上检查一次连通性
    async fn on_startup(&self, context: &Arc<ApplicationContext>) -> ApplicationResult<()> {
        let Ok(data_source) = context.get_bean_by_type::<DataSource>() else {
            return Ok(());
        };
        if !data_source.properties().validate_on_startup {
            return Ok(());
        }

        tracing::info!("Validating datasource {}", data_source.properties().masked_url());
        tokio::task::spawn_blocking(move || data_source.validate())
            .await
            .map_err(|e| anyhow!("datasource validation task failed: {}", e))??;
        Ok(())
    }
}

submit_auto_configuration!(DataSourceAutoConfiguration);

/// SQL 客户端自动配置
#[derive(Debug)]
pub struct SqlClientAutoConfiguration {
    /// 是否安装 `sql_object!` 登记的实现
    auto_install: bool,
}

impl SqlClientAutoConfiguration {
    pub fn new(auto_install: bool) -> Self {
        Self { auto_install }
    }
}

impl Default for SqlClientAutoConfiguration {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait::async_trait]
impl AutoConfiguration for SqlClientAutoConfiguration {
    fn name(&self) -> &str {
        "SqlClientAutoConfiguration"
    }

    /// 在数据源之后
    fn order(&self) -> i32 {
        20
    }

    fn matches(&self, context: &ApplicationContext) -> bool {
        context.contains_bean_by_type::<DataSource>() && !context.contains_bean_by_type::<SqlClient>()
    }

    fn configure(&self, context: &Arc<ApplicationContext>) -> ApplicationResult<()> {
        let data_source = context.get_bean_by_type::<DataSource>()?;
        let client = SqlClient::new(data_source.as_ref().clone());
        if self.auto_install {
            client.install_declared();
        }
        context.register_singleton(SQL_CLIENT_BEAN_NAME, Arc::new(client))?;
        tracing::info!("SqlClient configured");
        Ok(())
    }
}

submit_auto_configuration!(SqlClientAutoConfiguration);
