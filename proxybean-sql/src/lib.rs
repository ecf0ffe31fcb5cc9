// proxybean-sql: 基于 PostgreSQL 连接池的仓库扫描
//
// - `DataSource`：r2d2 连接池，配置来自 `datasource.*`
// - `SqlClient`：按接口类型名附着 sql object，每次调用借出连接
// - `RepositoryScan` / `repository_scan!`：绑定仓库 FactoryBean 的扫描预设
// - 自动配置：按条件注册数据源与客户端

pub mod auto_config;
pub mod client;
pub mod datasource;
pub mod error;
pub mod factory_bean;
pub mod repository_scan;

pub use auto_config::{DataSourceAutoConfiguration, SqlClientAutoConfiguration};
pub use client::{SqlClient, SqlObjectBinding};
pub use datasource::{DataSource, DataSourceProperties, PooledConnection};
pub use error::{SqlError, SqlResult};
pub use factory_bean::{repository_factory_bean, SqlRepositoryFactoryBean};
pub use repository_scan::RepositoryScan;

// 供宏使用
pub use inventory;
pub use proxybean_core;
pub use r2d2_postgres::postgres;
