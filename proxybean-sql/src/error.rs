//! SQL 模块错误类型

use proxybean_core::{ApplicationError, ConfigError, ContainerError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SqlError {
    #[error("Invalid datasource url: {0}")]
    InvalidUrl(String),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Database error: {0}")]
    Database(#[from] r2d2_postgres::postgres::Error),

    /// 没有为该接口登记 sql object 实现
    #[error("No sql object installed for '{0}'")]
    UnknownSqlObject(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SqlResult<T> = std::result::Result<T, SqlError>;

impl From<SqlError> for ContainerError {
    fn from(error: SqlError) -> Self {
        ContainerError::BeanCreationFailed(error.to_string())
    }
}

impl From<SqlError> for ApplicationError {
    fn from(error: SqlError) -> Self {
        match error {
            SqlError::Config(e) => ApplicationError::Config(e),
            other => ApplicationError::Other(anyhow::Error::new(other)),
        }
    }
}
