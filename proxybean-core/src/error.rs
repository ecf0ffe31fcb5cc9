//! 错误类型定义

use thiserror::Error;

/// 容器错误
#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("Bean not found: {0}")]
    BeanNotFound(String),

    #[error("Bean already exists: {0}")]
    BeanAlreadyExists(String),

    #[error("Bean creation failed: {0}")]
    BeanCreationFailed(String),

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),

    #[error("No scope registered for name '{0}'")]
    NoSuchScope(String),

    #[error("Scope '{0}' is not active for the current thread")]
    ScopeNotActive(String),

    #[error("Configuration is frozen: {0}")]
    ConfigurationFrozen(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// 扫描注册错误
///
/// `Configuration` 与 `Structural` 都是致命错误，会中止启动
#[derive(Error, Debug)]
pub enum ScanError {
    /// 扫描声明本身不合法（例如未指定 factory bean）
    #[error("Invalid scan configuration: {0}")]
    Configuration(String),

    /// 候选定义结构不一致（例如 scoped proxy 缺少被装饰的目标）
    #[error("Malformed bean definition: {0}")]
    Structural(String),

    #[error(transparent)]
    Container(#[from] ContainerError),
}

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// 应用错误
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInitFailed(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type ContainerResult<T> = std::result::Result<T, ContainerError>;
pub type ScanResult<T> = std::result::Result<T, ScanError>;
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
pub type ApplicationResult<T> = std::result::Result<T, ApplicationError>;

pub use anyhow::Result;
