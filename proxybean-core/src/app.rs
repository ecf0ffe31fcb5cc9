use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::config::{EnvironmentPropertySource, TomlPropertySource};
use crate::context::{ApplicationContext, ApplicationContextBuilder};
use crate::error::ApplicationResult;
use crate::logging::LoggingConfig;
use crate::plugin::AutoConfiguration;
use crate::scan::{BeanScan, ScanSite};

type Initializer = Box<dyn Fn(&Arc<ApplicationContext>) -> ApplicationResult<()> + Send + Sync>;

/// 应用启动器
///
/// 负责加载配置、初始化日志、构建并刷新 `ApplicationContext`
pub struct ProxyBeanApplication {
    name: String,

    config_files: Vec<String>,

    /// 环境变量前缀
    env_prefix: String,

    profiles: Vec<String>,

    show_banner: bool,

    /// 未设置时从配置与环境变量推导
    logging_config: Option<LoggingConfig>,

    bean_scans: Vec<(ScanSite, BeanScan)>,

    auto_configurations: Vec<Arc<dyn AutoConfiguration>>,

    /// 在 refresh 之前执行
    initializers: Vec<Initializer>,
}

impl ProxyBeanApplication {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config_files: vec!["application.toml".to_string()],
            env_prefix: "APP_".to_string(),
            profiles: Vec::new(),
            show_banner: true,
            logging_config: None,
            bean_scans: Vec::new(),
            auto_configurations: Vec::new(),
            initializers: Vec::new(),
        }
    }

    pub fn config_file(mut self, path: impl Into<String>) -> Self {
        self.config_files = vec![path.into()];
        self
    }

    pub fn config_files(mut self, paths: Vec<String>) -> Self {
        self.config_files = paths;
        self
    }

    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn profiles(mut self, profiles: Vec<String>) -> Self {
        self.profiles = profiles;
        self
    }

    pub fn banner(mut self, show: bool) -> Self {
        self.show_banner = show;
        self
    }

    pub fn logging(mut self, config: LoggingConfig) -> Self {
        self.logging_config = Some(config);
        self
    }

    /// 以编程方式声明扫描
    pub fn bean_scan(mut self, site: ScanSite, scan: BeanScan) -> Self {
        self.bean_scans.push((site, scan));
        self
    }

    pub fn auto_configuration(mut self, configuration: Arc<dyn AutoConfiguration>) -> Self {
        self.auto_configurations.push(configuration);
        self
    }

    pub fn initializer<F>(mut self, f: F) -> Self
    where
        F: Fn(&Arc<ApplicationContext>) -> ApplicationResult<()> + Send + Sync + 'static,
    {
        self.initializers.push(Box::new(f));
        self
    }

    /// 运行应用
    pub async fn run(self) -> ApplicationResult<Arc<ApplicationContext>> {
        let start_time = Instant::now();

        // 优先级：代码设置 > 环境变量 {prefix}PROFILES_ACTIVE
        let active_profiles = if self.profiles.is_empty() {
            std::env::var(format!("{}PROFILES_ACTIVE", self.env_prefix))
                .map(|profiles| {
                    profiles
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default()
        } else {
            self.profiles.clone()
        };

        let mut builder = ApplicationContext::builder();
        let loaded = self.load_configurations(&mut builder, &active_profiles)?;
        builder = builder
            .add_property_source(Box::new(EnvironmentPropertySource::new(&self.env_prefix)))
            .active_profiles(active_profiles.clone());

        for (site, scan) in &self.bean_scans {
            builder = builder.bean_scan(site.clone(), scan.clone());
        }
        for configuration in &self.auto_configurations {
            builder = builder.auto_configuration(configuration.clone());
        }

        let context = builder.build();

        let logging_config = self
            .logging_config
            .clone()
            .unwrap_or_else(|| LoggingConfig::from_environment(context.environment()));
        logging_config.init()?;

        if self.show_banner {
            self.print_banner();
        }

        tracing::info!("Starting {} application", self.name);
        for file in &loaded {
            tracing::info!("Loaded configuration from: {}", file);
        }
        if active_profiles.is_empty() {
            tracing::info!("No active profiles set, using default configuration");
        } else {
            tracing::info!("Active profiles: {:?}", active_profiles);
        }

        for initializer in &self.initializers {
            initializer(&context)?;
        }

        context.refresh()?;
        context.start().await?;

        tracing::info!(
            "Started {} in {}ms",
            self.name,
            start_time.elapsed().as_millis()
        );
        Ok(context)
    }

    /// 加载配置文件，返回实际加载的文件
    ///
    /// 加载顺序（优先级从低到高）：
    /// 1. application.toml
    /// 2. application-{profile}.toml
    fn load_configurations(
        &self,
        builder: &mut ApplicationContextBuilder,
        active_profiles: &[String],
    ) -> ApplicationResult<Vec<String>> {
        let mut loaded = Vec::new();

        for base_config in &self.config_files {
            if self.try_load_config_file(builder, base_config, 0)? {
                loaded.push(base_config.clone());
            }
        }

        for (index, profile) in active_profiles.iter().enumerate() {
            for base_config in &self.config_files {
                let profile_config = profile_config_path(base_config, profile);
                if self.try_load_config_file(builder, &profile_config, 10 + index as i32)? {
                    loaded.push(profile_config);
                }
            }
        }

        Ok(loaded)
    }

    /// 文件不存在时跳过，存在但无法解析时报错
    fn try_load_config_file(
        &self,
        builder: &mut ApplicationContextBuilder,
        config_file: &str,
        priority: i32,
    ) -> ApplicationResult<bool> {
        if !Path::new(config_file).exists() {
            return Ok(false);
        }
        let source = TomlPropertySource::from_file(config_file)?.with_priority(priority);
        builder.add_property_source_mut(Box::new(source));
        Ok(true)
    }

    fn print_banner(&self) {
        println!();
        println!(r"  ___                   ___               ");
        println!(r" | _ \_ _ _____ ___  _| _ ) ___ __ _ _ _  ");
        println!(r" |  _/ '_/ _ \ \ / || | _ \/ -_) _` | ' \ ");
        println!(r" |_| |_| \___/_\_\\_, |___/\___\__,_|_||_|");
        println!(r"                  |__/                    ");
        println!();
        println!("  :: ProxyBean ::        (v{})", env!("CARGO_PKG_VERSION"));
        println!();
    }
}

impl Default for ProxyBeanApplication {
    fn default() -> Self {
        Self::new("ProxyBeanApplication")
    }
}

/// application.toml -> application-dev.toml
fn profile_config_path(base_path: &str, profile: &str) -> String {
    match base_path.rfind('.') {
        Some(dot_pos) => {
            let (name, ext) = base_path.split_at(dot_pos);
            format!("{}-{}{}", name, profile, ext)
        }
        None => format!("{}-{}", base_path, profile),
    }
}
