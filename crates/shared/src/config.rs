//! 配置管理模块
//!
//! 支持多格式配置文件加载，环境变量覆盖，以及类型安全的配置访问。

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::observability::ObservabilityConfig;

/// 数据库配置
///
/// 连接地址不在此处配置，而是来自服务账号凭证文件
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// 服务账号凭证文件路径（JSON），缺失时服务无法启动
    pub credentials_path: PathBuf,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
    /// 启动时是否执行内置迁移
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            credentials_path: PathBuf::from("config/service-account.json"),
            max_connections: 10,
            min_connections: 2,
            connect_timeout_seconds: 30,
            idle_timeout_seconds: 600,
            run_migrations: false,
        }
    }
}

/// 服务配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 允许的跨域来源，逗号分隔；"*" 表示全部
    pub cors_origins: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: "http://localhost:3000,http://localhost:5173".to_string(),
        }
    }
}

/// 积分发放策略配置
///
/// 对应积分计算规则表中的三档奖励
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PointsConfig {
    /// 首次参加某类活动
    pub new_category_points: i32,
    /// 参加过该类别的其他活动
    pub same_category_points: i32,
    /// 重复参加同一活动
    pub repeat_event_points: i32,
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self {
            new_category_points: 15,
            same_category_points: 10,
            repeat_event_points: 5,
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub service_name: String,
    pub environment: String,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub observability: ObservabilityConfig,
    pub points: PointsConfig,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序（后加载的会覆盖先加载的同名配置项）：
    /// 1. .env 文件（如存在）
    /// 2. config/default.toml（默认配置）
    /// 3. config/{environment}.toml（环境特定配置）
    /// 4. config/{service_name}.toml（服务特定配置）
    /// 5. 环境变量（CAMPUS_ 前缀，双下划线分隔层级，如 CAMPUS_SERVER__PORT -> server.port）
    pub fn load(service_name: &str) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let env = std::env::var("CAMPUS_ENV").unwrap_or_else(|_| "development".to_string());
        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

        Self::load_from(Path::new(&config_dir), service_name, &env)
    }

    /// 从指定目录加载配置
    pub fn load_from(config_dir: &Path, service_name: &str, env: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("service_name", service_name)?
            .set_default("environment", env)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", env))).required(false))
            .add_source(
                File::from(config_dir.join(format!("{}.toml", service_name))).required(false),
            )
            .add_source(
                Environment::with_prefix("CAMPUS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// 获取服务地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.points.new_category_points, 15);
        assert!(!config.database.run_migrations);
    }

    #[test]
    fn test_server_addr() {
        let config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(config.server_addr(), "127.0.0.1:3000");
    }

    #[test]
    fn test_load_from_layers_files() {
        let dir = tempfile::tempdir().unwrap();

        let mut default = std::fs::File::create(dir.path().join("default.toml")).unwrap();
        writeln!(
            default,
            "[server]\nport = 9000\n\n[points]\nnew_category_points = 20"
        )
        .unwrap();

        let mut staging = std::fs::File::create(dir.path().join("staging.toml")).unwrap();
        writeln!(staging, "[server]\nport = 9100").unwrap();

        let config = AppConfig::load_from(dir.path(), "campus-gamification-service", "staging")
            .unwrap();

        assert_eq!(config.service_name, "campus-gamification-service");
        assert_eq!(config.environment, "staging");
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.points.new_category_points, 20);
        // 未覆盖的字段保留默认值
        assert_eq!(config.points.repeat_event_points, 5);
        assert!(!config.is_production());
    }

    #[test]
    fn test_load_from_empty_dir_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(dir.path(), "svc", "production").unwrap();

        assert!(config.is_production());
        assert_eq!(
            config.database.credentials_path,
            PathBuf::from("config/service-account.json")
        );
    }
}
