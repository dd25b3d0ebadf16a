use crate::orders::EngineOptions;
use shared::order::ItemCondition;
use std::path::PathBuf;

/// 服务器配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./work_dir | 工作目录 (数据库、日志) |
/// | DB_FILE | fulfillment.redb | 数据库文件 (相对 WORK_DIR) |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_JSON | false | JSON 日志格式 |
/// | ENVIRONMENT | development | 运行环境 |
/// | ALLOW_REPEATED_RETURN_PROCESSING | false | 允许重复处理退货 (重复入库) |
/// | DEFAULT_RETURN_CONDITION_GOOD | true | 缺少对账数据时按完好处理 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/fulfillment HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录
    pub work_dir: String,
    /// 数据库文件名，相对路径基于 work_dir
    pub db_file: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    pub log_level: String,
    pub log_json: bool,
    /// 运行环境: development | staging | production
    pub environment: String,
    pub allow_repeated_return_processing: bool,
    pub default_return_condition_good: bool,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置或无法解析，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./work_dir".into()),
            db_file: std::env::var("DB_FILE").unwrap_or_else(|_| "fulfillment.redb".into()),
            http_port: env_or("HTTP_PORT", 3000),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: env_or("LOG_JSON", false),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            allow_repeated_return_processing: env_or("ALLOW_REPEATED_RETURN_PROCESSING", false),
            default_return_condition_good: env_or("DEFAULT_RETURN_CONDITION_GOOD", true),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// 数据库路径 (绝对路径的 DB_FILE 原样使用)
    pub fn db_path(&self) -> PathBuf {
        let db_file = PathBuf::from(&self.db_file);
        if db_file.is_absolute() {
            db_file
        } else {
            PathBuf::from(&self.work_dir).join(db_file)
        }
    }

    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// Engine switches derived from the configuration
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            allow_repeated_return_processing: self.allow_repeated_return_processing,
            default_return_condition: if self.default_return_condition_good {
                ItemCondition::Good
            } else {
                ItemCondition::Damaged
            },
        }
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
