use crate::error::{AppResult, ConfigError, FileError};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// 程序配置文件
///
/// 优先级：默认值 < TOML 文件 < 环境变量
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// 外部服务的 API 基础路径
    pub api_base_url: String,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 下载文件的保存目录
    pub output_dir: String,
    /// 批量任务 TOML 文件存放目录
    pub jobs_folder: String,
    /// 同时处理的任务数量
    pub max_concurrent_jobs: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 批量处理日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000/api".to_string(),
            request_timeout_secs: 120,
            output_dir: "output".to_string(),
            jobs_folder: "jobs".to_string(),
            max_concurrent_jobs: 4,
            verbose_logging: false,
            output_log_file: "batch_log.txt".to_string(),
        }
    }
}

impl Config {
    /// 只从环境变量加载（未设置的项使用默认值）
    pub fn from_env() -> AppResult<Self> {
        Ok(Self::default()
            .with_env_overrides(|name| std::env::var(name).ok())?
            .validated()?)
    }

    /// 加载配置：可选的 TOML 文件 + 环境变量覆盖
    pub fn load(config_file: Option<&Path>) -> AppResult<Self> {
        let base = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(base
            .with_env_overrides(|name| std::env::var(name).ok())?
            .validated()?)
    }

    /// 从 TOML 文件读取配置，缺失的字段使用默认值
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| FileError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        let config: Config = toml::from_str(&content).map_err(|source| FileError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })?;
        Ok(config)
    }

    /// 用环境变量覆盖已有配置
    ///
    /// `lookup` 按变量名返回取值，便于测试时注入
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("API_BASE_URL") {
            self.api_base_url = v;
        }
        if let Some(v) = lookup("REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_var("REQUEST_TIMEOUT_SECS", &v, "u64")?;
        }
        if let Some(v) = lookup("OUTPUT_DIR") {
            self.output_dir = v;
        }
        if let Some(v) = lookup("JOBS_FOLDER") {
            self.jobs_folder = v;
        }
        if let Some(v) = lookup("MAX_CONCURRENT_JOBS") {
            self.max_concurrent_jobs = parse_var("MAX_CONCURRENT_JOBS", &v, "usize")?;
        }
        if let Some(v) = lookup("VERBOSE_LOGGING") {
            self.verbose_logging = parse_var("VERBOSE_LOGGING", &v, "bool")?;
        }
        if let Some(v) = lookup("OUTPUT_LOG_FILE") {
            self.output_log_file = v;
        }
        Ok(self)
    }

    /// 校验并规范化（去掉基础路径末尾的 `/`）
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        let trimmed = self.api_base_url.trim().trim_end_matches('/').to_string();
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(self.api_base_url));
        }
        if self.max_concurrent_jobs == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        self.api_base_url = trimmed;
        Ok(self)
    }

    /// 请求超时
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_var<T: std::str::FromStr>(
    var_name: &str,
    value: &str,
    expected_type: &str,
) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value: value.to_string(),
            expected_type: expected_type.to_string(),
        })
}
