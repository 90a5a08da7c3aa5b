use crate::models::Operation;
use thiserror::Error;

/// 应用程序错误类型
///
/// 三类失败（输入校验、HTTP/传输、响应体中的失败标记）对用户的呈现方式相同：
/// 一条弹窗式提示 + 原始错误信息，见 [`AppError::alert_message`]
#[derive(Debug, Error)]
pub enum AppError {
    /// 输入校验错误（不会发出任何请求）
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// API 调用错误
    #[error(transparent)]
    Api(#[from] ApiError),
    /// 文件操作错误
    #[error(transparent)]
    File(#[from] FileError),
    /// 配置错误
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// 输入校验错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// 例题为空
    #[error("例題を入力してください")]
    EmptyProblemText,
    /// 尚未解析例题
    #[error("まず例題を解析してください")]
    MissingAnalysis,
}

/// API 调用错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP 客户端初始化失败
    #[error("HTTP 客户端初始化失败: {0}")]
    ClientInit(#[source] reqwest::Error),
    /// 网络请求失败
    #[error("API请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// HTTP 状态码非 2xx
    #[error("{message} (HTTP {status})")]
    BadStatus {
        endpoint: String,
        status: u16,
        message: String,
    },
    /// 响应体中 success 为假
    #[error("{message}")]
    Rejected { endpoint: String, message: String },
    /// JSON 解析失败
    #[error("JSON解析失败 ({endpoint}): {source}")]
    JsonParseFailed {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// 配置错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// API 基础路径不合法
    #[error("API 基础路径不合法: '{0}' (需要 http:// 或 https:// 开头)")]
    InvalidBaseUrl(String),
    /// 并发数必须大于 0
    #[error("最大并发数必须大于 0")]
    ZeroConcurrency,
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建API请求失败错误
    pub fn request_failed(operation: Operation, source: reqwest::Error) -> Self {
        AppError::Api(ApiError::RequestFailed {
            endpoint: operation.endpoint().to_string(),
            source,
        })
    }

    /// 创建HTTP状态码错误
    pub fn bad_status(operation: Operation, status: u16) -> Self {
        AppError::Api(ApiError::BadStatus {
            endpoint: operation.endpoint().to_string(),
            status,
            message: operation.failure_message().to_string(),
        })
    }

    /// 创建响应体拒绝错误
    pub fn rejected(operation: Operation, message: impl Into<String>) -> Self {
        AppError::Api(ApiError::Rejected {
            endpoint: operation.endpoint().to_string(),
            message: message.into(),
        })
    }

    /// 创建JSON解析错误
    pub fn json_parse_failed(operation: Operation, source: serde_json::Error) -> Self {
        AppError::Api(ApiError::JsonParseFailed {
            endpoint: operation.endpoint().to_string(),
            source,
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }

    /// 是否为输入校验错误
    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation(_))
    }

    /// 生成面向用户的提示文字
    ///
    /// 校验错误只显示自身信息，其余错误加上操作对应的前缀
    pub fn alert_message(&self, operation: Operation) -> String {
        match self {
            AppError::Validation(e) => e.to_string(),
            other => format!("{}: {}", operation.alert_prefix(), other),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
