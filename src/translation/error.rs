//! 翻译模块统一错误处理
//!
//! 提供结构化错误类型和错误处理机制。批次级别的错误只会被记录，
//! 不会中断同一次运行中的其他批次。

use std::fmt;

use thiserror::Error;

/// 翻译错误类型
#[derive(Error, Debug, Clone)]
pub enum TranslationError {
    /// 翻译接口返回了非成功状态码
    #[error("传输错误: HTTP {status}: {message}")]
    TransportError { status: u16, message: String },

    /// 响应数组缺失或长度与请求不一致
    #[error("响应不匹配: 期望 {expected} 项, 实际 {actual} 项")]
    ResponseMismatch { expected: usize, actual: usize },

    /// 片段解析或节点替换失败
    #[error("DOM更新错误: {0}")]
    DomApplyError(String),

    /// 网络错误
    #[error("网络错误: {0}")]
    NetworkError(String),

    /// 超时错误
    #[error("操作超时: {0}")]
    TimeoutError(String),

    /// 解析错误
    #[error("解析错误: {0}")]
    ParseError(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// 触发消息无效
    #[error("无效的触发消息: {0}")]
    InvalidTrigger(String),

    /// 文件读写错误
    #[error("IO错误: {0}")]
    IoError(String),
}

impl TranslationError {
    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TranslationError::TransportError { status, .. } if *status < 500 => {
                ErrorSeverity::Error
            }
            TranslationError::TransportError { .. } => ErrorSeverity::Warning,
            TranslationError::ResponseMismatch { .. } => ErrorSeverity::Error,
            TranslationError::DomApplyError(_) => ErrorSeverity::Warning,
            TranslationError::NetworkError(_) => ErrorSeverity::Warning,
            TranslationError::TimeoutError(_) => ErrorSeverity::Warning,
            TranslationError::ParseError(_) => ErrorSeverity::Error,
            TranslationError::ConfigError(_) => ErrorSeverity::Critical,
            TranslationError::InvalidTrigger(_) => ErrorSeverity::Info,
            TranslationError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    /// 获取错误类别
    pub fn category(&self) -> ErrorCategory {
        match self {
            TranslationError::TransportError { .. } => ErrorCategory::Transport,
            TranslationError::ResponseMismatch { .. } => ErrorCategory::Response,
            TranslationError::DomApplyError(_) => ErrorCategory::Dom,
            TranslationError::NetworkError(_) => ErrorCategory::Network,
            TranslationError::TimeoutError(_) => ErrorCategory::Timeout,
            TranslationError::ParseError(_) => ErrorCategory::Parsing,
            TranslationError::ConfigError(_) => ErrorCategory::Configuration,
            TranslationError::InvalidTrigger(_) => ErrorCategory::Input,
            TranslationError::IoError(_) => ErrorCategory::Io,
        }
    }

    /// 创建带上下文的错误
    pub fn with_context<T: fmt::Display>(self, context: T) -> Self {
        match self {
            TranslationError::TransportError { status, message } => {
                TranslationError::TransportError {
                    status,
                    message: format!("{} (上下文: {})", message, context),
                }
            }
            TranslationError::ResponseMismatch { .. } => self,
            TranslationError::DomApplyError(msg) => {
                TranslationError::DomApplyError(format!("{} (上下文: {})", msg, context))
            }
            TranslationError::NetworkError(msg) => {
                TranslationError::NetworkError(format!("{} (上下文: {})", msg, context))
            }
            TranslationError::TimeoutError(msg) => {
                TranslationError::TimeoutError(format!("{} (上下文: {})", msg, context))
            }
            TranslationError::ParseError(msg) => {
                TranslationError::ParseError(format!("{} (上下文: {})", msg, context))
            }
            TranslationError::ConfigError(msg) => {
                TranslationError::ConfigError(format!("{} (上下文: {})", msg, context))
            }
            TranslationError::InvalidTrigger(msg) => {
                TranslationError::InvalidTrigger(format!("{} (上下文: {})", msg, context))
            }
            TranslationError::IoError(msg) => {
                TranslationError::IoError(format!("{} (上下文: {})", msg, context))
            }
        }
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Transport,
    Response,
    Dom,
    Network,
    Timeout,
    Parsing,
    Configuration,
    Input,
    Io,
}

impl From<reqwest::Error> for TranslationError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            TranslationError::TimeoutError(error.to_string())
        } else if let Some(status) = error.status() {
            TranslationError::TransportError {
                status: status.as_u16(),
                message: error.to_string(),
            }
        } else if error.is_decode() {
            TranslationError::ParseError(format!("响应体解码失败: {}", error))
        } else {
            TranslationError::NetworkError(error.to_string())
        }
    }
}

impl From<std::io::Error> for TranslationError {
    fn from(error: std::io::Error) -> Self {
        TranslationError::IoError(error.to_string())
    }
}

impl From<serde_json::Error> for TranslationError {
    fn from(error: serde_json::Error) -> Self {
        TranslationError::ParseError(format!("JSON解析错误: {}", error))
    }
}

impl From<toml::de::Error> for TranslationError {
    fn from(error: toml::de::Error) -> Self {
        TranslationError::ConfigError(format!("TOML解析错误: {}", error))
    }
}

impl From<config::ConfigError> for TranslationError {
    fn from(error: config::ConfigError) -> Self {
        TranslationError::ConfigError(error.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for TranslationError {
    fn from(error: tokio::time::error::Elapsed) -> Self {
        TranslationError::TimeoutError(format!("批次请求超时: {}", error))
    }
}

/// 错误结果类型别名
pub type TranslationResult<T> = Result<T, TranslationError>;

/// 错误处理助手函数
pub mod helpers {
    use super::*;

    /// 按严重程度记录错误
    pub fn log_error(error: &TranslationError) {
        match error.severity() {
            ErrorSeverity::Info => tracing::info!("翻译信息: {}", error),
            ErrorSeverity::Warning => tracing::warn!("翻译警告: {}", error),
            ErrorSeverity::Error => tracing::error!("翻译错误: {}", error),
            ErrorSeverity::Critical => tracing::error!("翻译严重错误: {}", error),
        }
    }

    /// 创建配置错误
    pub fn config_error<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::ConfigError(msg.to_string())
    }

    /// 创建DOM更新错误
    pub fn dom_error<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::DomApplyError(msg.to_string())
    }
}
