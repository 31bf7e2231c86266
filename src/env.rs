//! 统一的环境变量管理系统
//!
//! 提供类型安全、可验证的环境变量访问，所有变量均以 `PAGE_TRANSLATOR_` 为前缀

use std::env;
use std::fmt;
use std::time::Duration;

/// 环境变量解析错误
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => {
                if let Some(default) = Self::DEFAULT {
                    Ok(default)
                } else {
                    Err(EnvError {
                        variable: Self::NAME.to_string(),
                        message: "Required environment variable not set".to_string(),
                    })
                }
            }
        }
    }

    /// 仅在变量被显式设置时返回值
    fn get_if_set() -> EnvResult<Option<T>> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value).map(Some),
            Err(_) => Ok(None),
        }
    }

    fn get_or_default(default: T) -> T {
        Self::get().unwrap_or(default)
    }
}

/// 核心环境变量定义
pub mod core {
    use super::*;

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "PAGE_TRANSLATOR_LOG_LEVEL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("info".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            match value.to_lowercase().as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => Ok(value.to_lowercase()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!(
                        "Invalid log level '{}'. Use: trace, debug, info, warn, error",
                        value
                    ),
                }),
            }
        }
    }

    /// 禁用颜色输出
    pub struct NoColor;
    impl EnvVar<bool> for NoColor {
        const NAME: &'static str = "NO_COLOR";
        const DEFAULT: Option<bool> = Some(false);
        const DESCRIPTION: &'static str = "Disable colored output when set to any value";

        fn parse(value: &str) -> EnvResult<bool> {
            // NO_COLOR 遵循标准：任何值都表示禁用颜色
            Ok(!value.is_empty())
        }
    }
}

/// 翻译相关环境变量
pub mod translation {
    use super::*;

    /// API URL
    pub struct ApiUrl;
    impl EnvVar<String> for ApiUrl {
        const NAME: &'static str = "PAGE_TRANSLATOR_API_URL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Batch translation API endpoint URL";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok(crate::translation::config::constants::DEFAULT_API_URL.to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            let url = value.trim();
            if url.starts_with("http://") || url.starts_with("https://") {
                Ok(url.to_string())
            } else {
                Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "API URL must start with http:// or https://".to_string(),
                })
            }
        }
    }

    /// 批次大小
    pub struct BatchSize;
    impl EnvVar<usize> for BatchSize {
        const NAME: &'static str = "PAGE_TRANSLATOR_BATCH_SIZE";
        const DEFAULT: Option<usize> = Some(40);
        const DESCRIPTION: &'static str = "Maximum number of text leaves per translation request";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 1, 1000)
        }
    }

    /// 最大并发请求数
    pub struct MaxConcurrentRequests;
    impl EnvVar<usize> for MaxConcurrentRequests {
        const NAME: &'static str = "PAGE_TRANSLATOR_MAX_CONCURRENT_REQUESTS";
        const DEFAULT: Option<usize> = Some(4);
        const DESCRIPTION: &'static str = "Maximum number of batch requests in flight";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 1, 100)
        }
    }

    /// 单批次请求超时
    pub struct RequestTimeout;
    impl EnvVar<Duration> for RequestTimeout {
        const NAME: &'static str = "PAGE_TRANSLATOR_REQUEST_TIMEOUT";
        const DEFAULT: Option<Duration> = Some(Duration::from_secs(30));
        const DESCRIPTION: &'static str = "Per-batch request deadline in seconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            let seconds: u64 = value.parse().map_err(|_| EnvError {
                variable: Self::NAME.to_string(),
                message: "Must be a valid number of seconds".to_string(),
            })?;

            if seconds == 0 {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Timeout must be greater than 0".to_string(),
                });
            }

            if seconds > 300 {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Timeout too long (max 300 seconds)".to_string(),
                });
            }

            Ok(Duration::from_secs(seconds))
        }
    }

    /// 跳过的元素标签
    pub struct SkipElements;
    impl EnvVar<Vec<String>> for SkipElements {
        const NAME: &'static str = "PAGE_TRANSLATOR_SKIP_ELEMENTS";
        const DEFAULT: Option<Vec<String>> = None;
        const DESCRIPTION: &'static str =
            "Comma-separated list of element tags whose subtrees are never translated";

        fn get() -> EnvResult<Vec<String>> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok(crate::translation::config::constants::SKIP_ELEMENTS
                    .iter()
                    .map(|s| s.to_string())
                    .collect()),
            }
        }

        fn parse(value: &str) -> EnvResult<Vec<String>> {
            let tags: Vec<String> = value
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect();

            if tags.is_empty() {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "At least one element tag is required".to_string(),
                });
            }

            Ok(tags)
        }
    }
}

fn parse_positive_usize(value: &str, var_name: &str, min: usize, max: usize) -> EnvResult<usize> {
    let num: usize = value.trim().parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid positive number".to_string(),
    })?;

    if num < min {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} is below minimum {}", num, min),
        });
    }

    if num > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} exceeds maximum {}", num, max),
        });
    }

    Ok(num)
}

/// 环境变量文档生成器
pub fn generate_env_docs() -> String {
    let mut docs = String::new();
    docs.push_str("# Environment Variables Documentation\n\n");

    docs.push_str("## Core Configuration\n\n");
    docs.push_str(&format!(
        "- `{}`: {} (default: \"info\")\n",
        core::LogLevel::NAME,
        core::LogLevel::DESCRIPTION
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        core::NoColor::NAME,
        core::NoColor::DESCRIPTION,
        core::NoColor::DEFAULT
    ));

    docs.push_str("\n## Translation Configuration\n\n");
    docs.push_str(&format!(
        "- `{}`: {} (default: \"{}\")\n",
        translation::ApiUrl::NAME,
        translation::ApiUrl::DESCRIPTION,
        crate::translation::config::constants::DEFAULT_API_URL
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        translation::BatchSize::NAME,
        translation::BatchSize::DESCRIPTION,
        translation::BatchSize::DEFAULT
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        translation::MaxConcurrentRequests::NAME,
        translation::MaxConcurrentRequests::DESCRIPTION,
        translation::MaxConcurrentRequests::DEFAULT
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        translation::RequestTimeout::NAME,
        translation::RequestTimeout::DESCRIPTION,
        translation::RequestTimeout::DEFAULT
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: \"{}\")\n",
        translation::SkipElements::NAME,
        translation::SkipElements::DESCRIPTION,
        crate::translation::config::constants::SKIP_ELEMENTS.join(",")
    ));

    docs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(core::LogLevel::parse("DEBUG").unwrap(), "debug");
        assert_eq!(core::LogLevel::parse("warn").unwrap(), "warn");
        assert!(core::LogLevel::parse("verbose").is_err());
    }

    #[test]
    fn test_url_validation() {
        assert!(translation::ApiUrl::parse("http://localhost:5000/api/translate").is_ok());
        assert!(translation::ApiUrl::parse("https://api.example.com").is_ok());

        assert!(translation::ApiUrl::parse("ftp://example.com").is_err());
        assert!(translation::ApiUrl::parse("not-a-url").is_err());
    }

    #[test]
    fn test_numeric_validation() {
        assert_eq!(translation::BatchSize::parse("30").unwrap(), 30);
        assert!(translation::BatchSize::parse("0").is_err());
        assert!(translation::BatchSize::parse("many").is_err());

        assert!(translation::MaxConcurrentRequests::parse("101").is_err());
        assert_eq!(
            translation::RequestTimeout::parse("15").unwrap(),
            Duration::from_secs(15)
        );
        assert!(translation::RequestTimeout::parse("0").is_err());
    }

    #[test]
    fn test_skip_elements_parsing() {
        let tags = translation::SkipElements::parse("SCRIPT, style,,pre").unwrap();
        assert_eq!(tags, vec!["script", "style", "pre"]);
        assert!(translation::SkipElements::parse(" , ").is_err());
    }

    #[test]
    fn test_env_docs_mention_every_variable() {
        let docs = generate_env_docs();
        for name in [
            core::LogLevel::NAME,
            translation::ApiUrl::NAME,
            translation::BatchSize::NAME,
            translation::MaxConcurrentRequests::NAME,
            translation::RequestTimeout::NAME,
            translation::SkipElements::NAME,
        ] {
            assert!(docs.contains(name), "missing {}", name);
        }
    }
}
