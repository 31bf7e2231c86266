//! 翻译配置管理模块
//!
//! 配置来源（优先级从低到高）：默认值 → TOML配置文件 → `.env` 与 `PAGE_TRANSLATOR_*`
//! 环境变量 → 调用方（例如命令行参数）的显式覆盖。

use std::path::Path;
use std::time::Duration;

use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::env::{translation as env_vars, EnvVar};
use crate::translation::error::{helpers::config_error, TranslationError, TranslationResult};

/// 翻译配置常量
pub mod constants {
    pub const DEFAULT_API_URL: &str = "http://localhost:5000/api/translate";
    pub const DEFAULT_BATCH_SIZE: usize = 40;
    pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 4;
    pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
    pub const DEFAULT_USER_AGENT: &str = "page-translator/0.1";

    /// 已翻译标记属性
    pub const TRANSLATED_MARK_ATTR: &str = "data-translated";
    /// 整个子树已翻译
    pub const TRANSLATED_MARK_VALUE: &str = "true";
    /// 仅直接文本子节点已翻译
    pub const TRANSLATED_TEXT_MARK_VALUE: &str = "text";

    pub const SKIP_ELEMENTS: &[&str] = &[
        "script", "style", "noscript", "textarea", "code", "pre", "iframe", "canvas",
    ];

    pub const CONFIG_PATHS: &[&str] = &[
        "page-translator.toml",
        ".page-translator.toml",
        "~/.config/page-translator/config.toml",
        "/etc/page-translator/config.toml",
    ];

    pub const ENV_FILES: &[&str] = &[".env.local", ".env"];
}

/// 翻译流水线配置
///
/// 作为显式参数传入流水线入口，不存在全局可变配置。
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// 批量翻译接口地址
    pub api_url: String,

    /// 每个批次的最大文本叶子数
    pub batch_size: usize,

    /// 同时在途的最大批次请求数
    pub max_concurrent_requests: usize,

    /// 单批次请求超时
    #[serde(with = "duration_serde")]
    pub request_timeout: Duration,

    /// 不进入遍历的元素标签
    pub skip_elements: Vec<String>,

    /// 请求使用的 User-Agent
    pub user_agent: String,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            api_url: constants::DEFAULT_API_URL.to_string(),
            batch_size: constants::DEFAULT_BATCH_SIZE,
            max_concurrent_requests: constants::DEFAULT_MAX_CONCURRENT_REQUESTS,
            request_timeout: Duration::from_secs(constants::DEFAULT_REQUEST_TIMEOUT_SECS),
            skip_elements: constants::SKIP_ELEMENTS.iter().map(|s| s.to_string()).collect(),
            user_agent: constants::DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl TranslationConfig {
    /// 使用指定接口地址创建默认配置
    pub fn with_api_url(api_url: &str) -> Self {
        Self {
            api_url: api_url.to_string(),
            ..Self::default()
        }
    }

    /// 从TOML字符串解析配置，缺省字段使用默认值
    pub fn from_toml_str(content: &str) -> TranslationResult<Self> {
        let config: TranslationConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// 序列化为TOML
    pub fn to_toml_string(&self) -> TranslationResult<String> {
        toml::to_string_pretty(self).map_err(|e| config_error(format!("TOML序列化失败: {}", e)))
    }

    /// 验证配置
    pub fn validate(&self) -> TranslationResult<()> {
        let url = Url::parse(&self.api_url)
            .map_err(|e| config_error(format!("接口地址无效 '{}': {}", self.api_url, e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(config_error(format!(
                "接口地址必须使用 http 或 https: {}",
                self.api_url
            )));
        }

        if self.batch_size == 0 {
            return Err(config_error("批次大小不能为0"));
        }

        if self.max_concurrent_requests == 0 {
            return Err(config_error("最大并发请求数不能为0"));
        }

        if self.request_timeout.is_zero() {
            return Err(config_error("请求超时不能为0"));
        }

        Ok(())
    }
}

/// Duration的序列化/反序列化模块（以秒为单位）
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

/// 配置管理器
pub struct ConfigManager;

impl ConfigManager {
    /// 加载翻译配置
    ///
    /// 指定 `explicit_path` 时该文件必须存在；否则按 `CONFIG_PATHS` 查找第一个存在的文件。
    /// 返回合并后尚未校验的配置以及实际使用的配置文件路径，
    /// 调用方应用完自己的覆盖后再调用 [`TranslationConfig::validate`]。
    pub fn load(explicit_path: Option<&Path>) -> TranslationResult<(TranslationConfig, Option<String>)> {
        Self::load_dotenv();

        let mut builder = Config::builder().add_source(
            Config::try_from(&TranslationConfig::default())
                .map_err(|e| config_error(format!("默认配置错误: {}", e)))?,
        );

        let mut config_path = None;
        match explicit_path {
            Some(path) => {
                let path_str = path.to_string_lossy().to_string();
                if !path.exists() {
                    return Err(config_error(format!("配置文件不存在: {}", path_str)));
                }
                builder = builder.add_source(File::new(&path_str, FileFormat::Toml).required(true));
                config_path = Some(path_str);
            }
            None => {
                for path in constants::CONFIG_PATHS {
                    let expanded_path = shellexpand::tilde(path);
                    if Path::new(expanded_path.as_ref()).exists() {
                        builder = builder.add_source(File::new(&expanded_path, FileFormat::Toml));
                        config_path = Some(expanded_path.to_string());
                        break;
                    }
                }
            }
        }

        if let Some(ref path) = config_path {
            tracing::info!("加载配置文件: {}", path);
        }

        let mut config: TranslationConfig = builder.build()?.try_deserialize()?;

        // 不在此处校验：调用方还可能应用更高优先级的覆盖
        Self::apply_env_overrides(&mut config)?;

        tracing::debug!(
            "加载的配置 - API URL: {}, 批次大小: {}, 并发: {}",
            config.api_url,
            config.batch_size,
            config.max_concurrent_requests
        );

        Ok((config, config_path))
    }

    /// 应用环境变量覆盖
    pub fn apply_env_overrides(config: &mut TranslationConfig) -> TranslationResult<()> {
        let to_error = |e: crate::env::EnvError| TranslationError::ConfigError(e.to_string());

        if let Some(url) = env_vars::ApiUrl::get_if_set().map_err(to_error)? {
            tracing::info!("环境变量覆盖 API URL: {}", url);
            config.api_url = url;
        }
        if let Some(size) = env_vars::BatchSize::get_if_set().map_err(to_error)? {
            config.batch_size = size;
        }
        if let Some(limit) = env_vars::MaxConcurrentRequests::get_if_set().map_err(to_error)? {
            config.max_concurrent_requests = limit;
        }
        if let Some(timeout) = env_vars::RequestTimeout::get_if_set().map_err(to_error)? {
            config.request_timeout = timeout;
        }
        if let Some(tags) = env_vars::SkipElements::get_if_set().map_err(to_error)? {
            config.skip_elements = tags;
        }

        Ok(())
    }

    /// 加载 .env 文件（找到第一个即停止）
    fn load_dotenv() {
        for env_file in constants::ENV_FILES {
            if Path::new(env_file).exists() {
                match dotenv::from_filename(env_file) {
                    Ok(_) => {
                        tracing::info!("已加载环境变量文件: {}", env_file);
                        break;
                    }
                    Err(e) => {
                        tracing::warn!("无法加载环境变量文件 {}: {}", env_file, e);
                    }
                }
            }
        }
    }
}
