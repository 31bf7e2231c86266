//! # Page Translator
//!
//! 在HTML文档中查找可见文本，按批次发送到外部翻译接口，并把译文写回原节点。
//!
//! ## 模块组织
//!
//! - `core` - 文档级处理（编码识别、翻译、序列化）
//! - `env` - 环境变量定义
//! - `parsers` - HTML解析与序列化
//! - `translation` - 翻译流水线

pub mod core;
pub mod env;
pub mod parsers;
pub mod translation;

// Re-export commonly used items for convenience
pub use self::core::{translate_document, DocumentOptions};
pub use parsers::{html_to_dom, serialize_document};
pub use translation::{run, run_blocking, RunStats, TranslationConfig, TranslationError};
