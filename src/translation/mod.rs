//! 翻译模块
//!
//! 在DOM中查找可翻译文本，分批发送到外部翻译接口，并把结果写回原节点：
//! - **tree**: 流水线使用的DOM能力抽象
//! - **pipeline**: 文本收集与批次切分
//! - **processor**: 有界并发调度
//! - **core**: 翻译客户端、DOM写回与服务入口
//! - **trigger**: 宿主触发消息
//! - **config** / **error**: 配置与错误处理
//!
//! # 基本用法
//!
//! ```rust,no_run
//! use page_translator::parsers::html_to_dom;
//! use page_translator::translation::{run, RcDomTree, TranslationConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let dom = html_to_dom(b"<p>Hello</p>", "utf-8");
//! let stats = run(&RcDomTree, &dom.document, TranslationConfig::default()).await?;
//! println!("写回 {} 个文本", stats.leaves_applied);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod pipeline;
pub mod processor;
pub mod tree;
pub mod trigger;

pub use config::{ConfigManager, TranslationConfig};
pub use self::core::{
    apply_batch, apply_batch_deferred, ApplyOutcome, BatchTranslator, DecorationHook,
    HttpTranslator, LoggingDecorationHook, NoopDecorationHook, PendingMarks, RunStats,
    TranslationItem, TranslationService,
};
pub use error::{TranslationError, TranslationResult};
pub use pipeline::{locate_text_leaves, split_into_batches, Batch, TextLeaf};
pub use processor::run_bounded;
pub use tree::{DomTree, NodeKind, RcDomTree, TranslatedMark};
pub use trigger::{handle_trigger, parse_trigger, TriggerMessage, TriggerReply};

/// 使用HTTP客户端翻译 `root` 下的文本
pub async fn run<T: DomTree>(
    tree: &T,
    root: &T::Node,
    config: TranslationConfig,
) -> TranslationResult<RunStats> {
    TranslationService::new(config)?.run(tree, root).await
}

/// [`run`] 的同步版本
pub fn run_blocking<T: DomTree>(
    tree: &T,
    root: &T::Node,
    config: TranslationConfig,
) -> TranslationResult<RunStats> {
    TranslationService::new(config)?.run_blocking(tree, root)
}
