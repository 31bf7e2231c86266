//! 翻译系统核心模块
//!
//! - **客户端** (`client.rs`): 批量翻译接口的请求与响应
//! - **引擎** (`engine.rs`): 把翻译结果写回DOM
//! - **服务** (`service.rs`): 串联收集、切分、调度与写回的流水线入口
//!
//! ```text
//! TranslationService (service.rs)
//!     ├── TextCollector (pipeline/collector.rs)
//!     ├── BatchManager (pipeline/batch.rs)
//!     └── TranslationProcessor (processor.rs)
//!             ├── BatchTranslator (client.rs)
//!             ├── apply_batch_deferred (engine.rs)
//!             └── PendingMarks::commit (engine.rs)
//! ```

pub mod client;
pub mod engine;
pub mod service;

pub use client::{BatchTranslator, HttpTranslator, TranslationItem};
pub use engine::{
    apply_batch, apply_batch_deferred, ApplyOutcome, DecorationHook, LoggingDecorationHook,
    NoopDecorationHook, PendingMarks,
};
pub use service::{RunStats, TranslationService};
