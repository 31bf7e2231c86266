//! 翻译管道模块
//!
//! 提供文本处理管道，包括收集和批次切分

pub mod batch;
pub mod collector;

// 重新导出主要类型
pub use batch::{split_into_batches, Batch, BatchManager, BatchStats};
pub use collector::{locate_text_leaves, CollectionStats, CollectorConfig, TextCollector, TextLeaf};
