//! 翻译批次管理器模块
//!
//! 将收集到的文本叶子按文档顺序切分为固定大小的批次。批次内的顺序与
//! 翻译接口响应数组的顺序一一对应。

use crate::translation::pipeline::collector::TextLeaf;

/// 翻译批次
#[derive(Debug, Clone)]
pub struct Batch<N> {
    /// 批次标识符，从0开始按文档顺序递增
    pub id: usize,
    /// 包含的文本叶子
    pub leaves: Vec<TextLeaf<N>>,
    /// 预估字符总数
    pub estimated_chars: usize,
}

impl<N> Batch<N> {
    /// 请求体中发送的文本
    pub fn texts(&self) -> Vec<String> {
        self.leaves.iter().map(|leaf| leaf.text.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// 日志用的批次摘要
    pub fn summary(&self) -> String {
        format!(
            "批次 {}: {} 项, {} 字符",
            self.id,
            self.leaves.len(),
            self.estimated_chars
        )
    }
}

/// 批次统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub input_items: usize,
    pub output_batches: usize,
    pub total_chars: usize,
    pub largest_batch: usize,
}

/// 批次管理器
#[derive(Debug)]
pub struct BatchManager {
    batch_size: usize,
    stats: BatchStats,
}

impl BatchManager {
    /// 创建批次管理器，批次大小为0时按1处理
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            stats: BatchStats::default(),
        }
    }

    /// 创建批次
    ///
    /// 结果为 ceil(N/K) 个连续批次，除最后一个外均恰好包含K项。
    pub fn create_batches<N>(&mut self, leaves: Vec<TextLeaf<N>>) -> Vec<Batch<N>> {
        self.stats = BatchStats {
            input_items: leaves.len(),
            ..BatchStats::default()
        };

        let mut batches = Vec::with_capacity(leaves.len().div_ceil(self.batch_size));
        let mut current = Vec::with_capacity(self.batch_size);

        for leaf in leaves {
            current.push(leaf);
            if current.len() == self.batch_size {
                let full = std::mem::replace(&mut current, Vec::with_capacity(self.batch_size));
                batches.push(self.finish_batch(batches.len(), full));
            }
        }
        if !current.is_empty() {
            batches.push(self.finish_batch(batches.len(), current));
        }

        self.stats.output_batches = batches.len();
        tracing::debug!(
            "批次创建完成: {} 项 -> {} 个批次 (K={})",
            self.stats.input_items,
            self.stats.output_batches,
            self.batch_size
        );

        batches
    }

    fn finish_batch<N>(&mut self, id: usize, leaves: Vec<TextLeaf<N>>) -> Batch<N> {
        let estimated_chars = leaves.iter().map(|leaf| leaf.char_count()).sum();
        self.stats.total_chars += estimated_chars;
        self.stats.largest_batch = self.stats.largest_batch.max(leaves.len());
        Batch {
            id,
            leaves,
            estimated_chars,
        }
    }

    pub fn get_stats(&self) -> &BatchStats {
        &self.stats
    }
}

/// 便利函数：按批次大小K切分
pub fn split_into_batches<N>(leaves: Vec<TextLeaf<N>>, k: usize) -> Vec<Batch<N>> {
    BatchManager::new(k).create_batches(leaves)
}
