//! 翻译处理器模块
//!
//! 以有界并发调度批次：同一时刻最多 `limit` 个请求在途，任一完成后才放入下一个。
//! 所有任务都在调用方的任务上轮询，不派生新任务，DOM写回不会在挂起点之间交错。

use std::cell::RefCell;
use std::future::Future;
use std::time::{Duration, Instant};

use futures::stream::{FuturesUnordered, StreamExt};

use crate::translation::core::client::BatchTranslator;
use crate::translation::core::engine::{
    apply_batch_deferred, ApplyOutcome, DecorationHook, PendingMarks,
};
use crate::translation::error::{helpers::log_error, TranslationResult};
use crate::translation::pipeline::batch::Batch;
use crate::translation::tree::DomTree;

/// 有界并发执行任务
///
/// 按输入顺序放入任务，保持最多 `limit` 个未完成，返回时所有任务均已结束。
/// 结果按完成顺序排列；`limit` 为0时按1处理。
pub async fn run_bounded<I, F>(tasks: I, limit: usize) -> Vec<F::Output>
where
    I: IntoIterator<Item = F>,
    F: Future,
{
    let limit = limit.max(1);
    let mut in_flight = FuturesUnordered::new();
    let mut outputs = Vec::new();

    for task in tasks {
        if in_flight.len() >= limit {
            if let Some(output) = in_flight.next().await {
                outputs.push(output);
            }
        }
        in_flight.push(task);
    }

    while let Some(output) = in_flight.next().await {
        outputs.push(output);
    }

    outputs
}

/// 处理器统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessorStats {
    pub total_batches: usize,
    pub successful_batches: usize,
    pub failed_batches: usize,
    pub outcome: ApplyOutcome,
    /// 打上文本标记的父元素数
    pub parents_marked: usize,
    pub elapsed: Duration,
}

impl ProcessorStats {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn success_rate(&self) -> f32 {
        if self.total_batches == 0 {
            1.0
        } else {
            self.successful_batches as f32 / self.total_batches as f32
        }
    }
}

/// 翻译处理器
///
/// 把每个批次映射为“请求 → 写回”任务并交给 [`run_bounded`] 调度。
pub struct TranslationProcessor<'a, T, C, H: ?Sized> {
    tree: &'a T,
    translator: &'a C,
    hook: &'a H,
    max_concurrent_requests: usize,
    stats: ProcessorStats,
}

impl<'a, T, C, H> TranslationProcessor<'a, T, C, H>
where
    T: DomTree,
    C: BatchTranslator,
    H: DecorationHook + ?Sized,
{
    pub fn new(tree: &'a T, translator: &'a C, hook: &'a H, max_concurrent_requests: usize) -> Self {
        Self {
            tree,
            translator,
            hook,
            max_concurrent_requests,
            stats: ProcessorStats::default(),
        }
    }

    /// 处理批次列表
    ///
    /// 批次级错误只记录并计数，不会中断其他批次。
    /// 父元素的文本标记在全部批次结束后统一提交。
    pub async fn process_batches(&mut self, batches: Vec<Batch<T::Node>>) -> &ProcessorStats {
        self.stats.reset();
        self.stats.total_batches = batches.len();

        if batches.is_empty() {
            tracing::info!("没有批次需要处理");
            return &self.stats;
        }

        tracing::info!(
            "开始处理 {} 个翻译批次 (最大并发 {})",
            batches.len(),
            self.max_concurrent_requests
        );
        let start = Instant::now();

        let tree = self.tree;
        let translator = self.translator;
        let hook = self.hook;
        let marks = RefCell::new(PendingMarks::new());
        let marks_ref = &marks;
        let tasks = batches
            .into_iter()
            .map(|batch| Self::process_single_batch(tree, translator, hook, marks_ref, batch));

        for (batch_id, result) in run_bounded(tasks, self.max_concurrent_requests).await {
            match result {
                Ok(outcome) => {
                    self.stats.successful_batches += 1;
                    self.stats.outcome.merge(&outcome);
                }
                Err(error) => {
                    self.stats.failed_batches += 1;
                    log_error(&error.with_context(format!("批次 {}", batch_id)));
                }
            }
        }

        self.stats.parents_marked = marks.into_inner().commit(tree);
        self.stats.elapsed = start.elapsed();
        tracing::info!(
            "批次处理完成: 成功 {}, 失败 {} (成功率 {:.0}%), 标记 {} 个元素, 耗时 {:?}",
            self.stats.successful_batches,
            self.stats.failed_batches,
            self.stats.success_rate() * 100.0,
            self.stats.parents_marked,
            self.stats.elapsed
        );

        &self.stats
    }

    async fn process_single_batch(
        tree: &T,
        translator: &C,
        hook: &H,
        marks: &RefCell<PendingMarks<T::Node>>,
        batch: Batch<T::Node>,
    ) -> (usize, TranslationResult<ApplyOutcome>) {
        tracing::debug!("处理{}", batch.summary());
        let texts = batch.texts();
        let result = match translator.translate_batch(&texts).await {
            // 写回是同步的，借用不会跨越挂起点
            Ok(items) => apply_batch_deferred(tree, &batch, items, hook, &mut marks.borrow_mut()),
            Err(error) => Err(error),
        };
        (batch.id, result)
    }

    pub fn get_stats(&self) -> &ProcessorStats {
        &self.stats
    }
}
