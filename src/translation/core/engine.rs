//! DOM更新引擎
//!
//! 把一个批次的翻译结果按位置写回原文本节点：
//! 纯文本原地修改节点值，HTML片段解析后替换节点。
//! 插入的片段元素带子树标记；父元素只有在全部非空白文本子节点都写回后
//! 才打上文本标记，失败批次中的兄弟文本在下次运行时仍可被收集。

use crate::translation::core::client::TranslationItem;
use crate::translation::error::{helpers::log_error, TranslationError, TranslationResult};
use crate::translation::pipeline::batch::Batch;
use crate::translation::tree::{DomTree, TranslatedMark};

/// 单个批次的写回结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// 写回的叶子数（包括内容未变化的）
    pub applied: usize,
    /// 翻译结果与原文相同的叶子数
    pub unchanged: usize,
    /// 以HTML片段替换的叶子数
    pub fragments: usize,
    /// 已脱离文档而跳过的叶子数
    pub detached: usize,
    /// 写回失败的叶子数
    pub failed: usize,
}

impl ApplyOutcome {
    pub fn merge(&mut self, other: &ApplyOutcome) {
        self.applied += other.applied;
        self.unchanged += other.unchanged;
        self.fragments += other.fragments;
        self.detached += other.detached;
        self.failed += other.failed;
    }
}

/// 批次写回后的装饰刷新钩子（例如重新初始化提示框）
pub trait DecorationHook {
    fn refresh(&self, batch_id: usize, outcome: &ApplyOutcome);
}

/// 默认钩子，不做任何事
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDecorationHook;

impl DecorationHook for NoopDecorationHook {
    fn refresh(&self, _batch_id: usize, _outcome: &ApplyOutcome) {}
}

/// 记录日志的钩子
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingDecorationHook;

impl DecorationHook for LoggingDecorationHook {
    fn refresh(&self, batch_id: usize, outcome: &ApplyOutcome) {
        tracing::info!(
            "批次 {} 装饰刷新: 写回 {} 项, 片段 {} 项",
            batch_id,
            outcome.applied,
            outcome.fragments
        );
    }
}

/// 一次运行中已写回的直接文本子节点数，按父元素分组
///
/// 所有批次结束后由 [`PendingMarks::commit`] 决定哪些父元素可以打上文本标记。
#[derive(Debug)]
pub struct PendingMarks<N> {
    groups: Vec<(N, usize)>,
}

impl<N> Default for PendingMarks<N> {
    fn default() -> Self {
        Self { groups: Vec::new() }
    }
}

impl<N: Clone> PendingMarks<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    fn record<T: DomTree<Node = N>>(&mut self, tree: &T, parent: &N, texts: usize) {
        // 叶子按文档顺序到达，同一父元素多半在末尾
        match self
            .groups
            .iter_mut()
            .rev()
            .find(|(node, _)| tree.same_node(node, parent))
        {
            Some((_, done)) => *done += texts,
            None => self.groups.push((parent.clone(), texts)),
        }
    }

    /// 给全部非空白文本子节点都已写回的父元素打上文本标记，返回标记的元素数
    pub fn commit<T: DomTree<Node = N>>(self, tree: &T) -> usize {
        let mut marked = 0;
        for (parent, done) in self.groups {
            let texts = count_text_children(tree, &parent);
            if done >= texts {
                tree.mark(&parent, TranslatedMark::Text);
                marked += 1;
            } else {
                tracing::debug!("父元素还有 {} 个文本未写回，暂不标记", texts - done);
            }
        }
        marked
    }
}

fn is_text_leaf<T: DomTree>(tree: &T, node: &T::Node) -> bool {
    tree.text(node).is_some_and(|text| !text.trim().is_empty())
}

fn count_text_children<T: DomTree>(tree: &T, parent: &T::Node) -> usize {
    tree.children(parent)
        .iter()
        .filter(|child| is_text_leaf(tree, child))
        .count()
}

/// 将翻译结果写回DOM，并立即标记本批次完成的父元素
///
/// 结果数量与批次不一致时整个批次不做任何修改。
/// 单个叶子的写回失败只记录日志，不影响同批次其余叶子。
pub fn apply_batch<T, H>(
    tree: &T,
    batch: &Batch<T::Node>,
    items: Vec<TranslationItem>,
    hook: &H,
) -> TranslationResult<ApplyOutcome>
where
    T: DomTree,
    H: DecorationHook + ?Sized,
{
    let mut marks = PendingMarks::new();
    let outcome = apply_batch_deferred(tree, batch, items, hook, &mut marks)?;
    marks.commit(tree);
    Ok(outcome)
}

/// 同 [`apply_batch`]，但父元素的文本标记留到 `marks` 提交时再打
///
/// 多个批次共享同一个 `marks`，跨批次的兄弟文本全部写回后父元素才会被标记。
pub fn apply_batch_deferred<T, H>(
    tree: &T,
    batch: &Batch<T::Node>,
    items: Vec<TranslationItem>,
    hook: &H,
    marks: &mut PendingMarks<T::Node>,
) -> TranslationResult<ApplyOutcome>
where
    T: DomTree,
    H: DecorationHook + ?Sized,
{
    if items.len() != batch.leaves.len() {
        return Err(TranslationError::ResponseMismatch {
            expected: batch.leaves.len(),
            actual: items.len(),
        });
    }

    let mut outcome = ApplyOutcome::default();

    for (leaf, item) in batch.leaves.iter().zip(items) {
        if !tree.is_attached(&leaf.node) {
            tracing::debug!("批次 {} 跳过已分离的文本 #{}", batch.id, leaf.index);
            outcome.detached += 1;
            continue;
        }

        // 替换前取父节点，HTML替换后原节点会脱离文档
        let parent = tree.parent(&leaf.node);

        // 成功时返回留在父元素下的已翻译文本节点数
        let result = match item {
            TranslationItem::Plain(content) => {
                if content == leaf.text {
                    outcome.unchanged += 1;
                    Ok(1)
                } else {
                    tree.set_text(&leaf.node, &content).map(|_| 1)
                }
            }
            TranslationItem::HtmlFragment(content) => {
                tree.replace_with_html(&leaf.node, &content).map(|inserted| {
                    outcome.fragments += 1;
                    inserted.iter().filter(|node| is_text_leaf(tree, node)).count()
                })
            }
        };

        match result {
            Ok(texts) => {
                outcome.applied += 1;
                if let Some(parent) = &parent {
                    marks.record(tree, parent, texts);
                }
            }
            Err(error) => {
                outcome.failed += 1;
                log_error(&error.with_context(format!("批次 {} 文本 #{}", batch.id, leaf.index)));
            }
        }
    }

    tracing::debug!(
        "{} 写回完成: 写回 {}, 未变化 {}, 片段 {}, 分离 {}, 失败 {}",
        batch.summary(),
        outcome.applied,
        outcome.unchanged,
        outcome.fragments,
        outcome.detached,
        outcome.failed
    );

    hook.refresh(batch.id, &outcome);
    Ok(outcome)
}
