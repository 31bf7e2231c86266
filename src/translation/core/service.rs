//! 翻译服务核心实现
//!
//! 本模块提供流水线的统一入口：收集文本 → 切分批次 → 有界并发请求 → 写回DOM。
//!
//! ## 使用示例
//!
//! ```no_run
//! use page_translator::parsers::html_to_dom;
//! use page_translator::translation::{TranslationConfig, TranslationService};
//!
//! let dom = html_to_dom(b"<p>Hello</p>", "utf-8");
//! let service = TranslationService::new(TranslationConfig::default())?;
//! let stats = service.translate_dom_blocking(&dom)?;
//! println!("写回 {} 个文本", stats.leaves_applied);
//! # Ok::<(), page_translator::translation::TranslationError>(())
//! ```

use std::time::{Duration, Instant};

use markup5ever_rcdom::{Handle, RcDom};

use crate::parsers::html::get_body;
use crate::translation::config::TranslationConfig;
use crate::translation::core::client::{BatchTranslator, HttpTranslator};
use crate::translation::core::engine::{DecorationHook, NoopDecorationHook};
use crate::translation::error::{TranslationError, TranslationResult};
use crate::translation::pipeline::{BatchManager, CollectorConfig, TextCollector};
use crate::translation::processor::TranslationProcessor;
use crate::translation::tree::{DomTree, RcDomTree};

/// 单次运行的统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub leaves_located: usize,
    pub batches_created: usize,
    pub batches_succeeded: usize,
    pub batches_failed: usize,
    /// 写回的叶子数，包括内容未变化的
    pub leaves_applied: usize,
    pub leaves_unchanged: usize,
    pub fragments_inserted: usize,
    pub leaves_detached: usize,
    /// 打上文本标记的父元素数
    pub parents_marked: usize,
    pub elapsed: Duration,
}

/// 统一的翻译服务
///
/// 服务本身不持有文档，每次运行由调用方传入DOM能力与根节点。
/// 批次级别的失败只反映在 [`RunStats::batches_failed`] 中；
/// 只有配置无效或HTTP客户端无法创建时才返回错误。
///
/// 类型参数：
///
/// * `C` - 批量翻译客户端，默认为 [`HttpTranslator`]
/// * `H` - 每个批次写回后调用的装饰钩子，默认为空实现
pub struct TranslationService<C = HttpTranslator, H = NoopDecorationHook> {
    config: TranslationConfig,
    translator: C,
    hook: H,
}

impl TranslationService {
    /// 创建使用HTTP客户端的翻译服务
    ///
    /// # 错误
    ///
    /// 配置校验失败或HTTP客户端创建失败时返回 `ConfigError`。
    pub fn new(config: TranslationConfig) -> TranslationResult<Self> {
        config.validate()?;
        let translator = HttpTranslator::new(&config)?;
        Ok(Self {
            config,
            translator,
            hook: NoopDecorationHook,
        })
    }
}

impl<C: BatchTranslator> TranslationService<C, NoopDecorationHook> {
    /// 使用自定义翻译客户端创建服务
    pub fn with_translator(config: TranslationConfig, translator: C) -> TranslationResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            translator,
            hook: NoopDecorationHook,
        })
    }
}

impl<C: BatchTranslator, H: DecorationHook> TranslationService<C, H> {
    /// 替换装饰钩子
    pub fn with_hook<H2: DecorationHook>(self, hook: H2) -> TranslationService<C, H2> {
        TranslationService {
            config: self.config,
            translator: self.translator,
            hook,
        }
    }

    pub fn config(&self) -> &TranslationConfig {
        &self.config
    }

    pub fn translator(&self) -> &C {
        &self.translator
    }

    /// 翻译 `root` 下的所有可翻译文本
    pub async fn run<T: DomTree>(&self, tree: &T, root: &T::Node) -> TranslationResult<RunStats> {
        let start = Instant::now();
        let mut stats = RunStats::default();

        let mut collector = TextCollector::new(CollectorConfig::from(&self.config));
        let leaves = collector.collect_translatable_texts(tree, root);
        stats.leaves_located = leaves.len();

        if leaves.is_empty() {
            tracing::info!("没有找到需要翻译的文本");
            stats.elapsed = start.elapsed();
            return Ok(stats);
        }

        let batches = BatchManager::new(self.config.batch_size).create_batches(leaves);
        stats.batches_created = batches.len();
        tracing::info!(
            "开始翻译: {} 个文本, {} 个批次",
            stats.leaves_located,
            stats.batches_created
        );

        let mut processor = TranslationProcessor::new(
            tree,
            &self.translator,
            &self.hook,
            self.config.max_concurrent_requests,
        );
        let processed = processor.process_batches(batches).await;

        stats.batches_succeeded = processed.successful_batches;
        stats.batches_failed = processed.failed_batches;
        stats.leaves_applied = processed.outcome.applied;
        stats.leaves_unchanged = processed.outcome.unchanged;
        stats.fragments_inserted = processed.outcome.fragments;
        stats.leaves_detached = processed.outcome.detached;
        stats.parents_marked = processed.parents_marked;
        stats.elapsed = start.elapsed();

        tracing::info!(
            "翻译完成: 写回 {} 个文本, 失败批次 {}, 耗时 {:?}",
            stats.leaves_applied,
            stats.batches_failed,
            stats.elapsed
        );

        Ok(stats)
    }

    /// 同步包装，在当前线程上创建单线程运行时执行 [`Self::run`]
    ///
    /// 不能在已有的 tokio 运行时内调用。
    pub fn run_blocking<T: DomTree>(&self, tree: &T, root: &T::Node) -> TranslationResult<RunStats> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| TranslationError::IoError(format!("运行时创建失败: {}", e)))?;
        runtime.block_on(self.run(tree, root))
    }

    /// 翻译整个文档；有 `<body>` 时只处理 `<body>`
    pub async fn translate_dom(&self, dom: &RcDom) -> TranslationResult<RunStats> {
        let root = translation_root(dom);
        self.run(&RcDomTree, &root).await
    }

    pub fn translate_dom_blocking(&self, dom: &RcDom) -> TranslationResult<RunStats> {
        let root = translation_root(dom);
        self.run_blocking(&RcDomTree, &root)
    }
}

fn translation_root(dom: &RcDom) -> Handle {
    get_body(dom).unwrap_or_else(|| dom.document.clone())
}
