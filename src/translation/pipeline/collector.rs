//! 文本收集器模块
//!
//! 深度优先遍历DOM子树，按文档顺序收集可翻译的文本叶子节点。
//! 收集过程不修改DOM，也不访问网络；重新运行即可拾取新出现的文本。

use crate::translation::config::{constants, TranslationConfig};
use crate::translation::tree::{DomTree, NodeKind, TranslatedMark};

/// 待翻译的文本叶子
#[derive(Debug, Clone)]
pub struct TextLeaf<N> {
    /// DOM文本节点句柄
    pub node: N,
    /// 收集时的原始文本（未裁剪）
    pub text: String,
    /// 文档顺序中的位置
    pub index: usize,
}

impl<N> TextLeaf<N> {
    /// 获取文本字符数
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// 收集器配置
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 不进入遍历的元素（小写）
    pub skip_elements: Vec<String>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            skip_elements: constants::SKIP_ELEMENTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl CollectorConfig {
    /// 标签是否在排除集合中（不区分大小写）
    pub fn is_skipped(&self, tag_name: &str) -> bool {
        self.skip_elements
            .iter()
            .any(|skip| skip.eq_ignore_ascii_case(tag_name))
    }
}

impl From<&TranslationConfig> for CollectorConfig {
    fn from(config: &TranslationConfig) -> Self {
        Self {
            skip_elements: config
                .skip_elements
                .iter()
                .map(|tag| tag.to_ascii_lowercase())
                .collect(),
        }
    }
}

/// 收集统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionStats {
    pub nodes_visited: usize,
    pub elements_skipped: usize,
    pub marked_skipped: usize,
    pub whitespace_dropped: usize,
    pub leaves_collected: usize,
}

impl CollectionStats {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 文本收集器
pub struct TextCollector {
    config: CollectorConfig,
    stats: CollectionStats,
}

impl TextCollector {
    pub fn new(config: CollectorConfig) -> Self {
        Self {
            config,
            stats: CollectionStats::default(),
        }
    }

    /// 收集可翻译的文本叶子
    ///
    /// 使用显式栈遍历，深层嵌套的文档不会耗尽调用栈。
    pub fn collect_translatable_texts<T: DomTree>(
        &mut self,
        tree: &T,
        root: &T::Node,
    ) -> Vec<TextLeaf<T::Node>> {
        self.stats.reset();
        let mut leaves = Vec::new();
        let mut stack = vec![root.clone()];

        while let Some(node) = stack.pop() {
            self.stats.nodes_visited += 1;

            match tree.kind(&node) {
                NodeKind::Element(tag) => {
                    if self.config.is_skipped(&tag) {
                        self.stats.elements_skipped += 1;
                        continue;
                    }
                    // 文本标记只挡住直接文本子节点，子元素照常遍历
                    if tree.mark_of(&node) == Some(TranslatedMark::Subtree) {
                        self.stats.marked_skipped += 1;
                        continue;
                    }
                }
                NodeKind::Text => {
                    if let Some(leaf) = self.accept_text(tree, node, leaves.len()) {
                        leaves.push(leaf);
                    }
                    continue;
                }
                NodeKind::Other => {}
            }

            // 逆序压栈以保持文档顺序
            stack.extend(tree.children(&node).into_iter().rev());
        }

        self.stats.leaves_collected = leaves.len();
        tracing::debug!(
            "文本收集完成: 访问 {} 个节点, 收集 {} 个文本, 跳过 {} 个排除元素, {} 个已翻译子树, {} 个空白文本",
            self.stats.nodes_visited,
            self.stats.leaves_collected,
            self.stats.elements_skipped,
            self.stats.marked_skipped,
            self.stats.whitespace_dropped
        );

        leaves
    }

    fn accept_text<T: DomTree>(
        &mut self,
        tree: &T,
        node: T::Node,
        index: usize,
    ) -> Option<TextLeaf<T::Node>> {
        let text = tree.text(&node)?;
        if text.trim().is_empty() {
            self.stats.whitespace_dropped += 1;
            return None;
        }
        if tree
            .parent(&node)
            .is_some_and(|parent| tree.mark_of(&parent).is_some())
        {
            self.stats.marked_skipped += 1;
            return None;
        }
        Some(TextLeaf { node, text, index })
    }

    pub fn get_stats(&self) -> &CollectionStats {
        &self.stats
    }
}

impl Default for TextCollector {
    fn default() -> Self {
        Self::new(CollectorConfig::default())
    }
}

/// 便利函数：按配置收集文本叶子
pub fn locate_text_leaves<T: DomTree>(
    tree: &T,
    root: &T::Node,
    config: &TranslationConfig,
) -> Vec<TextLeaf<T::Node>> {
    TextCollector::new(CollectorConfig::from(config)).collect_translatable_texts(tree, root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::{get_body, html_to_dom};
    use crate::translation::tree::RcDomTree;

    fn texts_of(html: &str, config: &TranslationConfig) -> Vec<String> {
        let dom = html_to_dom(html.as_bytes(), "utf-8");
        locate_text_leaves(&RcDomTree, &dom.document, config)
            .into_iter()
            .map(|leaf| leaf.text)
            .collect()
    }

    #[test]
    fn test_collects_in_document_order() {
        let texts = texts_of(
            "<div><p>Hello</p><ul><li>One</li><li>Two</li></ul><p>World</p></div>",
            &TranslationConfig::default(),
        );
        assert_eq!(texts, vec!["Hello", "One", "Two", "World"]);
    }

    #[test]
    fn test_excluded_elements_are_not_traversed() {
        let texts = texts_of(
            "<p>Visible</p><script>var a = 1;</script><STYLE>p{}</STYLE>\
             <pre><span>code</span></pre><textarea>input</textarea><noscript>ns</noscript>",
            &TranslationConfig::default(),
        );
        assert_eq!(texts, vec!["Visible"]);
    }

    #[test]
    fn test_custom_exclusion_set() {
        let mut config = TranslationConfig::default();
        config.skip_elements = vec!["NAV".to_string()];
        let texts = texts_of("<nav>Menu</nav><code>x()</code>", &config);
        assert_eq!(texts, vec!["x()"]);
    }

    #[test]
    fn test_whitespace_text_is_dropped_but_raw_text_kept() {
        let dom = html_to_dom(b"<p>  Hello  </p><p>\n\t </p>", "utf-8");
        let mut collector = TextCollector::default();
        let leaves = collector.collect_translatable_texts(&RcDomTree, &dom.document);

        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].text, "  Hello  ");
        assert_eq!(leaves[0].index, 0);
        assert_eq!(collector.get_stats().whitespace_dropped, 1);
    }

    #[test]
    fn test_marked_subtrees_are_skipped() {
        let texts = texts_of(
            "<p data-translated=\"true\">Done</p>\
             <div data-translated=\"true\"><span>Inner</span></div>\
             <p data-translated=\"false\">Todo</p>",
            &TranslationConfig::default(),
        );
        assert_eq!(texts, vec!["Todo"]);
    }

    #[test]
    fn test_text_mark_only_hides_direct_text() {
        let texts = texts_of(
            "<div data-translated=\"text\">Done<span>Inner</span>Also done\
             <p data-translated=\"true\">Hidden</p></div>",
            &TranslationConfig::default(),
        );
        assert_eq!(texts, vec!["Inner"]);
    }

    #[test]
    fn test_exclusion_matching_ignores_case() {
        let config = CollectorConfig::default();
        assert!(config.is_skipped("SCRIPT"));
        assert!(config.is_skipped("noscript"));
        assert!(!config.is_skipped("p"));
    }

    #[test]
    fn test_root_can_be_a_subtree() {
        let dom = html_to_dom(b"<p>Outside</p><div><p>Inside</p></div>", "utf-8");
        let body = get_body(&dom).unwrap();
        let div = RcDomTree.children(&body).remove(1);
        let leaves = locate_text_leaves(&RcDomTree, &div, &TranslationConfig::default());
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].text, "Inside");
    }

    #[test]
    fn test_deep_nesting_does_not_overflow() {
        let depth = 2_000;
        let html = format!("{}deep{}", "<span>".repeat(depth), "</span>".repeat(depth));
        let texts = texts_of(&html, &TranslationConfig::default());
        assert_eq!(texts, vec!["deep"]);
    }
}
