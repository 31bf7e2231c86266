//! DOM能力抽象
//!
//! 翻译流水线只通过 [`DomTree`] 访问文档：遍历、读取文本、替换节点、打标记。
//! 文档本身由调用方持有，流水线只拿到根节点句柄。

use std::rc::Rc;

use markup5ever_rcdom::{Handle, NodeData};

use crate::parsers::html::{
    child_index, get_node_attr, get_node_name, get_parent_node, is_attached_to_document,
    parse_fragment_nodes, set_node_attr,
};
use crate::translation::config::constants;
use crate::translation::error::{helpers::dom_error, TranslationResult};

/// 节点类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// 元素节点，携带小写标签名
    Element(String),
    /// 文本节点
    Text,
    /// 文档、注释、doctype 等
    Other,
}

/// 已翻译标记
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslatedMark {
    /// 整个子树已翻译，收集时不再进入（插入的HTML片段）
    Subtree,
    /// 直接文本子节点已翻译，子元素仍会被遍历
    Text,
}

/// 流水线所需的DOM能力集合
pub trait DomTree {
    type Node: Clone;

    fn kind(&self, node: &Self::Node) -> NodeKind;

    /// 按文档顺序返回子节点
    fn children(&self, node: &Self::Node) -> Vec<Self::Node>;

    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    /// 两个句柄是否指向同一节点
    fn same_node(&self, a: &Self::Node, b: &Self::Node) -> bool;

    /// 文本节点的当前值，非文本节点返回 `None`
    fn text(&self, node: &Self::Node) -> Option<String>;

    /// 原地修改文本节点的值，保持节点身份不变
    fn set_text(&self, node: &Self::Node, value: &str) -> TranslationResult<()>;

    fn mark_of(&self, node: &Self::Node) -> Option<TranslatedMark>;

    /// 打上已翻译标记；不支持标记的节点类型忽略
    fn mark(&self, node: &Self::Node, mark: TranslatedMark);

    /// 节点是否仍在文档中
    fn is_attached(&self, node: &Self::Node) -> bool;

    /// 将节点替换为解析后的HTML片段，返回插入的顶层节点
    fn replace_with_html(&self, node: &Self::Node, html: &str) -> TranslationResult<Vec<Self::Node>>;
}

/// 基于 `markup5ever_rcdom` 的实现
///
/// 标记保存在元素的 `data-translated` 属性上（`true` 为子树，`text` 为文本），
/// 会随文档一起序列化。
#[derive(Debug, Clone, Copy, Default)]
pub struct RcDomTree;

impl DomTree for RcDomTree {
    type Node = Handle;

    fn kind(&self, node: &Handle) -> NodeKind {
        match &node.data {
            NodeData::Element { .. } => NodeKind::Element(
                get_node_name(node)
                    .map(|name| name.to_ascii_lowercase())
                    .unwrap_or_default(),
            ),
            NodeData::Text { .. } => NodeKind::Text,
            _ => NodeKind::Other,
        }
    }

    fn children(&self, node: &Handle) -> Vec<Handle> {
        node.children.borrow().clone()
    }

    fn parent(&self, node: &Handle) -> Option<Handle> {
        get_parent_node(node)
    }

    fn same_node(&self, a: &Handle, b: &Handle) -> bool {
        Rc::ptr_eq(a, b)
    }

    fn text(&self, node: &Handle) -> Option<String> {
        match &node.data {
            NodeData::Text { contents } => Some(contents.borrow().to_string()),
            _ => None,
        }
    }

    fn set_text(&self, node: &Handle, value: &str) -> TranslationResult<()> {
        match &node.data {
            NodeData::Text { contents } => {
                let mut content_ref = contents.borrow_mut();
                content_ref.clear();
                content_ref.push_slice(value);
                Ok(())
            }
            _ => Err(dom_error("节点不是文本类型")),
        }
    }

    fn mark_of(&self, node: &Handle) -> Option<TranslatedMark> {
        match get_node_attr(node, constants::TRANSLATED_MARK_ATTR)?.as_str() {
            constants::TRANSLATED_MARK_VALUE => Some(TranslatedMark::Subtree),
            constants::TRANSLATED_TEXT_MARK_VALUE => Some(TranslatedMark::Text),
            _ => None,
        }
    }

    fn mark(&self, node: &Handle, mark: TranslatedMark) {
        // 已是子树标记的元素不降级
        if mark == TranslatedMark::Text && self.mark_of(node) == Some(TranslatedMark::Subtree) {
            return;
        }
        let value = match mark {
            TranslatedMark::Subtree => constants::TRANSLATED_MARK_VALUE,
            TranslatedMark::Text => constants::TRANSLATED_TEXT_MARK_VALUE,
        };
        set_node_attr(node, constants::TRANSLATED_MARK_ATTR, Some(value.to_string()));
    }

    fn is_attached(&self, node: &Handle) -> bool {
        is_attached_to_document(node)
    }

    fn replace_with_html(&self, node: &Handle, html: &str) -> TranslationResult<Vec<Handle>> {
        let parent = get_parent_node(node).ok_or_else(|| dom_error("节点没有父节点"))?;
        let position =
            child_index(&parent, node).ok_or_else(|| dom_error("节点已不在父节点的子列表中"))?;

        let new_nodes = parse_fragment_nodes(html);
        for new_node in &new_nodes {
            new_node.parent.set(Some(Rc::downgrade(&parent)));
            if let NodeData::Element { .. } = new_node.data {
                self.mark(new_node, TranslatedMark::Subtree);
            }
        }

        parent
            .children
            .borrow_mut()
            .splice(position..=position, new_nodes.iter().cloned());
        node.parent.set(None);

        Ok(new_nodes)
    }
}
