use std::rc::Rc;

use encoding_rs::Encoding;
use html5ever::interface::{Attribute, QualName};
use html5ever::tendril::{format_tendril, TendrilSink};
use html5ever::{namespace_url, ns, parse_document, parse_fragment, LocalName};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// 将 HTML 字节转换为 DOM
///
/// 无法识别的编码标签按 UTF-8 宽松解码。
pub fn html_to_dom(data: &[u8], document_encoding: &str) -> RcDom {
    let s: String = match Encoding::for_label(document_encoding.as_bytes()) {
        Some(encoding) => encoding.decode(data).0.into_owned(),
        None => String::from_utf8_lossy(data).into_owned(),
    };

    parse_document(RcDom::default(), Default::default()).one(s)
}

/// 以 `<body>` 为上下文解析 HTML 片段，返回顶层节点（已与临时文档断开）
pub fn parse_fragment_nodes(html: &str) -> Vec<Handle> {
    let dom = parse_fragment(
        RcDom::default(),
        Default::default(),
        QualName::new(None, ns!(html), LocalName::from("body")),
        vec![],
    )
    .one(html);

    // 片段解析器会把结果挂在一个合成的 <html> 元素下
    let root = dom.document.children.borrow().first().cloned();
    match root {
        Some(root) => {
            let nodes: Vec<Handle> = root.children.borrow_mut().drain(..).collect();
            for node in &nodes {
                node.parent.set(None);
            }
            nodes
        }
        None => Vec::new(),
    }
}

/// 查找指定路径的DOM节点
pub fn find_nodes(node: &Handle, node_names: &[&str]) -> Vec<Handle> {
    let mut found_nodes = Vec::new();

    let Some((node_name, rest)) = node_names.split_first() else {
        return found_nodes;
    };

    let matches = get_node_name(node).is_some_and(|name| name == *node_name);

    if matches && rest.is_empty() {
        found_nodes.push(node.clone());
    }

    let next_names = if matches && !rest.is_empty() { rest } else { node_names };
    for child_node in node.children.borrow().iter() {
        found_nodes.append(&mut find_nodes(child_node, next_names));
    }

    found_nodes
}

/// 根据名称获取子节点
pub fn get_child_node_by_name(parent: &Handle, node_name: &str) -> Option<Handle> {
    let children = parent.children.borrow();
    children
        .iter()
        .find(|child| get_node_name(child) == Some(node_name))
        .cloned()
}

/// 获取文档的 `<body>` 节点
pub fn get_body(dom: &RcDom) -> Option<Handle> {
    let html = get_child_node_by_name(&dom.document, "html")?;
    get_child_node_by_name(&html, "body")
}

/// 获取节点属性值
pub fn get_node_attr(node: &Handle, attr_name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|attr| &*attr.name.local == attr_name)
            .map(|attr| attr.value.to_string()),
        _ => None,
    }
}

/// 获取节点名称
pub fn get_node_name(node: &Handle) -> Option<&'_ str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

/// 获取父节点
///
/// `parent` 是 `Cell<Option<Weak>>`，读取后需要放回原值。
pub fn get_parent_node(child: &Handle) -> Option<Handle> {
    let weak = child.parent.take();
    let parent = weak.as_ref().and_then(|node| node.upgrade());
    child.parent.set(weak);
    parent
}

/// 节点在父节点子列表中的位置
pub fn child_index(parent: &Handle, child: &Handle) -> Option<usize> {
    parent
        .children
        .borrow()
        .iter()
        .position(|node| Rc::ptr_eq(node, child))
}

/// 检查节点是否仍挂在某个文档下
pub fn is_attached_to_document(node: &Handle) -> bool {
    let mut current = node.clone();
    loop {
        if let NodeData::Document = current.data {
            return true;
        }
        let Some(parent) = get_parent_node(&current) else {
            return false;
        };
        if child_index(&parent, &current).is_none() {
            return false;
        }
        current = parent;
    }
}

/// 设置节点属性
pub fn set_node_attr(node: &Handle, attr_name: &str, attr_value: Option<String>) {
    if let NodeData::Element { attrs, .. } = &node.data {
        let attrs_mut = &mut attrs.borrow_mut();
        let mut i = 0;
        let mut found_existing_attr: bool = false;

        while i < attrs_mut.len() {
            if &attrs_mut[i].name.local == attr_name {
                found_existing_attr = true;

                if let Some(attr_value) = attr_value.clone() {
                    attrs_mut[i].value.clear();
                    attrs_mut[i].value.push_slice(attr_value.as_str());
                } else {
                    // Remove attr completely if attr_value is not defined
                    attrs_mut.remove(i);
                    continue;
                }
            }

            i += 1;
        }

        if !found_existing_attr {
            if let Some(attr_value) = attr_value {
                attrs_mut.push(Attribute {
                    name: QualName::new(None, ns!(), LocalName::from(attr_name)),
                    value: format_tendril!("{}", attr_value),
                });
            }
        }
    };
}

/// 读取 `<meta charset>` 或 `http-equiv="content-type"` 声明的编码
pub fn get_charset(node: &Handle) -> Option<String> {
    for meta_node in find_nodes(node, &["html", "head", "meta"]).iter() {
        if let Some(charset) = get_node_attr(meta_node, "charset") {
            return Some(charset.trim().to_string());
        }

        if get_node_attr(meta_node, "http-equiv")
            .unwrap_or_default()
            .eq_ignore_ascii_case("content-type")
        {
            if let Some(content) = get_node_attr(meta_node, "content") {
                let charset = content.split(';').find_map(|part| {
                    let (key, value) = part.trim().split_once('=')?;
                    key.trim()
                        .eq_ignore_ascii_case("charset")
                        .then(|| value.trim().trim_matches('"').to_string())
                });
                if charset.is_some() {
                    return charset;
                }
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(node: &Handle) -> Option<String> {
        match &node.data {
            NodeData::Text { contents } => Some(contents.borrow().to_string()),
            _ => None,
        }
    }

    #[test]
    fn fragment_nodes_are_detached_from_scratch_document() {
        let nodes = parse_fragment_nodes("<b>Xin</b> chào <i>bạn</i>");
        assert_eq!(nodes.len(), 3);
        assert_eq!(get_node_name(&nodes[0]), Some("b"));
        assert_eq!(text_of(&nodes[1]).as_deref(), Some(" chào "));
        assert_eq!(get_node_name(&nodes[2]), Some("i"));
        assert!(nodes.iter().all(|node| get_parent_node(node).is_none()));
    }

    #[test]
    fn parent_lookup_does_not_consume_link() {
        let dom = html_to_dom(b"<html><body><p>Hello</p></body></html>", "utf-8");
        let body = get_body(&dom).unwrap();
        let p = get_child_node_by_name(&body, "p").unwrap();

        let first = get_parent_node(&p).unwrap();
        let second = get_parent_node(&p).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert!(is_attached_to_document(&p));
    }

    #[test]
    fn detached_nodes_are_reported() {
        let dom = html_to_dom(b"<html><body><p>Hello</p></body></html>", "utf-8");
        let body = get_body(&dom).unwrap();
        let p = get_child_node_by_name(&body, "p").unwrap();

        body.children.borrow_mut().clear();
        assert!(!is_attached_to_document(&p));
    }

    #[test]
    fn attributes_are_added_updated_and_removed() {
        let dom = html_to_dom(b"<p class=\"a\">x</p>", "utf-8");
        let p = find_nodes(&dom.document, &["html", "body", "p"])
            .pop()
            .unwrap();

        set_node_attr(&p, "data-translated", Some("true".to_string()));
        assert_eq!(get_node_attr(&p, "data-translated").as_deref(), Some("true"));

        set_node_attr(&p, "class", Some("b".to_string()));
        assert_eq!(get_node_attr(&p, "class").as_deref(), Some("b"));

        set_node_attr(&p, "class", None);
        assert_eq!(get_node_attr(&p, "class"), None);
    }

    #[test]
    fn charset_is_read_from_meta_tags() {
        let dom = html_to_dom(
            b"<html><head><meta charset=\"windows-1252\"></head><body></body></html>",
            "utf-8",
        );
        assert_eq!(get_charset(&dom.document).as_deref(), Some("windows-1252"));

        let dom = html_to_dom(
            b"<html><head><meta http-equiv=\"Content-Type\" content=\"text/html; charset=ISO-8859-1\"></head></html>",
            "utf-8",
        );
        assert_eq!(get_charset(&dom.document).as_deref(), Some("ISO-8859-1"));
    }

    #[test]
    fn legacy_encodings_are_decoded() {
        // "café" in windows-1252
        let dom = html_to_dom(b"<p>caf\xe9</p>", "windows-1252");
        let p = find_nodes(&dom.document, &["html", "body", "p"])
            .pop()
            .unwrap();
        let text = p.children.borrow().first().and_then(text_of);
        assert_eq!(text.as_deref(), Some("café"));
    }
}
