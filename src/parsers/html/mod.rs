//! HTML解析和处理模块
//!
//! - `dom`: 文档/片段解析与基础DOM操作
//! - `serializer`: 序列化功能

pub mod dom;
pub mod serializer;

pub use dom::{
    child_index, find_nodes, get_body, get_charset, get_child_node_by_name, get_node_attr,
    get_node_name, get_parent_node, html_to_dom, is_attached_to_document, parse_fragment_nodes,
    set_node_attr,
};
pub use serializer::serialize_document;
