//! # 解析器模块
//!
//! 目前只包含 HTML 文档的解析、DOM 操作与序列化。

pub mod html;

pub use html::{get_body, html_to_dom, serialize_document};
