//! HTML解析和处理模块
//!
//! - `parser`: 文档与 `<body>` 片段解析
//! - `dom`: 基础DOM操作
//! - `serializer`: 序列化功能

pub mod dom;
pub mod parser;
pub mod serializer;

pub use dom::{
    append_child, create_element, create_text, detach_node, get_child_node_by_name,
    get_comment_text, get_node_attr, get_node_name, get_parent_node, get_text_content,
    insert_before, move_children, set_node_attr, set_text_content,
};
pub use parser::{fragment_to_dom, html_to_dom, BodyFragment};
pub use serializer::{serialize_children, serialize_document};
