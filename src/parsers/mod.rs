//! # 解析器模块
//!
//! - `esi` - ESI 标签的包装与还原
//! - `html` - HTML 文档与片段解析、DOM 操作、序列化
//! - `xpath` - 处理器使用的 XPath 选择器

pub mod esi;
pub mod html;
pub mod xpath;

// Re-export commonly used items for convenience
pub use esi::EsiTagProcessor;
pub use html::{fragment_to_dom, html_to_dom, serialize_children, serialize_document};
pub use xpath::{Expression, XPath, XPathError};
