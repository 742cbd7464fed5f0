//! # html5-tagrewriter
//!
//! 用可插拔的处理器改写 HTML5 文档中的标签，同时原样保留其中的 ESI 标签。
//!
//! 处理流程：包装 ESI 标签 → HTML5 解析 → 按注册顺序执行处理器 → 序列化 → 还原 ESI 标签。
//!
//! ## 模块组织
//!
//! - `core` - 改写引擎 `TagRewriter`
//! - `handler` - 处理器接口 `RewriteHandler` 及闭包适配器
//! - `parsers` - ESI 包装、HTML 解析与序列化、XPath 选择器
//! - `rules` - 从 TOML 加载的声明式规则
//! - `error` - 错误类型
//! - `env` - 环境变量配置

pub mod core;
pub mod env;
pub mod error;
pub mod handler;
pub mod parsers;
pub mod rules;

// Re-export commonly used items for convenience
pub use crate::core::TagRewriter;
pub use error::{RewriteError, RewriteResult};
pub use handler::{CallbackHandler, QueryScope, RewriteHandler};
pub use markup5ever_rcdom::Handle;
pub use parsers::esi::EsiTagProcessor;
pub use rules::{RewriteRule, RuleHandler, RuleSet};
