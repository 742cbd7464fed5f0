//! 改写处理器
//!
//! `RewriteHandler` 是引擎唯一的扩展点。处理器通过 `applies_to()` 声明一个
//! XPath 表达式，引擎对每个匹配的节点调用一次 `on_match()`，
//! 全部匹配处理完之后再调用一次 `after_matches()`。
//!
//! `on_match()` 和 `after_matches()` 都有空的默认实现，
//! 只需要逐个节点修改的处理器可以只实现 `on_match()`。
//!
//! # 使用示例
//!
//! ```
//! use html5_tagrewriter::parsers::html::{set_node_attr, set_text_content};
//! use html5_tagrewriter::{RewriteHandler, RewriteResult, TagRewriter};
//! use markup5ever_rcdom::Handle;
//!
//! struct LinkHandler;
//!
//! impl RewriteHandler for LinkHandler {
//!     fn applies_to(&self) -> String {
//!         "//html:a".to_string()
//!     }
//!
//!     fn on_match(&mut self, node: &Handle) -> RewriteResult<()> {
//!         set_node_attr(node, "href", Some("https://example.com/"));
//!         set_text_content(node, "check this out");
//!         Ok(())
//!     }
//! }
//!
//! let mut rewriter = TagRewriter::new();
//! rewriter.register(LinkHandler);
//!
//! let html = rewriter.process_body_fragment(r##"<p><a href="#">link</a></p>"##).unwrap();
//! assert_eq!(html, r#"<p><a href="https://example.com/">check this out</a></p>"#);
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use markup5ever_rcdom::Handle;

use crate::error::{RewriteError, RewriteResult};
use crate::parsers::xpath::XPath;

/// 处理器的查询范围：上下文节点以及绑定了 `html`/`svg`/`mathml` 前缀的求值器
///
/// 完整文档模式下上下文节点是文档根，片段模式下是承载片段的 `<body>`。
pub struct QueryScope<'a> {
    xpath: &'a XPath,
    node: &'a Handle,
}

impl<'a> QueryScope<'a> {
    pub fn new(xpath: &'a XPath, node: &'a Handle) -> Self {
        QueryScope { xpath, node }
    }

    pub fn node(&self) -> &Handle {
        self.node
    }

    pub fn xpath(&self) -> &XPath {
        self.xpath
    }

    /// 以范围节点为上下文求值
    pub fn query(&self, expression: &str) -> RewriteResult<Vec<Handle>> {
        self.query_from(expression, self.node)
    }

    /// 以任意节点为上下文求值
    pub fn query_from(&self, expression: &str, context: &Handle) -> RewriteResult<Vec<Handle>> {
        self.xpath
            .query(expression, context)
            .map_err(|source| RewriteError::InvalidSelector {
                selector: expression.to_string(),
                source,
            })
    }
}

/// 处理某一类标签的改写处理器
pub trait RewriteHandler {
    /// 处理器要处理的节点，XPath 表达式
    ///
    /// HTML 元素必须使用 `html` 前缀，例如 `//html:a` 匹配所有 `<a>` 标签；
    /// SVG 与 MathML 元素分别使用 `svg` 和 `mathml` 前缀。
    fn applies_to(&self) -> String;

    /// 处理一个匹配的节点
    ///
    /// 可以直接修改节点，也可以先记录下来，在 `after_matches()` 中批量处理。
    fn on_match(&mut self, _node: &Handle) -> RewriteResult<()> {
        Ok(())
    }

    /// 所有匹配都已传给 `on_match()` 之后调用，即使没有任何匹配也会调用一次
    fn after_matches(&mut self, _document: &Handle, _scope: &QueryScope) -> RewriteResult<()> {
        Ok(())
    }
}

impl<H: RewriteHandler + ?Sized> RewriteHandler for Box<H> {
    fn applies_to(&self) -> String {
        (**self).applies_to()
    }

    fn on_match(&mut self, node: &Handle) -> RewriteResult<()> {
        (**self).on_match(node)
    }

    fn after_matches(&mut self, document: &Handle, scope: &QueryScope) -> RewriteResult<()> {
        (**self).after_matches(document, scope)
    }
}

/// 共享的处理器：注册之后调用方仍然可以读取处理器的状态
impl<H: RewriteHandler + ?Sized> RewriteHandler for Rc<RefCell<H>> {
    fn applies_to(&self) -> String {
        self.borrow().applies_to()
    }

    fn on_match(&mut self, node: &Handle) -> RewriteResult<()> {
        self.borrow_mut().on_match(node)
    }

    fn after_matches(&mut self, document: &Handle, scope: &QueryScope) -> RewriteResult<()> {
        self.borrow_mut().after_matches(document, scope)
    }
}

type MatchCallback = Box<dyn FnMut(&Handle) -> RewriteResult<()>>;
type AfterMatchesCallback = Box<dyn FnMut(&Handle, &QueryScope) -> RewriteResult<()>>;

/// 由闭包构成的处理器
pub struct CallbackHandler {
    selector: String,
    match_callback: Option<MatchCallback>,
    after_matches_callback: Option<AfterMatchesCallback>,
}

impl CallbackHandler {
    pub fn new(selector: impl Into<String>) -> Self {
        CallbackHandler {
            selector: selector.into(),
            match_callback: None,
            after_matches_callback: None,
        }
    }

    pub fn with_match<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&Handle) -> RewriteResult<()> + 'static,
    {
        self.match_callback = Some(Box::new(callback));
        self
    }

    pub fn with_after_matches<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&Handle, &QueryScope) -> RewriteResult<()> + 'static,
    {
        self.after_matches_callback = Some(Box::new(callback));
        self
    }
}

impl RewriteHandler for CallbackHandler {
    fn applies_to(&self) -> String {
        self.selector.clone()
    }

    fn on_match(&mut self, node: &Handle) -> RewriteResult<()> {
        match self.match_callback.as_mut() {
            Some(callback) => callback(node),
            None => Ok(()),
        }
    }

    fn after_matches(&mut self, document: &Handle, scope: &QueryScope) -> RewriteResult<()> {
        match self.after_matches_callback.as_mut() {
            Some(callback) => callback(document, scope),
            None => Ok(()),
        }
    }
}
