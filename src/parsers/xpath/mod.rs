//! # XPath 选择器
//!
//! 处理器通过 XPath 表达式声明自己要处理的节点。这里实现了 XPath 1.0 中
//! 选择节点所需的子集，直接在 `markup5ever_rcdom` 树上求值：
//!
//! - 位置路径：`/`、`//`、`.`、`..`，以及 `|` 并集
//! - 轴：`child`、`descendant`、`descendant-or-self`、`self`、`parent`、
//!   `ancestor`、`ancestor-or-self`、`following-sibling`、`preceding-sibling`
//! - 节点测试：`html:a`、`svg:*`、`*`、`node()`、`text()`、`comment()`
//! - 谓词：`and`、`or`、`not()`、比较运算、位置、`@attr`、`contains()`、
//!   `starts-with()`、`normalize-space()`、`local-name()`、`count()`、`string()`
//!
//! 与 XPath 1.0 一致，无前缀的名称只匹配空命名空间中的元素，
//! 因此 HTML 元素必须使用 `html:` 前缀，例如 `//html:a`。
//!
//! ```
//! use html5_tagrewriter::parsers::html::html_to_dom;
//! use html5_tagrewriter::parsers::xpath::XPath;
//!
//! let dom = html_to_dom("<p><a href='#'>one</a><a>two</a></p>");
//! let xpath = XPath::for_html();
//!
//! let links = xpath.query("//html:a[@href]", &dom.document).unwrap();
//! assert_eq!(links.len(), 1);
//! ```

mod eval;
mod lexer;
mod parser;

use std::collections::HashMap;

use markup5ever_rcdom::Handle;
use thiserror::Error;

use self::parser::{LocationPath, Parser};

pub const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
pub const MATHML_NAMESPACE: &str = "http://www.w3.org/1998/Math/MathML";

/// XPath 表达式错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum XPathError {
    #[error("表达式为空")]
    Empty,

    #[error("偏移量 {offset} 处出现意外字符 `{ch}`")]
    UnexpectedChar { ch: char, offset: usize },

    #[error("偏移量 {0} 处的字符串字面量没有结束")]
    UnterminatedLiteral(usize),

    #[error("偏移量 {offset} 处出现意外的 `{found}`")]
    UnexpectedToken { found: String, offset: usize },

    #[error("表达式意外结束")]
    UnexpectedEnd,

    #[error("未知的命名空间前缀 `{0}`")]
    UnknownPrefix(String),

    #[error("未知的轴 `{0}`")]
    UnknownAxis(String),

    #[error("不支持的函数 `{0}()`")]
    UnsupportedFunction(String),
}

/// 带命名空间前缀绑定的 XPath 求值器
#[derive(Clone, Debug)]
pub struct XPath {
    namespaces: HashMap<String, String>,
}

impl Default for XPath {
    fn default() -> Self {
        XPath::for_html()
    }
}

impl XPath {
    /// 不带任何前缀绑定的求值器
    pub fn new() -> Self {
        XPath {
            namespaces: HashMap::new(),
        }
    }

    /// 绑定了 `html`、`svg` 和 `mathml` 前缀的求值器
    pub fn for_html() -> Self {
        let mut xpath = XPath::new();
        xpath.register_namespace("html", HTML_NAMESPACE);
        xpath.register_namespace("svg", SVG_NAMESPACE);
        xpath.register_namespace("mathml", MATHML_NAMESPACE);
        xpath
    }

    /// 绑定命名空间前缀，已存在的绑定会被覆盖
    pub fn register_namespace(&mut self, prefix: &str, uri: &str) {
        self.namespaces.insert(prefix.to_string(), uri.to_string());
    }

    pub fn namespace_uri(&self, prefix: &str) -> Option<&str> {
        self.namespaces.get(prefix).map(String::as_str)
    }

    /// 编译表达式，前缀在此时解析
    pub fn compile(&self, expression: &str) -> Result<Expression, XPathError> {
        let tokens = lexer::tokenize(expression)?;
        let paths = Parser::new(tokens, &self.namespaces).parse_union()?;

        Ok(Expression {
            source: expression.to_string(),
            paths,
        })
    }

    /// 编译并以 `context` 为上下文节点求值
    pub fn query(&self, expression: &str, context: &Handle) -> Result<Vec<Handle>, XPathError> {
        Ok(self.compile(expression)?.select(context))
    }
}

/// 已编译的 XPath 表达式
#[derive(Clone, Debug)]
pub struct Expression {
    source: String,
    paths: Vec<LocationPath>,
}

impl Expression {
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// 求值，返回按文档顺序排列的节点，不含重复
    ///
    /// 绝对路径总是从 `context` 所在树的根开始，与上下文节点无关。
    pub fn select(&self, context: &Handle) -> Vec<Handle> {
        eval::select_union(&self.paths, context)
    }
}
