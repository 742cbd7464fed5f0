//! HTML 解析
//!
//! 两种解析入口：
//!
//! - `html_to_dom`: 把文本当作完整的 HTML5 文档解析
//! - `fragment_to_dom`: 把文本当作紧跟在 `<body>` 开始标签之后的片段解析，
//!   结果放进一个空文档外壳的 `<body>` 中
//!
//! 两者都使用 HTML5 的容错规则，格式错误的标记会被静默修复，不会产生错误。

use html5ever::interface::QualName;
use html5ever::tendril::TendrilSink;
use html5ever::{namespace_url, ns, parse_document, parse_fragment, LocalName};
use markup5ever_rcdom::{Handle, RcDom};

use crate::error::{RewriteError, RewriteResult};

use super::dom::{get_child_node_by_name, move_children};

/// 将 HTML 文本解析为 DOM
pub fn html_to_dom(html: &str) -> RcDom {
    parse_document(RcDom::default(), Default::default()).one(html)
}

/// 片段解析结果：文档外壳以及承载片段内容的 `<body>` 容器
pub struct BodyFragment {
    pub dom: RcDom,
    pub body: Handle,
}

/// 在 `<body>` 上下文中解析 HTML 片段
///
/// 只支持可以直接放在 `<body>` 开始标签之后的片段，
/// 需要其他解析上下文（例如 `<table>` 或 `<select>` 内部）的片段可能被错误解析。
pub fn fragment_to_dom(fragment: &str) -> RewriteResult<BodyFragment> {
    let dom = html_to_dom("");
    let body = get_child_node_by_name(&dom.document, "html")
        .and_then(|html| get_child_node_by_name(&html, "body"))
        .ok_or_else(|| RewriteError::Parse("document shell has no <body>".to_string()))?;

    let fragment_dom = parse_fragment(
        RcDom::default(),
        Default::default(),
        QualName::new(None, ns!(html), LocalName::from("body")),
        Vec::new(),
    )
    .one(fragment);

    // The fragment parser puts everything under a synthetic <html> root
    let fragment_root = get_child_node_by_name(&fragment_dom.document, "html").ok_or_else(
        || RewriteError::Parse("fragment parser produced no root element".to_string()),
    )?;
    move_children(&fragment_root, &body);

    Ok(BodyFragment { dom, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::dom::{get_comment_text, get_node_name};

    #[test]
    fn test_html_to_dom_builds_shell() {
        let dom = html_to_dom("<p>hello</p>");
        let html = get_child_node_by_name(&dom.document, "html").unwrap();

        assert!(get_child_node_by_name(&html, "head").is_some());
        assert!(get_child_node_by_name(&html, "body").is_some());
    }

    #[test]
    fn test_fragment_to_dom() {
        let fragment = fragment_to_dom("<p>one</p><!--note--><p>two</p>").unwrap();
        let children = fragment.body.children.borrow();

        assert_eq!(children.len(), 3);
        assert_eq!(get_node_name(&children[0]), Some("p"));
        assert_eq!(get_comment_text(&children[1]), Some("note".to_string()));
        assert_eq!(get_node_name(&children[2]), Some("p"));
    }

    #[test]
    fn test_fragment_children_point_at_body() {
        let fragment = fragment_to_dom("<span>x</span>").unwrap();
        let span = fragment.body.children.borrow()[0].clone();
        let parent = crate::parsers::html::dom::get_parent_node(&span).unwrap();

        assert!(std::rc::Rc::ptr_eq(&parent, &fragment.body));
    }
}
