//! DOM 操作工具
//!
//! 处理器通过这些函数读取和修改 `markup5ever_rcdom` 节点，
//! 不需要直接接触 `Rc`/`RefCell` 的细节。

use std::cell::RefCell;
use std::rc::Rc;

use html5ever::interface::{Attribute, QualName};
use html5ever::tendril::{format_tendril, StrTendril};
use html5ever::{namespace_url, ns, LocalName};
use markup5ever_rcdom::{Handle, Node, NodeData};

/// 根据名称获取子元素
pub fn get_child_node_by_name(parent: &Handle, node_name: &str) -> Option<Handle> {
    let children = parent.children.borrow();
    let matching_children = children.iter().find(|child| match child.data {
        NodeData::Element { ref name, .. } => &*name.local == node_name,
        _ => false,
    });
    matching_children.cloned()
}

/// 获取节点属性值
pub fn get_node_attr(node: &Handle, attr_name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => {
            for attr in attrs.borrow().iter() {
                if &*attr.name.local == attr_name {
                    return Some(attr.value.to_string());
                }
            }
            None
        }
        _ => None,
    }
}

/// 获取元素的本地名称
pub fn get_node_name(node: &Handle) -> Option<&'_ str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

/// 获取父节点
///
/// 父指针存放在 `Cell` 中，读取后需要放回去。
pub fn get_parent_node(child: &Handle) -> Option<Handle> {
    let weak = child.parent.take();
    let parent = weak.as_ref().and_then(|node| node.upgrade());
    child.parent.set(weak);
    parent
}

/// 设置节点属性，`attr_value` 为 `None` 时删除该属性
pub fn set_node_attr(node: &Handle, attr_name: &str, attr_value: Option<&str>) {
    if let NodeData::Element { attrs, .. } = &node.data {
        let attrs_mut = &mut attrs.borrow_mut();
        let mut found_existing_attr = false;

        attrs_mut.retain_mut(|attr| {
            if &*attr.name.local != attr_name {
                return true;
            }

            found_existing_attr = true;
            match attr_value {
                Some(value) => {
                    attr.value.clear();
                    attr.value.push_slice(value);
                    true
                }
                None => false,
            }
        });

        if !found_existing_attr {
            if let Some(value) = attr_value {
                attrs_mut.push(Attribute {
                    name: QualName::new(None, ns!(), LocalName::from(attr_name)),
                    value: format_tendril!("{}", value),
                });
            }
        }
    }
}

/// 获取节点的文本内容（所有后代文本节点按文档顺序拼接）
pub fn get_text_content(node: &Handle) -> String {
    let mut text = String::new();
    let mut stack = vec![node.clone()];

    while let Some(current) = stack.pop() {
        match &current.data {
            NodeData::Text { contents } => text.push_str(&contents.borrow()),
            NodeData::Comment { .. } | NodeData::ProcessingInstruction { .. } => {}
            _ => stack.extend(current.children.borrow().iter().rev().cloned()),
        }
    }

    text
}

/// 用单个文本节点替换元素的全部子节点
pub fn set_text_content(node: &Handle, text: &str) {
    if let NodeData::Text { contents } = &node.data {
        let mut contents = contents.borrow_mut();
        contents.clear();
        contents.push_slice(text);
        return;
    }

    for child in node.children.take() {
        child.parent.set(None);
    }

    if !text.is_empty() {
        append_child(node, create_text(text));
    }
}

/// 创建 HTML 命名空间下的元素
pub fn create_element(local_name: &str, attrs: &[(&str, &str)]) -> Handle {
    let attrs = attrs
        .iter()
        .map(|(name, value)| Attribute {
            name: QualName::new(None, ns!(), LocalName::from(*name)),
            value: StrTendril::from(*value),
        })
        .collect();

    Node::new(NodeData::Element {
        name: QualName::new(None, ns!(html), LocalName::from(local_name)),
        attrs: RefCell::new(attrs),
        template_contents: RefCell::new(None),
        mathml_annotation_xml_integration_point: false,
    })
}

/// 创建文本节点
pub fn create_text(text: &str) -> Handle {
    Node::new(NodeData::Text {
        contents: RefCell::new(StrTendril::from(text)),
    })
}

/// 把节点追加为 `parent` 的最后一个子节点，必要时先从原位置摘下
pub fn append_child(parent: &Handle, child: Handle) {
    detach_node(&child);
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().push(child);
}

/// 把节点插入到 `sibling` 之前
pub fn insert_before(sibling: &Handle, node: Handle) {
    let Some(parent) = get_parent_node(sibling) else {
        return;
    };

    detach_node(&node);
    let mut children = parent.children.borrow_mut();
    let index = children
        .iter()
        .position(|child| Rc::ptr_eq(child, sibling))
        .unwrap_or(children.len());
    node.parent.set(Some(Rc::downgrade(&parent)));
    children.insert(index, node);
}

/// 把节点从父节点中摘下，节点本身及其子树保持完整
pub fn detach_node(node: &Handle) {
    if let Some(parent) = get_parent_node(node) {
        parent
            .children
            .borrow_mut()
            .retain(|child| !Rc::ptr_eq(child, node));
    }
    node.parent.set(None);
}

/// 把 `from` 的全部子节点移动到 `to` 的末尾
pub fn move_children(from: &Handle, to: &Handle) {
    // Take the vector first, rcdom's Drop clears grandchildren of dropped nodes
    let children = from.children.take();
    let mut target = to.children.borrow_mut();
    for child in children {
        child.parent.set(Some(Rc::downgrade(to)));
        target.push(child);
    }
}

/// 注释节点的文本
pub fn get_comment_text(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Comment { contents } => Some(contents.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::parser::html_to_dom;

    fn first_element(root: &Handle, name: &str) -> Option<Handle> {
        if get_node_name(root) == Some(name) {
            return Some(root.clone());
        }
        for child in root.children.borrow().iter() {
            if let Some(found) = first_element(child, name) {
                return Some(found);
            }
        }
        None
    }

    #[test]
    fn test_set_node_attr() {
        let dom = html_to_dom(r#"<a href="one" href2="x">link</a>"#);
        let anchor = first_element(&dom.document, "a").unwrap();

        set_node_attr(&anchor, "href", Some("two"));
        assert_eq!(get_node_attr(&anchor, "href"), Some("two".to_string()));

        set_node_attr(&anchor, "title", Some("new"));
        assert_eq!(get_node_attr(&anchor, "title"), Some("new".to_string()));

        set_node_attr(&anchor, "href2", None);
        assert_eq!(get_node_attr(&anchor, "href2"), None);
    }

    #[test]
    fn test_text_content() {
        let dom = html_to_dom("<p>Hello <b>big</b> world</p>");
        let paragraph = first_element(&dom.document, "p").unwrap();

        assert_eq!(get_text_content(&paragraph), "Hello big world");

        set_text_content(&paragraph, "replaced");
        assert_eq!(get_text_content(&paragraph), "replaced");
        assert_eq!(paragraph.children.borrow().len(), 1);
    }

    #[test]
    fn test_text_content_of_deep_tree() {
        let root = create_element("div", &[]);
        let mut innermost = root.clone();
        for _ in 0..200_000 {
            let span = create_element("span", &[]);
            append_child(&innermost, span.clone());
            innermost = span;
        }
        append_child(&innermost, create_text("deep"));

        assert_eq!(get_text_content(&root), "deep");
    }

    #[test]
    fn test_parent_lookup_keeps_pointer() {
        let dom = html_to_dom("<div><span>x</span></div>");
        let span = first_element(&dom.document, "span").unwrap();

        let parent = get_parent_node(&span).unwrap();
        assert_eq!(get_node_name(&parent), Some("div"));
        // A second lookup must still see the parent
        assert!(get_parent_node(&span).is_some());
    }

    #[test]
    fn test_detach_and_append() {
        let dom = html_to_dom("<div><span>x</span></div><p></p>");
        let span = first_element(&dom.document, "span").unwrap();
        let paragraph = first_element(&dom.document, "p").unwrap();

        append_child(&paragraph, span.clone());

        let div = first_element(&dom.document, "div").unwrap();
        assert!(div.children.borrow().is_empty());
        assert_eq!(
            get_node_name(&get_parent_node(&span).unwrap()),
            Some("p")
        );
    }

    #[test]
    fn test_insert_before() {
        let dom = html_to_dom("<ul><li>b</li></ul>");
        let item = first_element(&dom.document, "li").unwrap();

        let new_item = create_element("li", &[("class", "first")]);
        set_text_content(&new_item, "a");
        insert_before(&item, new_item);

        let list = first_element(&dom.document, "ul").unwrap();
        assert_eq!(get_text_content(&list), "ab");
    }
}
