use std::collections::VecDeque;
use std::io;

use html5ever::interface::QualName;
use html5ever::serialize::{serialize, Serialize, SerializeOpts, Serializer, TraversalScope};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::error::{RewriteError, RewriteResult};

/// 序列化整个文档
pub fn serialize_document(dom: &RcDom) -> RewriteResult<String> {
    serialize_children(&dom.document)
}

/// 序列化节点的全部子节点（不包含节点本身），
/// 片段模式下用于读取 `<body>` 的内部内容
pub fn serialize_children(node: &Handle) -> RewriteResult<String> {
    let mut buf: Vec<u8> = Vec::new();

    // The default traversal scope is ChildrenOnly
    serialize(&mut buf, &TemplateAwareHandle(node.clone()), SerializeOpts::default())?;

    String::from_utf8(buf)
        .map_err(|e| RewriteError::Serialization(io::Error::new(io::ErrorKind::InvalidData, e)))
}

/// 会输出 `<template>` 内容的可序列化节点
///
/// html5ever 把 `<template>` 的内容放在 `template_contents` 文档片段里，
/// 而不是元素的 `children` 中，`markup5ever_rcdom::SerializableHandle` 不会输出这部分内容。
struct TemplateAwareHandle(Handle);

enum SerializeOp {
    Open(Handle),
    Close(QualName),
}

/// 节点的输出子节点：模板内容在前，普通子节点在后
fn serialized_children(node: &Handle) -> Vec<Handle> {
    let mut children = Vec::new();
    if let NodeData::Element {
        template_contents, ..
    } = &node.data
    {
        if let Some(contents) = template_contents.borrow().as_ref() {
            children.extend(contents.children.borrow().iter().cloned());
        }
    }
    children.extend(node.children.borrow().iter().cloned());
    children
}

impl Serialize for TemplateAwareHandle {
    fn serialize<S>(&self, serializer: &mut S, traversal_scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        let mut ops = VecDeque::new();
        match traversal_scope {
            TraversalScope::IncludeNode => ops.push_back(SerializeOp::Open(self.0.clone())),
            TraversalScope::ChildrenOnly(_) => ops.extend(
                serialized_children(&self.0)
                    .into_iter()
                    .map(SerializeOp::Open),
            ),
        }

        while let Some(op) = ops.pop_front() {
            match op {
                SerializeOp::Open(handle) => match &handle.data {
                    NodeData::Element { name, attrs, .. } => {
                        serializer.start_elem(
                            name.clone(),
                            attrs.borrow().iter().map(|at| (&at.name, &at.value[..])),
                        )?;

                        ops.push_front(SerializeOp::Close(name.clone()));
                        for child in serialized_children(&handle).into_iter().rev() {
                            ops.push_front(SerializeOp::Open(child));
                        }
                    }
                    NodeData::Doctype { name, .. } => serializer.write_doctype(name)?,
                    NodeData::Text { contents } => serializer.write_text(&contents.borrow())?,
                    NodeData::Comment { contents } => serializer.write_comment(contents)?,
                    NodeData::ProcessingInstruction { target, contents } => {
                        serializer.write_processing_instruction(target, contents)?
                    }
                    NodeData::Document => {
                        return Err(io::Error::new(
                            io::ErrorKind::InvalidInput,
                            "document node cannot be serialized as a child",
                        ))
                    }
                },
                SerializeOp::Close(name) => serializer.end_elem(name)?,
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::parser::{fragment_to_dom, html_to_dom};

    #[test]
    fn test_serialize_document() {
        let dom = html_to_dom("<!DOCTYPE html><title>x</title><p>hi</p>");

        assert_eq!(
            serialize_document(&dom).unwrap(),
            "<!DOCTYPE html><html><head><title>x</title></head><body><p>hi</p></body></html>"
        );
    }

    #[test]
    fn test_serialize_children_of_body() {
        let fragment = fragment_to_dom("<p>a &amp; b</p><!--c-->").unwrap();

        assert_eq!(
            serialize_children(&fragment.body).unwrap(),
            "<p>a &amp; b</p><!--c-->"
        );
    }

    #[test]
    fn test_serialize_template_contents() {
        let fragment =
            fragment_to_dom("<template><p>x</p><!--c--><template><b>y</b></template></template>")
                .unwrap();

        assert_eq!(
            serialize_children(&fragment.body).unwrap(),
            "<template><p>x</p><!--c--><template><b>y</b></template></template>"
        );
    }
}
