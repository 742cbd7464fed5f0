//! XPath 求值
//!
//! 在 `markup5ever_rcdom` 树上对已编译的位置路径求值。
//! 结果按文档顺序排列且不含重复节点。

use std::collections::HashSet;
use std::rc::Rc;

use markup5ever_rcdom::{Handle, Node, NodeData};

use crate::parsers::html::dom::{get_parent_node, get_text_content};

use super::parser::{Axis, CmpOp, Expr, LocationPath, NamespaceTest, NodeTest, Operand, Step};

/// 对位置路径的并集求值
pub(crate) fn select_union(paths: &[LocationPath], context: &Handle) -> Vec<Handle> {
    let mut selected = Vec::new();
    for path in paths {
        selected.extend(select_path(path, context));
    }

    let root = document_root(context);
    sort_document_order(&root, selected)
}

fn select_path(path: &LocationPath, context: &Handle) -> Vec<Handle> {
    let mut nodes = if path.absolute {
        vec![document_root(context)]
    } else {
        vec![context.clone()]
    };

    for step in &path.steps {
        nodes = select_step(step, &nodes);
        if nodes.is_empty() {
            break;
        }
    }

    nodes
}

fn select_step(step: &Step, inputs: &[Handle]) -> Vec<Handle> {
    let mut seen: HashSet<*const Node> = HashSet::new();
    let mut output = Vec::new();

    for node in inputs {
        let mut candidates: Vec<Handle> = axis_nodes(step.axis, node)
            .into_iter()
            .filter(|candidate| node_test_matches(&step.test, candidate))
            .collect();

        for predicate in &step.predicates {
            let size = candidates.len();
            candidates = candidates
                .into_iter()
                .enumerate()
                .filter(|(index, candidate)| {
                    let context = Context {
                        node: candidate,
                        position: index + 1,
                        size,
                    };
                    evaluate_predicate(predicate, &context)
                })
                .map(|(_, candidate)| candidate)
                .collect();
        }

        for candidate in candidates {
            if seen.insert(Rc::as_ptr(&candidate)) {
                output.push(candidate);
            }
        }
    }

    output
}

/// 沿父指针找到树根（通常是文档节点）
pub(crate) fn document_root(node: &Handle) -> Handle {
    let mut current = node.clone();
    while let Some(parent) = get_parent_node(&current) {
        current = parent;
    }
    current
}

/// 先序遍历，不包含 `node` 自身
fn descendants(node: &Handle) -> Vec<Handle> {
    let mut result = Vec::new();
    let mut stack: Vec<Handle> = node.children.borrow().iter().rev().cloned().collect();

    while let Some(current) = stack.pop() {
        stack.extend(current.children.borrow().iter().rev().cloned());
        result.push(current);
    }

    result
}

fn ancestors(node: &Handle) -> Vec<Handle> {
    let mut result = Vec::new();
    let mut current = get_parent_node(node);
    while let Some(parent) = current {
        current = get_parent_node(&parent);
        result.push(parent);
    }
    result
}

/// 兄弟节点：`(前面的兄弟, 后面的兄弟)`，前者按距离由近到远
fn siblings(node: &Handle) -> (Vec<Handle>, Vec<Handle>) {
    let Some(parent) = get_parent_node(node) else {
        return (Vec::new(), Vec::new());
    };

    let children = parent.children.borrow();
    match children.iter().position(|child| Rc::ptr_eq(child, node)) {
        Some(index) => (
            children[..index].iter().rev().cloned().collect(),
            children[index + 1..].to_vec(),
        ),
        None => (Vec::new(), Vec::new()),
    }
}

/// 按轴的方向（反向轴由近到远）返回候选节点
fn axis_nodes(axis: Axis, node: &Handle) -> Vec<Handle> {
    match axis {
        Axis::Child => node.children.borrow().clone(),
        Axis::Descendant => descendants(node),
        Axis::DescendantOrSelf => {
            let mut nodes = vec![node.clone()];
            nodes.extend(descendants(node));
            nodes
        }
        Axis::SelfAxis => vec![node.clone()],
        Axis::Parent => get_parent_node(node).into_iter().collect(),
        Axis::Ancestor => ancestors(node),
        Axis::AncestorOrSelf => {
            let mut nodes = vec![node.clone()];
            nodes.extend(ancestors(node));
            nodes
        }
        Axis::FollowingSibling => siblings(node).1,
        Axis::PrecedingSibling => siblings(node).0,
    }
}

fn node_test_matches(test: &NodeTest, node: &Handle) -> bool {
    match (test, &node.data) {
        (NodeTest::Node, _) => true,
        (NodeTest::Text, NodeData::Text { .. }) => true,
        (NodeTest::Comment, NodeData::Comment { .. }) => true,
        (NodeTest::Element { namespace, local }, NodeData::Element { name, .. }) => {
            let namespace_matches = match namespace {
                NamespaceTest::Any => true,
                NamespaceTest::Null => name.ns.is_empty(),
                NamespaceTest::Uri(uri) => &*name.ns == uri.as_str(),
            };
            namespace_matches && local.as_deref().map_or(true, |local| &*name.local == local)
        }
        _ => false,
    }
}

/// 把节点集合排列为文档顺序
///
/// 不在 `root` 之下的节点（例如已被摘下的节点）按原顺序追加到末尾。
fn sort_document_order(root: &Handle, nodes: Vec<Handle>) -> Vec<Handle> {
    if nodes.len() < 2 {
        return nodes;
    }

    let mut pending: HashSet<*const Node> = nodes.iter().map(Rc::as_ptr).collect();
    let mut ordered = Vec::with_capacity(pending.len());

    let mut stack = vec![root.clone()];
    while let Some(current) = stack.pop() {
        if pending.remove(&Rc::as_ptr(&current)) {
            ordered.push(current.clone());
            if pending.is_empty() {
                return ordered;
            }
        }
        stack.extend(current.children.borrow().iter().rev().cloned());
    }

    for node in nodes {
        if pending.remove(&Rc::as_ptr(&node)) {
            ordered.push(node);
        }
    }

    ordered
}

struct Context<'a> {
    node: &'a Handle,
    position: usize,
    size: usize,
}

enum Value {
    /// 节点集合，已转换为各节点的字符串值
    Nodes(Vec<String>),
    Str(String),
    Num(f64),
}

impl Value {
    fn into_string(self) -> String {
        match self {
            Value::Nodes(values) => values.into_iter().next().unwrap_or_default(),
            Value::Str(value) => value,
            Value::Num(value) => format_number(value),
        }
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

fn to_number(value: &str) -> f64 {
    value.trim().parse().unwrap_or(f64::NAN)
}

/// 节点的字符串值
fn string_value(node: &Handle) -> String {
    match &node.data {
        NodeData::Comment { contents } => contents.to_string(),
        NodeData::ProcessingInstruction { contents, .. } => contents.to_string(),
        _ => get_text_content(node),
    }
}

fn evaluate_predicate(expr: &Expr, context: &Context) -> bool {
    match expr {
        Expr::Or(left, right) => {
            evaluate_predicate(left, context) || evaluate_predicate(right, context)
        }
        Expr::And(left, right) => {
            evaluate_predicate(left, context) && evaluate_predicate(right, context)
        }
        Expr::Not(inner) => !evaluate_predicate(inner, context),
        Expr::Compare(left, op, right) => compare(
            evaluate_operand(left, context),
            *op,
            evaluate_operand(right, context),
        ),
        Expr::Contains(haystack, needle) => evaluate_operand(haystack, context)
            .into_string()
            .contains(&evaluate_operand(needle, context).into_string()),
        Expr::StartsWith(haystack, needle) => evaluate_operand(haystack, context)
            .into_string()
            .starts_with(&evaluate_operand(needle, context).into_string()),
        Expr::Test(operand) => match evaluate_operand(operand, context) {
            Value::Num(position) => context.position as f64 == position,
            Value::Nodes(values) => !values.is_empty(),
            Value::Str(value) => !value.is_empty(),
        },
    }
}

fn evaluate_operand(operand: &Operand, context: &Context) -> Value {
    match operand {
        Operand::Literal(value) => Value::Str(value.clone()),
        Operand::Number(value) => Value::Num(*value),
        Operand::Attribute(name) => match &context.node.data {
            NodeData::Element { attrs, .. } => Value::Nodes(
                attrs
                    .borrow()
                    .iter()
                    .filter(|attr| {
                        name.as_deref()
                            .map_or(true, |name| &*attr.name.local == name)
                    })
                    .map(|attr| attr.value.to_string())
                    .collect(),
            ),
            _ => Value::Nodes(Vec::new()),
        },
        Operand::Path(path) => {
            // Reverse axes yield nearest-first, string-value needs document order
            let nodes = select_path(path, context.node);
            let root = document_root(context.node);
            Value::Nodes(
                sort_document_order(&root, nodes)
                    .iter()
                    .map(string_value)
                    .collect(),
            )
        }
        Operand::Position => Value::Num(context.position as f64),
        Operand::Last => Value::Num(context.size as f64),
        Operand::LocalName => Value::Str(match &context.node.data {
            NodeData::Element { name, .. } => name.local.to_string(),
            _ => String::new(),
        }),
        Operand::Count(path) => Value::Num(select_path(path, context.node).len() as f64),
        Operand::StringOf(argument) => Value::Str(match argument {
            Some(argument) => evaluate_operand(argument, context).into_string(),
            None => string_value(context.node),
        }),
        Operand::NormalizeSpace(argument) => {
            let value = match argument {
                Some(argument) => evaluate_operand(argument, context).into_string(),
                None => string_value(context.node),
            };
            Value::Str(value.split_whitespace().collect::<Vec<_>>().join(" "))
        }
    }
}

enum Atom<'a> {
    Str(&'a str),
    Num(f64),
}

fn atoms(value: &Value) -> Vec<Atom<'_>> {
    match value {
        Value::Nodes(values) => values.iter().map(|v| Atom::Str(v.as_str())).collect(),
        Value::Str(value) => vec![Atom::Str(value.as_str())],
        Value::Num(value) => vec![Atom::Num(*value)],
    }
}

fn compare_atoms(left: &Atom, op: CmpOp, right: &Atom) -> bool {
    let as_number = |atom: &Atom| match atom {
        Atom::Str(value) => to_number(value),
        Atom::Num(value) => *value,
    };

    match op {
        CmpOp::Eq | CmpOp::Ne => {
            let equal = match (left, right) {
                (Atom::Str(l), Atom::Str(r)) => l == r,
                _ => as_number(left) == as_number(right),
            };
            if op == CmpOp::Eq {
                equal
            } else {
                !equal
            }
        }
        CmpOp::Lt => as_number(left) < as_number(right),
        CmpOp::Le => as_number(left) <= as_number(right),
        CmpOp::Gt => as_number(left) > as_number(right),
        CmpOp::Ge => as_number(left) >= as_number(right),
    }
}

/// 比较两个值，节点集合按“存在一对满足条件”的规则比较
fn compare(left: Value, op: CmpOp, right: Value) -> bool {
    let left_atoms = atoms(&left);
    let right_atoms = atoms(&right);

    left_atoms
        .iter()
        .any(|l| right_atoms.iter().any(|r| compare_atoms(l, op, r)))
}
