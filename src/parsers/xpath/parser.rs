//! XPath 语法分析
//!
//! 把 Token 序列转换为位置路径的并集。命名空间前缀在这里解析为 URI，
//! 所以求值阶段不再需要前缀绑定。

use std::collections::HashMap;

use super::lexer::Token;
use super::XPathError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    SelfAxis,
    Parent,
    Ancestor,
    AncestorOrSelf,
    FollowingSibling,
    PrecedingSibling,
}

impl Axis {
    fn from_name(name: &str) -> Option<Axis> {
        match name {
            "child" => Some(Axis::Child),
            "descendant" => Some(Axis::Descendant),
            "descendant-or-self" => Some(Axis::DescendantOrSelf),
            "self" => Some(Axis::SelfAxis),
            "parent" => Some(Axis::Parent),
            "ancestor" => Some(Axis::Ancestor),
            "ancestor-or-self" => Some(Axis::AncestorOrSelf),
            "following-sibling" => Some(Axis::FollowingSibling),
            "preceding-sibling" => Some(Axis::PrecedingSibling),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum NamespaceTest {
    /// `*`
    Any,
    /// 无前缀名称只匹配空命名空间
    Null,
    Uri(String),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum NodeTest {
    /// `local` 为 `None` 表示任意本地名称
    Element {
        namespace: NamespaceTest,
        local: Option<String>,
    },
    Node,
    Text,
    Comment,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Step {
    pub axis: Axis,
    pub test: NodeTest,
    pub predicates: Vec<Expr>,
}

impl Step {
    fn descendant_or_self() -> Step {
        Step {
            axis: Axis::DescendantOrSelf,
            test: NodeTest::Node,
            predicates: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct LocationPath {
    pub absolute: bool,
    pub steps: Vec<Step>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Operand {
    Literal(String),
    Number(f64),
    /// `@name`，`None` 表示 `@*`
    Attribute(Option<String>),
    Path(LocationPath),
    Position,
    Last,
    LocalName,
    Count(LocationPath),
    StringOf(Option<Box<Operand>>),
    NormalizeSpace(Option<Box<Operand>>),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Expr {
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Compare(Operand, CmpOp, Operand),
    Contains(Operand, Operand),
    StartsWith(Operand, Operand),
    Test(Operand),
}

pub(crate) struct Parser<'a> {
    tokens: Vec<(usize, Token)>,
    position: usize,
    namespaces: &'a HashMap<String, String>,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(tokens: Vec<(usize, Token)>, namespaces: &'a HashMap<String, String>) -> Self {
        Parser {
            tokens,
            position: 0,
            namespaces,
        }
    }

    /// 解析完整表达式：`path ('|' path)*`
    pub(crate) fn parse_union(mut self) -> Result<Vec<LocationPath>, XPathError> {
        if self.tokens.is_empty() {
            return Err(XPathError::Empty);
        }

        let mut paths = vec![self.parse_location_path()?];
        while self.eat(&Token::Pipe) {
            paths.push(self.parse_location_path()?);
        }

        match self.tokens.get(self.position) {
            None => Ok(paths),
            Some((offset, token)) => Err(XPathError::UnexpectedToken {
                found: token.describe(),
                offset: *offset,
            }),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position).map(|(_, token)| token)
    }

    fn peek_at(&self, distance: usize) -> Option<&Token> {
        self.tokens
            .get(self.position + distance)
            .map(|(_, token)| token)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).map(|(_, token)| token.clone());
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn unexpected(&self) -> XPathError {
        match self.tokens.get(self.position) {
            Some((offset, token)) => XPathError::UnexpectedToken {
                found: token.describe(),
                offset: *offset,
            },
            None => XPathError::UnexpectedEnd,
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<(), XPathError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn peek_is_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token::Name { prefix: None, local }) if local == keyword)
    }

    fn peek_is_function(&self, names: &[&str]) -> bool {
        matches!(self.peek(), Some(Token::Name { prefix: None, local }) if names.contains(&local.as_str()))
            && self.peek_at(1) == Some(&Token::LParen)
    }

    fn starts_step(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::Dot | Token::DotDot | Token::Star | Token::Name { .. })
        )
    }

    fn parse_location_path(&mut self) -> Result<LocationPath, XPathError> {
        let mut steps = Vec::new();

        let absolute = match self.peek() {
            Some(Token::Slash) => {
                self.advance();
                if self.starts_step() {
                    self.parse_relative_steps(&mut steps)?;
                }
                true
            }
            Some(Token::DoubleSlash) => {
                self.advance();
                steps.push(Step::descendant_or_self());
                self.parse_relative_steps(&mut steps)?;
                true
            }
            _ => {
                self.parse_relative_steps(&mut steps)?;
                false
            }
        };

        Ok(LocationPath { absolute, steps })
    }

    fn parse_relative_steps(&mut self, steps: &mut Vec<Step>) -> Result<(), XPathError> {
        steps.push(self.parse_step()?);

        loop {
            if self.eat(&Token::Slash) {
                steps.push(self.parse_step()?);
            } else if self.eat(&Token::DoubleSlash) {
                steps.push(Step::descendant_or_self());
                steps.push(self.parse_step()?);
            } else {
                return Ok(());
            }
        }
    }

    fn parse_step(&mut self) -> Result<Step, XPathError> {
        if self.eat(&Token::Dot) {
            return Ok(Step {
                axis: Axis::SelfAxis,
                test: NodeTest::Node,
                predicates: Vec::new(),
            });
        }
        if self.eat(&Token::DotDot) {
            return Ok(Step {
                axis: Axis::Parent,
                test: NodeTest::Node,
                predicates: Vec::new(),
            });
        }

        let axis_name = match (self.peek(), self.peek_at(1)) {
            (Some(Token::Name { prefix: None, local }), Some(Token::AxisSep)) => Some(local.clone()),
            _ => None,
        };
        let mut axis = Axis::Child;
        if let Some(name) = axis_name {
            axis = Axis::from_name(&name).ok_or(XPathError::UnknownAxis(name))?;
            self.position += 2;
        }

        let test = self.parse_node_test()?;

        let mut predicates = Vec::new();
        while self.eat(&Token::LBracket) {
            predicates.push(self.parse_or()?);
            self.expect(&Token::RBracket)?;
        }

        Ok(Step {
            axis,
            test,
            predicates,
        })
    }

    fn parse_node_test(&mut self) -> Result<NodeTest, XPathError> {
        match self.peek().cloned() {
            Some(Token::Star) => {
                self.advance();
                Ok(NodeTest::Element {
                    namespace: NamespaceTest::Any,
                    local: None,
                })
            }
            Some(Token::Name { prefix, local }) => {
                if self.peek_at(1) == Some(&Token::LParen) {
                    let test = match (prefix.as_deref(), local.as_str()) {
                        (None, "node") => NodeTest::Node,
                        (None, "text") => NodeTest::Text,
                        (None, "comment") => NodeTest::Comment,
                        _ => return Err(XPathError::UnsupportedFunction(local)),
                    };
                    self.position += 2;
                    self.expect(&Token::RParen)?;
                    return Ok(test);
                }

                self.advance();
                let namespace = match prefix {
                    Some(prefix) => NamespaceTest::Uri(
                        self.namespaces
                            .get(&prefix)
                            .cloned()
                            .ok_or(XPathError::UnknownPrefix(prefix))?,
                    ),
                    None => NamespaceTest::Null,
                };
                let local = if local == "*" { None } else { Some(local) };

                Ok(NodeTest::Element { namespace, local })
            }
            _ => Err(self.unexpected()),
        }
    }

    fn parse_or(&mut self) -> Result<Expr, XPathError> {
        let mut expr = self.parse_and()?;
        while self.peek_is_keyword("or") {
            self.advance();
            expr = Expr::Or(Box::new(expr), Box::new(self.parse_and()?));
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> Result<Expr, XPathError> {
        let mut expr = self.parse_primary()?;
        while self.peek_is_keyword("and") {
            self.advance();
            expr = Expr::And(Box::new(expr), Box::new(self.parse_primary()?));
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, XPathError> {
        if self.eat(&Token::LParen) {
            let expr = self.parse_or()?;
            self.expect(&Token::RParen)?;
            return Ok(expr);
        }

        if self.peek_is_function(&["not"]) {
            self.position += 2;
            let expr = self.parse_or()?;
            self.expect(&Token::RParen)?;
            return Ok(Expr::Not(Box::new(expr)));
        }

        if self.peek_is_function(&["contains", "starts-with"]) {
            let is_contains = self.peek_is_keyword("contains");
            self.position += 2;
            let haystack = self.parse_operand()?;
            self.expect(&Token::Comma)?;
            let needle = self.parse_operand()?;
            self.expect(&Token::RParen)?;
            return Ok(if is_contains {
                Expr::Contains(haystack, needle)
            } else {
                Expr::StartsWith(haystack, needle)
            });
        }

        let left = self.parse_operand()?;
        let op = match self.peek() {
            Some(Token::Eq) => CmpOp::Eq,
            Some(Token::Ne) => CmpOp::Ne,
            Some(Token::Lt) => CmpOp::Lt,
            Some(Token::Le) => CmpOp::Le,
            Some(Token::Gt) => CmpOp::Gt,
            Some(Token::Ge) => CmpOp::Ge,
            _ => return Ok(Expr::Test(left)),
        };
        self.advance();
        let right = self.parse_operand()?;

        Ok(Expr::Compare(left, op, right))
    }

    fn parse_operand(&mut self) -> Result<Operand, XPathError> {
        match self.peek().cloned() {
            Some(Token::Literal(value)) => {
                self.advance();
                Ok(Operand::Literal(value))
            }
            Some(Token::Number(value)) => {
                self.advance();
                Ok(Operand::Number(value))
            }
            Some(Token::At) => {
                self.advance();
                let operand = match self.peek() {
                    Some(Token::Star) => Operand::Attribute(None),
                    Some(Token::Name { prefix: None, local }) => {
                        Operand::Attribute(Some(local.clone()))
                    }
                    _ => return Err(self.unexpected()),
                };
                self.advance();
                Ok(operand)
            }
            Some(Token::Name { prefix: None, local })
                if self.peek_at(1) == Some(&Token::LParen)
                    && !matches!(local.as_str(), "node" | "text" | "comment") =>
            {
                self.position += 2;
                self.parse_function(local)
            }
            Some(
                Token::Slash | Token::DoubleSlash | Token::Dot | Token::DotDot | Token::Star,
            )
            | Some(Token::Name { .. }) => Ok(Operand::Path(self.parse_location_path()?)),
            _ => Err(self.unexpected()),
        }
    }

    /// 解析函数调用，调用方已经消费了函数名和左括号
    fn parse_function(&mut self, name: String) -> Result<Operand, XPathError> {
        let operand = match name.as_str() {
            "position" => Operand::Position,
            "last" => Operand::Last,
            "local-name" => Operand::LocalName,
            "count" => Operand::Count(self.parse_location_path()?),
            "string" | "normalize-space" => {
                let argument = if self.peek() == Some(&Token::RParen) {
                    None
                } else {
                    Some(Box::new(self.parse_operand()?))
                };
                if name == "string" {
                    Operand::StringOf(argument)
                } else {
                    Operand::NormalizeSpace(argument)
                }
            }
            _ => return Err(XPathError::UnsupportedFunction(name)),
        };
        self.expect(&Token::RParen)?;
        Ok(operand)
    }
}
