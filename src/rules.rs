//! 声明式改写规则
//!
//! 不想写 Rust 代码的场景下，可以在 TOML 文件中声明规则，
//! 每条规则都会成为一个 `RuleHandler`：
//!
//! ```toml
//! [[rule]]
//! selector = "//html:a"
//! set_attributes = { href = "https://example.com" }
//! remove_attributes = ["target"]
//! set_text = "check this out"
//!
//! [[rule]]
//! selector = "//html:script"
//! remove = true
//! ```
//!
//! 属性与文本修改在 `on_match()` 中逐个节点完成；
//! `remove = true` 的节点先收集起来，在 `after_matches()` 中统一摘除。

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use markup5ever_rcdom::Handle;
use serde::Deserialize;
use tracing::{debug, info};

use crate::core::TagRewriter;
use crate::error::{RewriteError, RewriteResult};
use crate::handler::{QueryScope, RewriteHandler};
use crate::parsers::html::{detach_node, set_node_attr, set_text_content};
use crate::parsers::xpath::XPath;

/// 单条改写规则
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RewriteRule {
    pub selector: String,
    #[serde(default)]
    pub set_attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub remove_attributes: Vec<String>,
    pub set_text: Option<String>,
    #[serde(default)]
    pub remove: bool,
}

impl RewriteRule {
    fn has_action(&self) -> bool {
        !self.set_attributes.is_empty()
            || !self.remove_attributes.is_empty()
            || self.set_text.is_some()
            || self.remove
    }
}

/// 规则集合，顺序即执行顺序
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RuleSet {
    #[serde(default, rename = "rule")]
    pub rules: Vec<RewriteRule>,
}

impl RuleSet {
    /// 从 TOML 文本解析并校验规则
    pub fn from_toml_str(content: &str) -> RewriteResult<RuleSet> {
        let rule_set: RuleSet =
            toml::from_str(content).map_err(|e| RewriteError::Config(e.to_string()))?;
        rule_set.validate()?;
        Ok(rule_set)
    }

    /// 从文件加载规则
    pub fn load<P: AsRef<Path>>(path: P) -> RewriteResult<RuleSet> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| RewriteError::Config(format!("{}: {}", path.display(), e)))?;

        let rule_set = RuleSet::from_toml_str(&content)?;
        info!("加载规则文件: {} ({} 条规则)", path.display(), rule_set.rules.len());
        Ok(rule_set)
    }

    /// 校验规则：选择器不能为空且必须能编译，每条规则至少要有一个动作
    pub fn validate(&self) -> RewriteResult<()> {
        let xpath = XPath::for_html();

        for (index, rule) in self.rules.iter().enumerate() {
            if rule.selector.trim().is_empty() {
                return Err(RewriteError::Config(format!("规则 #{} 缺少 selector", index + 1)));
            }
            if !rule.has_action() {
                return Err(RewriteError::Config(format!(
                    "规则 #{} (`{}`) 没有任何动作",
                    index + 1,
                    rule.selector
                )));
            }
            xpath
                .compile(&rule.selector)
                .map_err(|source| RewriteError::InvalidSelector {
                    selector: rule.selector.clone(),
                    source,
                })?;
        }

        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 按顺序把每条规则注册为处理器
    pub fn register_into(&self, rewriter: &mut TagRewriter) {
        for rule in &self.rules {
            rewriter.register(RuleHandler::new(rule.clone()));
        }
    }
}

/// 执行一条 `RewriteRule` 的处理器
pub struct RuleHandler {
    rule: RewriteRule,
    pending_removal: Vec<Handle>,
}

impl RuleHandler {
    pub fn new(rule: RewriteRule) -> Self {
        RuleHandler {
            rule,
            pending_removal: Vec::new(),
        }
    }
}

impl RewriteHandler for RuleHandler {
    fn applies_to(&self) -> String {
        self.rule.selector.clone()
    }

    fn on_match(&mut self, node: &Handle) -> RewriteResult<()> {
        if self.rule.remove {
            self.pending_removal.push(node.clone());
            return Ok(());
        }

        for (name, value) in &self.rule.set_attributes {
            set_node_attr(node, name, Some(value));
        }
        for name in &self.rule.remove_attributes {
            set_node_attr(node, name, None);
        }
        if let Some(text) = &self.rule.set_text {
            set_text_content(node, text);
        }

        Ok(())
    }

    fn after_matches(&mut self, _document: &Handle, _scope: &QueryScope) -> RewriteResult<()> {
        if !self.pending_removal.is_empty() {
            debug!(
                selector = %self.rule.selector,
                nodes = self.pending_removal.len(),
                "removing matched nodes"
            );
        }

        for node in self.pending_removal.drain(..) {
            detach_node(&node);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rules() {
        let rule_set = RuleSet::from_toml_str(
            r#"
            [[rule]]
            selector = "//html:a"
            set_attributes = { href = "https://example.com" }
            set_text = "check this out"

            [[rule]]
            selector = "//html:script"
            remove = true
            "#,
        )
        .unwrap();

        assert_eq!(rule_set.rules.len(), 2);
        assert_eq!(
            rule_set.rules[0].set_attributes.get("href"),
            Some(&"https://example.com".to_string())
        );
        assert!(rule_set.rules[1].remove);
    }

    #[test]
    fn test_rule_validation() {
        let missing_action = RuleSet::from_toml_str("[[rule]]\nselector = \"//html:a\"\n");
        assert!(matches!(missing_action, Err(RewriteError::Config(_))));

        let empty_selector = RuleSet::from_toml_str("[[rule]]\nselector = \" \"\nremove = true\n");
        assert!(matches!(empty_selector, Err(RewriteError::Config(_))));

        let bad_selector = RuleSet::from_toml_str("[[rule]]\nselector = \"//nope:a\"\nremove = true\n");
        assert!(matches!(
            bad_selector,
            Err(RewriteError::InvalidSelector { .. })
        ));

        let unknown_key = RuleSet::from_toml_str("[[rule]]\nselector = \"//html:a\"\ncolour = 1\n");
        assert!(matches!(unknown_key, Err(RewriteError::Config(_))));
    }

    #[test]
    fn test_rules_rewrite_fragment() {
        let rule_set = RuleSet::from_toml_str(
            r#"
            [[rule]]
            selector = "//html:a"
            set_attributes = { href = "/new" }
            remove_attributes = ["target"]

            [[rule]]
            selector = "//html:script"
            remove = true
            "#,
        )
        .unwrap();

        let mut rewriter = TagRewriter::new();
        rule_set.register_into(&mut rewriter);

        let html = rewriter
            .process_body_fragment(
                r#"<a href="/old" target="_blank">x</a><script>alert(1)</script><p>kept</p>"#,
            )
            .unwrap();
        assert_eq!(html, r#"<a href="/new">x</a><p>kept</p>"#);
    }

    #[test]
    fn test_empty_rule_file() {
        let rule_set = RuleSet::from_toml_str("").unwrap();
        assert!(rule_set.is_empty());
    }
}
