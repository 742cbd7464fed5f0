// 集成测试公共模块
//
// 提供可配置的测试处理器和常用的测试文档

use std::cell::RefCell;
use std::rc::Rc;

use html5_tagrewriter::parsers::html::{get_node_name, get_text_content};
use html5_tagrewriter::{Handle, QueryScope, RewriteHandler, RewriteResult};

type MatchCallback = Box<dyn FnMut(&Handle) -> RewriteResult<()>>;
type AfterMatchesCallback = Box<dyn FnMut(&Handle, &QueryScope) -> RewriteResult<()>>;

/// 记录调用情况的处理器，可以附加回调
///
/// 注册时使用 `Rc<RefCell<_>>` 共享，处理结束后再读取计数。
/// 文档在处理结束后会被释放，所以匹配到的节点只记录名称和文本。
pub struct TestRewriteHandler {
    xpath: String,
    pub matched_names: Vec<String>,
    pub matched_texts: Vec<String>,
    pub match_call_count: usize,
    pub after_matches_call_count: usize,
    match_callback: Option<MatchCallback>,
    after_matches_callback: Option<AfterMatchesCallback>,
}

impl TestRewriteHandler {
    pub fn new(xpath: &str) -> Self {
        TestRewriteHandler {
            xpath: xpath.to_string(),
            matched_names: Vec::new(),
            matched_texts: Vec::new(),
            match_call_count: 0,
            after_matches_call_count: 0,
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

    pub fn shared(self) -> Rc<RefCell<TestRewriteHandler>> {
        Rc::new(RefCell::new(self))
    }
}

impl Default for TestRewriteHandler {
    fn default() -> Self {
        TestRewriteHandler::new("//html:*")
    }
}

impl RewriteHandler for TestRewriteHandler {
    fn applies_to(&self) -> String {
        self.xpath.clone()
    }

    fn on_match(&mut self, node: &Handle) -> RewriteResult<()> {
        self.match_call_count += 1;
        self.matched_names
            .push(get_node_name(node).unwrap_or_default().to_string());
        self.matched_texts.push(get_text_content(node));

        match self.match_callback.as_mut() {
            Some(callback) => callback(node),
            None => Ok(()),
        }
    }

    fn after_matches(&mut self, document: &Handle, scope: &QueryScope) -> RewriteResult<()> {
        self.after_matches_call_count += 1;

        match self.after_matches_callback.as_mut() {
            Some(callback) => callback(document, scope),
            None => Ok(()),
        }
    }
}

/// 带链接和 ESI 标签的完整文档
pub const DEMO_DOCUMENT: &str = r##"<!DOCTYPE html>
<html>
<body>
    <p><a href="#">link</a></p>
    <esi:include src="/footer" />
</body>
</html>"##;
