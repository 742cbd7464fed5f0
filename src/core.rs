use markup5ever_rcdom::Handle;
use tracing::{debug, trace};

use crate::error::{RewriteError, RewriteResult};
use crate::handler::{QueryScope, RewriteHandler};
use crate::parsers::esi::EsiTagProcessor;
use crate::parsers::html::{
    fragment_to_dom, html_to_dom, serialize_children, serialize_document,
};
use crate::parsers::xpath::XPath;

/// 用注册的处理器改写 HTML5 文档
///
/// 处理器按注册顺序执行，后注册的处理器能看到前面处理器做出的修改。
/// 每次 `process` / `process_body_fragment` 调用彼此独立。
///
/// 处理过程中 ESI 标签会被包装为注释节点，
/// 处理器不应移动或删除这些注释，否则无法原样还原。
///
/// # Examples
///
/// ```
/// use html5_tagrewriter::TagRewriter;
///
/// let mut rewriter = TagRewriter::new();
/// let html = rewriter.process_body_fragment(r#"<esi:include src="url" />"#).unwrap();
///
/// assert_eq!(html, r#"<esi:include src="url" />"#);
/// ```
#[derive(Default)]
pub struct TagRewriter {
    rewrite_handlers: Vec<Box<dyn RewriteHandler>>,
    esi_processor: EsiTagProcessor,
}

impl TagRewriter {
    pub fn new() -> Self {
        TagRewriter::default()
    }

    /// 追加一个处理器，同一个处理器注册两次就会执行两次
    pub fn register<H>(&mut self, handler: H)
    where
        H: RewriteHandler + 'static,
    {
        self.rewrite_handlers.push(Box::new(handler));
    }

    pub fn handler_count(&self) -> usize {
        self.rewrite_handlers.len()
    }

    /// 改写完整的 HTML5 文档
    ///
    /// 格式错误的标记按 HTML5 规则修复，不会产生错误。
    /// 处理器返回的第一个错误会中止处理，不产生任何输出。
    pub fn process(&mut self, html5: &str) -> RewriteResult<String> {
        debug!(
            handlers = self.rewrite_handlers.len(),
            bytes = html5.len(),
            "processing document"
        );

        let dom = html_to_dom(&self.esi_processor.pre_process(html5));

        self.apply_handlers(&dom.document, &dom.document)
            .inspect_err(|e| debug!(category = e.category(), "processing aborted: {e}"))?;

        Ok(self.esi_processor.post_process(&serialize_document(&dom)?))
    }

    /// 改写 `<body>` 片段
    ///
    /// 片段被当作紧跟在 `<body>` 开始标签之后的内容解析，
    /// 处理器只在 `<body>` 容器内查询，输出是容器的内部内容。
    /// 需要其他解析上下文（例如 `<table>` 内部）的片段不受支持。
    pub fn process_body_fragment(&mut self, html5_fragment: &str) -> RewriteResult<String> {
        debug!(
            handlers = self.rewrite_handlers.len(),
            bytes = html5_fragment.len(),
            "processing body fragment"
        );

        let fragment = fragment_to_dom(&self.esi_processor.pre_process(html5_fragment))?;

        self.apply_handlers(&fragment.dom.document, &fragment.body)
            .inspect_err(|e| debug!(category = e.category(), "processing aborted: {e}"))?;

        Ok(self
            .esi_processor
            .post_process(&serialize_children(&fragment.body)?))
    }

    /// 依次执行处理器
    ///
    /// 每个处理器先完整地求出匹配列表，再逐个调用 `on_match()`，
    /// 所以处理器自己的修改不会影响本轮匹配到的节点。
    fn apply_handlers(&mut self, document: &Handle, context: &Handle) -> RewriteResult<()> {
        let xpath = XPath::for_html();
        let scope = QueryScope::new(&xpath, context);

        for (index, handler) in self.rewrite_handlers.iter_mut().enumerate() {
            let selector = handler.applies_to();
            let expression =
                xpath
                    .compile(&selector)
                    .map_err(|source| RewriteError::InvalidSelector {
                        selector: selector.clone(),
                        source,
                    })?;

            let nodes = expression.select(context);
            trace!(
                handler = index,
                selector = %selector,
                matches = nodes.len(),
                "applying rewrite handler"
            );

            for node in &nodes {
                handler.on_match(node)?;
            }

            handler.after_matches(document, &scope)?;
        }

        Ok(())
    }
}
