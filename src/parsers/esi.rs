//! ESI 标签处理模块
//!
//! ESI（Edge Side Includes）标签在 HTML5 解析过程中会遇到几个问题：
//!
//! - **自闭合语法**: `<esi:include src="..." />` 在 HTML5 中并不存在自闭合形式，
//!   解析器会把它当作开始标签，之后的所有内容都会被嵌套进这个元素
//! - **任意交错**: ESI 的开始标签和结束标签可以跨越 HTML 元素边界，
//!   HTML5 解析器会“修复”这种结构，从而破坏 ESI 的语义
//! - **属性保真**: 上游组件（缓存代理、CDN）按纯文本处理 ESI，
//!   任何转换（例如把 `&` 编码为 `&amp;`）都会让它无法正确解析
//!
//! 因此在解析前把每个 ESI 标签（开始、结束或自闭合）单独包装进一个 HTML 注释，
//! 序列化之后再原样还原。
//!
//! 注意：处理期间 ESI 标签在 DOM 中以注释节点而不是元素出现。
//! 如果处理器移动或删除了这些注释节点，最终结果可能与预期不符。

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// 包装 ESI 标签时使用的注释前缀
pub const COMMENT_PREFIX: &str = "esi html5-tagrewriter ";

// The [^>]*? part does not understand quoting, so a ">" inside an attribute
// value (e.g. <esi:include src="a>b" />) ends the match early.
static ESI_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(/?)esi:([a-z]+)([^>]*?)(/?)>").unwrap());

static MASKED_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?s)<!--{}(.+?)-->", regex::escape(COMMENT_PREFIX))).unwrap()
});

/// 在 HTML5 解析与序列化过程中原样保留 ESI 标签
#[derive(Clone, Copy, Debug, Default)]
pub struct EsiTagProcessor;

impl EsiTagProcessor {
    pub fn new() -> Self {
        EsiTagProcessor
    }

    /// 把所有 ESI 标签包装进 HTML 注释
    ///
    /// 每个标签都会变成 `<!--esi html5-tagrewriter <原始标签>-->`，
    /// 开始标签与结束标签各自独立包装，不需要成对出现。
    pub fn pre_process(&self, html: &str) -> String {
        ESI_TAG_RE
            .replace_all(html, |caps: &Captures| {
                format!("<!--{}{}-->", COMMENT_PREFIX, &caps[0])
            })
            .into_owned()
    }

    /// 从注释中还原原始 ESI 标签
    pub fn post_process(&self, html: &str) -> String {
        MASKED_TAG_RE
            .replace_all(html, |caps: &Captures| caps[1].to_string())
            .into_owned()
    }

    /// 统计文本中可以被包装的 ESI 标签数量
    pub fn count_tags(&self, html: &str) -> usize {
        ESI_TAG_RE.find_iter(html).count()
    }
}
