//! 错误类型
//!
//! 改写过程中的错误不会被引擎捕获：第一个错误会中止当前的
//! `process` / `process_body_fragment` 调用，并且不会产生任何部分输出。

use std::io;

use thiserror::Error;

use crate::parsers::xpath::XPathError;

/// 改写错误类型
#[derive(Error, Debug)]
pub enum RewriteError {
    /// 处理器提供的选择器无法编译或求值
    #[error("无效的选择器 `{selector}`: {source}")]
    InvalidSelector {
        selector: String,
        #[source]
        source: XPathError,
    },

    /// 处理器报告的错误
    #[error("处理器错误: {0}")]
    Handler(String),

    /// 处理器携带的底层错误
    #[error(transparent)]
    Custom(Box<dyn std::error::Error + Send + Sync>),

    /// 解析错误
    #[error("解析错误: {0}")]
    Parse(String),

    /// 序列化错误
    #[error("序列化错误: {0}")]
    Serialization(#[from] io::Error),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),
}

impl RewriteError {
    /// 由处理器构造错误
    pub fn handler(msg: impl Into<String>) -> Self {
        RewriteError::Handler(msg.into())
    }

    /// 包装任意底层错误
    pub fn custom<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        RewriteError::Custom(Box::new(error))
    }

    /// 错误是否来自处理器本身
    pub fn is_handler_error(&self) -> bool {
        matches!(self, RewriteError::Handler(_) | RewriteError::Custom(_))
    }

    /// 用于日志的错误类别
    pub fn category(&self) -> &'static str {
        match self {
            RewriteError::InvalidSelector { .. } => "selector",
            RewriteError::Handler(_) | RewriteError::Custom(_) => "handler",
            RewriteError::Parse(_) => "parse",
            RewriteError::Serialization(_) => "serialization",
            RewriteError::Config(_) => "config",
        }
    }
}

/// 改写结果类型
pub type RewriteResult<T> = Result<T, RewriteError>;
