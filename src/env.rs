//! 统一的环境变量管理
//!
//! 提供类型安全、可验证的环境变量访问，命令行参数会覆盖这里的值。

use std::env;
use std::fmt;

use thiserror::Error;

/// 环境变量解析错误
#[derive(Error, Debug, Clone)]
#[error("Environment variable '{variable}': {message}")]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => {
                if let Some(default) = Self::DEFAULT {
                    Ok(default)
                } else {
                    Err(EnvError {
                        variable: Self::NAME.to_string(),
                        message: "Required environment variable not set".to_string(),
                    })
                }
            }
        }
    }

    fn get_or_default(default: T) -> T {
        Self::get().unwrap_or(default)
    }
}

/// 输入的解析方式
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProcessingMode {
    /// 完整文档
    #[default]
    Document,
    /// `<body>` 片段
    Fragment,
}

impl fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessingMode::Document => write!(f, "document"),
            ProcessingMode::Fragment => write!(f, "fragment"),
        }
    }
}

/// 核心环境变量定义
pub mod core {
    use super::*;

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "TAGREWRITER_LOG_LEVEL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("warn".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            match value.to_lowercase().as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => Ok(value.to_lowercase()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!(
                        "Invalid log level '{}'. Use: trace, debug, info, warn, error",
                        value
                    ),
                }),
            }
        }
    }

    /// 默认解析方式
    pub struct Mode;
    impl EnvVar<ProcessingMode> for Mode {
        const NAME: &'static str = "TAGREWRITER_MODE";
        const DEFAULT: Option<ProcessingMode> = Some(ProcessingMode::Document);
        const DESCRIPTION: &'static str = "How input is parsed: document, fragment";

        fn parse(value: &str) -> EnvResult<ProcessingMode> {
            match value.trim().to_lowercase().as_str() {
                "document" | "doc" => Ok(ProcessingMode::Document),
                "fragment" | "body" => Ok(ProcessingMode::Fragment),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!("Invalid mode '{}'. Use: document, fragment", value),
                }),
            }
        }
    }

    /// 禁用颜色输出
    pub struct NoColor;
    impl EnvVar<bool> for NoColor {
        const NAME: &'static str = "NO_COLOR";
        const DEFAULT: Option<bool> = Some(false);
        const DESCRIPTION: &'static str = "Disable colored output when set to any value";

        fn parse(value: &str) -> EnvResult<bool> {
            // NO_COLOR 遵循标准：任何值都表示禁用颜色
            Ok(!value.is_empty())
        }
    }
}

/// 从环境变量汇总的配置
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub log_level: String,
    pub mode: ProcessingMode,
    pub no_color: bool,
}

impl EnvConfig {
    pub fn from_env() -> EnvResult<Self> {
        Ok(EnvConfig {
            log_level: core::LogLevel::get()?,
            mode: core::Mode::get()?,
            no_color: core::NoColor::get()?,
        })
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        EnvConfig {
            log_level: "warn".to_string(),
            mode: ProcessingMode::Document,
            no_color: false,
        }
    }
}

/// 生成环境变量说明
pub fn generate_env_docs() -> String {
    let mut docs = String::new();

    docs.push_str("# Environment Variables\n\n");
    docs.push_str(&format!(
        "- `{}`: {} (default: warn)\n",
        core::LogLevel::NAME,
        core::LogLevel::DESCRIPTION
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {})\n",
        core::Mode::NAME,
        core::Mode::DESCRIPTION,
        ProcessingMode::default()
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        core::NoColor::NAME,
        core::NoColor::DESCRIPTION,
        core::NoColor::DEFAULT
    ));

    docs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(core::LogLevel::parse("DEBUG").unwrap(), "debug");
        assert!(core::LogLevel::parse("loud").is_err());
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!(core::Mode::parse("fragment").unwrap(), ProcessingMode::Fragment);
        assert_eq!(core::Mode::parse(" Document ").unwrap(), ProcessingMode::Document);
        assert_eq!(core::Mode::parse("body").unwrap(), ProcessingMode::Fragment);
        assert!(core::Mode::parse("table").is_err());
    }

    #[test]
    fn test_no_color_parsing() {
        assert!(core::NoColor::parse("1").unwrap());
        assert!(!core::NoColor::parse("").unwrap());
    }

    #[test]
    fn test_env_error_message() {
        let error = core::Mode::parse("table").unwrap_err();

        assert_eq!(
            error.to_string(),
            "Environment variable 'TAGREWRITER_MODE': Invalid mode 'table'. Use: document, fragment"
        );
    }

    #[test]
    fn test_env_docs_mention_every_variable() {
        let docs = generate_env_docs();

        assert!(docs.contains("TAGREWRITER_LOG_LEVEL"));
        assert!(docs.contains("TAGREWRITER_MODE"));
        assert!(docs.contains("NO_COLOR"));
    }
}
