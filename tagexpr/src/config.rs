//! # Config 模块
//!
//! 解析器配置。可从 JSON 加载，缺省字段取默认值。

use serde::{Deserialize, Serialize};

/// 解析器配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// 括号 / 方括号 / 函数参数的最大嵌套层数
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// 是否允许表达式之后存在多余内容
    ///
    /// 为真时解析在第一个无法接续表达式的位置停止，剩余内容被忽略。
    #[serde(default)]
    pub allow_trailing: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            allow_trailing: false,
        }
    }
}

impl ParserConfig {
    /// 从 JSON 文本加载配置
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

fn default_max_depth() -> usize {
    64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let config = ParserConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ParserConfig::default());
        assert_eq!(config.max_depth, 64);
        assert!(!config.allow_trailing);
    }

    #[test]
    fn test_partial_json() {
        let config = ParserConfig::from_json_str(r#"{ "max_depth": 8 }"#).unwrap();
        assert_eq!(config.max_depth, 8);
        assert!(!config.allow_trailing);

        assert!(ParserConfig::from_json_str(r#"{ "max_depth": -1 }"#).is_err());
    }
}
