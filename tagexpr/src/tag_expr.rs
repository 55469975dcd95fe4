//! # TagExpr
//!
//! 编译后的表达式句柄：保存原始文本与 AST，可反复求值。

use std::fmt;
use std::str::FromStr;

use crate::config::ParserConfig;
use crate::error::{EvalError, ParseError};
use crate::expr::{Environment, ExprNode};
use crate::parser::{parse_prefix, parse_with_config};
use crate::value::Value;

/// 编译后的表达式
///
/// AST 不可变，`TagExpr` 可以跨线程共享并发求值。
///
/// # Example
/// ```ignore
/// use tagexpr::{JsonEnv, TagExpr};
///
/// let expr = TagExpr::parse("$>0&&$<10")?;
/// let host = serde_json::json!({ "Count": 3 });
/// assert!(expr.run_bool(&JsonEnv::new(&host).with_current("Count"))?);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TagExpr {
    /// 原始表达式文本
    source: String,
    /// 解析后的 AST
    ast: ExprNode,
}

impl TagExpr {
    /// 解析表达式（默认配置）
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        Self::parse_with_config(source, &ParserConfig::default())
    }

    /// 解析表达式
    ///
    /// 允许尾随内容时只保存实际解析的前缀，尾随部分被丢弃。
    pub fn parse_with_config(source: &str, config: &ParserConfig) -> Result<Self, ParseError> {
        let (ast, rest) = if config.allow_trailing {
            parse_prefix(source, config)?
        } else {
            (parse_with_config(source, config)?, "")
        };
        Ok(Self {
            source: source[..source.len() - rest.len()].to_string(),
            ast,
        })
    }

    /// 原始表达式文本
    pub fn source(&self) -> &str {
        &self.source
    }

    /// 解析后的 AST
    pub fn ast(&self) -> &ExprNode {
        &self.ast
    }

    pub fn into_ast(self) -> ExprNode {
        self.ast
    }

    /// 在给定环境中求值
    pub fn run<E: Environment + ?Sized>(&self, env: &E) -> Result<Value, EvalError> {
        self.ast.run(env)
    }

    /// 求值并做真值转换
    pub fn run_bool<E: Environment + ?Sized>(&self, env: &E) -> Result<bool, EvalError> {
        Ok(self.run(env)?.truthy())
    }
}

impl FromStr for TagExpr {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TagExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_source() {
        let expr: TagExpr = " $ > 1 ".parse().unwrap();
        assert_eq!(expr.source(), " $ > 1 ");
        assert_eq!(expr.to_string(), " $ > 1 ");
        assert!(matches!(expr.ast(), ExprNode::Binary { .. }));
    }

    #[test]
    fn test_run_bool_uses_truthiness() {
        let expr = TagExpr::parse("'x' + $").unwrap();
        let env = |_: Option<&str>, _: &str, _: &[Value]| Some(Value::from(""));
        assert!(expr.run_bool(&env).unwrap());
        assert_eq!(expr.run(&env).unwrap(), Value::from("x"));
    }

    #[test]
    fn test_parse_error_is_returned() {
        assert!(TagExpr::parse("(1").is_err());
        let config = ParserConfig {
            allow_trailing: true,
            ..ParserConfig::default()
        };
        let expr = TagExpr::parse_with_config("1 )", &config).unwrap();
        assert_eq!(expr.into_ast(), ExprNode::number(1.0));
    }

    #[test]
    fn test_trailing_text_is_not_kept() {
        let config = ParserConfig {
            allow_trailing: true,
            ..ParserConfig::default()
        };
        let expr = TagExpr::parse_with_config(" $ > 1 && $ < 5 ; ignored", &config).unwrap();
        assert_eq!(expr.source(), " $ > 1 && $ < 5");
        assert_eq!(expr.to_string(), " $ > 1 && $ < 5");

        let whole = TagExpr::parse_with_config("$ > 1 ", &config).unwrap();
        assert_eq!(whole.source(), "$ > 1");
        assert_eq!(whole.ast(), TagExpr::parse("$ > 1").unwrap().ast());
    }
}
