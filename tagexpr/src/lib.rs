//! # tagexpr
//!
//! 嵌入在字段标注中的迷你表达式语言：扫描、解析与求值。
//!
//! ## 架构概述
//!
//! 表达式只编译一次，之后可以对不同的宿主值反复求值：
//!
//! ```text
//! 表达式文本 ──parse──► ExprNode ──run(env)──► Value
//!                          │
//!                          └── 不可变，可跨线程共享
//! ```
//!
//! 选择器（`$`、`(field)$`、`$[0]['k']`）在求值时交给调用方提供的
//! [`Environment`] 解析，本库不关心宿主结构如何反射。
//!
//! ## 使用示例
//!
//! ```ignore
//! use tagexpr::{JsonEnv, TagExpr};
//!
//! let expr = TagExpr::parse("$>0 && $<10 && len((Name)$) > 0")?;
//! let host = serde_json::json!({ "Count": 3, "Name": "a" });
//! let ok = expr.run_bool(&JsonEnv::new(&host).with_current("Count"))?;
//! ```
//!
//! ## 模块结构
//!
//! - [`cursor`]：扫描游标与成对符号读取
//! - [`parser`]：字面量读取、选择器解析、表达式解析
//! - [`expr`]：AST 定义与求值器
//! - [`value`]：求值结果类型
//! - [`json_env`]：基于 JSON 的求值环境
//! - [`config`]：解析器配置
//! - [`error`]：错误类型定义

pub mod config;
pub mod cursor;
pub mod error;
pub mod expr;
pub mod json_env;
pub mod parser;
pub mod tag_expr;
pub mod value;

// 重导出核心类型
pub use config::ParserConfig;
pub use cursor::{Cursor, read_paired_symbol};
pub use error::{EvalError, ParseError, ParseErrorKind, TagExprError, TagExprResult};
pub use expr::{
    BinaryOp, Builtin, Environment, ExprNode, Selector, UnaryOp, evaluate, evaluate_to_bool,
};
pub use json_env::JsonEnv;
pub use parser::{
    find_selector, parse_expression, parse_prefix, parse_with_config, read_bool_expr_node,
    read_digital_expr_node, read_string_expr_node,
};
pub use tag_expr::TagExpr;
pub use value::Value;

/// 解析表达式（默认配置）
pub fn parse(expression: &str) -> Result<ExprNode, ParseError> {
    parse_expression(expression)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_accessible() {
        let _node = parse("$ > 0").unwrap();
        let _config = ParserConfig::default();
        let _value = Value::from(1);
        let _cursor = Cursor::new("$");
        let _expr = TagExpr::parse("true").unwrap();
    }

    #[test]
    fn test_compiled_expression_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ExprNode>();
        assert_send_sync::<TagExpr>();
        assert_send_sync::<JsonEnv<'static>>();
    }
}
