//! # Parser 模块
//!
//! 单遍扫描的递归下降表达式解析器（无独立的词法阶段）。
//!
//! ## 架构
//!
//! ```text
//! 表达式文本 → Cursor → [字面量读取 | 选择器 | 括号子表达式] → 按优先级折叠 → ExprNode
//! ```
//!
//! 扫描器失败只表示"此处不是该产生式"，游标原样保留，解析器可以继续
//! 尝试下一个产生式。只有在某个位置所有产生式都失败时才产生 [`ParseError`]。
//!
//! ## 模块结构
//!
//! - `literal`: 布尔 / 数字 / 字符串字面量读取
//! - `selector`: 选择器解析
//! - `expr_parser`: 运算符优先级驱动

mod expr_parser;
mod literal;
mod selector;


use tracing::debug;

use crate::config::ParserConfig;
use crate::cursor::Cursor;
use crate::error::ParseError;
use crate::expr::ExprNode;

pub use literal::{read_bool_expr_node, read_digital_expr_node, read_string_expr_node};
pub use selector::find_selector;

/// 解析完整表达式（默认配置）
pub fn parse_expression(input: &str) -> Result<ExprNode, ParseError> {
    parse_with_config(input, &ParserConfig::default())
}

/// 解析完整表达式
///
/// `config.allow_trailing` 为假时，表达式之后的多余内容视为错误。
pub fn parse_with_config(input: &str, config: &ParserConfig) -> Result<ExprNode, ParseError> {
    let parser = Parser::new(config);
    let result = if config.allow_trailing {
        parser
            .parse_expr(Cursor::new(input), 0)
            .map(|(node, _)| node)
    } else {
        parser.parse_all(Cursor::new(input))
    };

    match &result {
        Ok(_) => debug!(expr = input, "表达式编译完成"),
        Err(e) => debug!(expr = input, offset = e.offset(), error = %e, "表达式编译失败"),
    }
    result
}

/// 解析表达式前缀，返回 AST 与未消费的剩余文本
///
/// 剩余文本总是 `input` 的后缀，且不会跳过前导空白。
pub fn parse_prefix<'a>(
    input: &'a str,
    config: &ParserConfig,
) -> Result<(ExprNode, &'a str), ParseError> {
    let (node, rest) = Parser::new(config).parse_expr(Cursor::new(input), 0)?;
    Ok((node, rest.rest()))
}

/// 解析器状态：配置与当前嵌套深度
#[derive(Debug, Clone, Copy)]
pub(crate) struct Parser<'c> {
    config: &'c ParserConfig,
    depth: usize,
}

impl<'c> Parser<'c> {
    pub(crate) fn new(config: &'c ParserConfig) -> Self {
        Self { config, depth: 0 }
    }

    /// 进入下一层嵌套（括号、方括号、函数参数）
    fn nested(&self, offset: usize) -> Result<Self, ParseError> {
        let depth = self.depth + 1;
        if depth > self.config.max_depth {
            return Err(ParseError::NestingTooDeep {
                offset,
                max_depth: self.config.max_depth,
            });
        }
        Ok(Self {
            config: self.config,
            depth,
        })
    }
}

/// 标识符首字符
pub(crate) fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

/// 标识符后续字符
pub(crate) fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(is_ident_start) && chars.all(is_ident_char)
}

/// 错误信息中展示的符号：到下一个空白为止
fn token_at(cursor: Cursor<'_>) -> String {
    cursor
        .rest()
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_string()
}
