//! # 表达式解析器
//!
//! 递归下降 + 运算符优先级折叠，同级运算符左结合。
//!
//! 支持的语法:
//! - 字面量: `true`, `false`, `-1.5`, `'string'`
//! - 选择器: `$`, `(field)$`, `$[0]['key']`, `!(field)$`
//! - 一元: `!expr`
//! - 二元: `+ - * / %`, `== != > >= < <=`, `&& ||`
//! - 括号: `(expr)`
//! - 内置函数: `len(x)`, `in(x, a, b, ...)`

use super::{
    Parser, is_ident_char, is_ident_start, read_bool_expr_node, read_digital_expr_node,
    read_string_expr_node, token_at,
};
use crate::cursor::{Cursor, read_enclosed};
use crate::error::ParseError;
use crate::expr::{BinaryOp, Builtin, ExprNode};

type Parsed<'a> = Result<(ExprNode, Cursor<'a>), ParseError>;

impl Parser<'_> {
    /// 解析完整表达式，不允许尾随内容
    pub(crate) fn parse_all(&self, cursor: Cursor<'_>) -> Result<ExprNode, ParseError> {
        let (node, rest) = self.parse_expr(cursor, 0)?;
        let rest = rest.skip_whitespace();
        if rest.is_empty() {
            Ok(node)
        } else {
            Err(trailing_error(rest))
        }
    }

    /// 解析绑定强度不低于 `min_prec` 的二元表达式
    pub(crate) fn parse_expr<'a>(&self, cursor: Cursor<'a>, min_prec: u8) -> Parsed<'a> {
        let (mut left, mut cur) = self.parse_unary(cursor)?;

        loop {
            let at_op = cur.skip_whitespace();
            let Some((op, len)) = BinaryOp::lex(at_op.rest()) else {
                break;
            };
            if op.precedence() < min_prec {
                break;
            }

            let after = at_op.advance(len);
            if after.skip_whitespace().is_empty() {
                return Err(ParseError::IncompleteExpression {
                    offset: at_op.offset(),
                    message: format!("运算符 '{}' 缺少右操作数", op.symbol()),
                });
            }

            let (right, rest) = self.parse_expr(after, op.precedence() + 1)?;
            left = ExprNode::binary(op, left, right);
            cur = rest;
        }

        Ok((left, cur))
    }

    /// 解析 `"!"* primary`
    ///
    /// 布尔字面量与选择器自带 `!` 前缀，优先交给它们读取。每段连续的
    /// `!` 只在段首尝试一次，选择器的方括号内容不会被重复解析。
    fn parse_unary<'a>(&self, cursor: Cursor<'a>) -> Parsed<'a> {
        let mut cur = cursor.skip_whitespace();
        let mut bangs = 0usize;

        loop {
            if let Some((node, rest)) = read_bool_expr_node(cur) {
                return Ok((negate(node, bangs), rest));
            }
            if let Some((selector, rest)) = self.scan_selector(cur)? {
                return Ok((negate(ExprNode::Selector(selector), bangs), rest));
            }
            let (run, rest) = cur.skip_while(|c| c == '!');
            if run.is_empty() {
                break;
            }
            bangs += run.len();
            cur = rest.skip_whitespace();
        }

        let (node, rest) = self.parse_primary(cur)?;
        Ok((negate(node, bangs), rest))
    }

    /// 解析基本表达式
    fn parse_primary<'a>(&self, cur: Cursor<'a>) -> Parsed<'a> {
        let offset = cur.offset();

        let Some(c) = cur.peek() else {
            return Err(ParseError::IncompleteExpression {
                offset,
                message: "表达式意外结束".to_string(),
            });
        };

        match c {
            // 括号
            '(' => {
                let (inner, rest) = read_enclosed(cur, '(', ')')
                    .ok_or(ParseError::UnmatchedDelimiter { offset, delimiter: '(' })?;
                let node = self.nested(offset)?.parse_all(inner.cursor())?;
                Ok((node, rest))
            }

            // 字符串字面量
            '\'' => read_string_expr_node(cur).ok_or(ParseError::UnmatchedDelimiter {
                offset,
                delimiter: '\'',
            }),

            // 选择器已在 parse_unary 中尝试过，到这里说明结构无效
            '$' => Err(ParseError::InvalidSelector {
                offset,
                text: token_at(cur),
            }),

            // 数字
            _ if starts_number(cur) => {
                read_digital_expr_node(cur).ok_or_else(|| ParseError::InvalidLiteral {
                    offset,
                    literal: token_at(cur),
                })
            }

            // 内置函数
            c if is_ident_start(c) => self.parse_call(cur),

            ')' | ']' => Err(ParseError::UnmatchedDelimiter { offset, delimiter: c }),

            _ => Err(ParseError::UnexpectedToken {
                offset,
                token: token_at(cur),
            }),
        }
    }

    /// 解析 `name(arg, ...)`
    fn parse_call<'a>(&self, cur: Cursor<'a>) -> Parsed<'a> {
        let offset = cur.offset();
        let (name, after) = cur.skip_while(is_ident_char);

        let Some(func) = Builtin::from_name(name) else {
            return Err(ParseError::UnexpectedToken {
                offset,
                token: name.to_string(),
            });
        };

        let open = after.skip_whitespace();
        if open.peek() != Some('(') {
            return Err(ParseError::UnexpectedToken {
                offset,
                token: name.to_string(),
            });
        }

        let (inner, rest) = read_enclosed(open, '(', ')').ok_or(ParseError::UnmatchedDelimiter {
            offset: open.offset(),
            delimiter: '(',
        })?;
        let args = self.nested(open.offset())?.parse_args(inner.cursor())?;

        if !func.accepts(args.len()) {
            return Err(ParseError::UnexpectedToken {
                offset,
                token: format!("{}(..{} 个参数)", name, args.len()),
            });
        }

        Ok((ExprNode::Call { func, args }, rest))
    }

    /// 解析以 `,` 分隔的参数列表
    fn parse_args(&self, cursor: Cursor<'_>) -> Result<Vec<ExprNode>, ParseError> {
        let mut args = Vec::new();
        let mut cur = cursor.skip_whitespace();
        if cur.is_empty() {
            return Ok(args);
        }

        loop {
            let (arg, rest) = self.parse_expr(cur, 0)?;
            args.push(arg);

            let rest = rest.skip_whitespace();
            if rest.is_empty() {
                return Ok(args);
            }
            cur = rest.eat(',').ok_or_else(|| trailing_error(rest))?;
        }
    }
}

/// 应用 `bangs` 个前缀 `!`，按奇偶折叠
fn negate(node: ExprNode, bangs: usize) -> ExprNode {
    match bangs {
        0 => node,
        n if n % 2 == 1 => ExprNode::not(node),
        _ => ExprNode::not(ExprNode::not(node)),
    }
}

/// 当前位置是否像一个数字字面量（含负号）
fn starts_number(cur: Cursor<'_>) -> bool {
    match cur.peek() {
        Some('-') => cur.advance(1).peek().is_some_and(|d| d.is_ascii_digit()),
        Some(c) => c.is_ascii_digit(),
        None => false,
    }
}

/// 表达式结束后仍有内容时的错误
fn trailing_error(rest: Cursor<'_>) -> ParseError {
    let offset = rest.offset();
    match rest.peek() {
        Some(c @ (')' | ']')) => ParseError::UnmatchedDelimiter { offset, delimiter: c },
        Some('$') => ParseError::InvalidSelector {
            offset,
            text: token_at(rest),
        },
        _ => ParseError::UnexpectedToken {
            offset,
            token: token_at(rest),
        },
    }
}
