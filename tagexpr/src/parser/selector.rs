//! # 选择器解析
//!
//! 语法：`"!"* ["(" field ")"] "$" ("[" expr "]")*`
//!
//! 任一步结构无效时整个选择器不匹配，调用方的游标保持不变，
//! 以便尝试其他产生式。方括号内容不是合法表达式时直接报错。

use super::{Parser, is_ident_char, is_identifier, token_at};
use crate::config::ParserConfig;
use crate::cursor::{Cursor, read_enclosed, read_paired_symbol};
use crate::error::ParseError;
use crate::expr::{BASE_SELECTOR, Selector};

/// 使用默认配置查找选择器
pub fn find_selector(cursor: Cursor<'_>) -> Option<(Selector, Cursor<'_>)> {
    let config = ParserConfig::default();
    Parser::new(&config).find_selector(cursor)
}

/// 字段名：以 `.` 分隔的标识符路径
fn is_field_path(field: &str) -> bool {
    field.split('.').all(is_identifier)
}

/// 选择器之后不允许紧跟的字符
fn blocks_selector_end(c: char) -> bool {
    is_ident_char(c) || matches!(c, '(' | '$' | '\'' | '.')
}

impl Parser<'_> {
    pub(crate) fn find_selector<'a>(&self, cursor: Cursor<'a>) -> Option<(Selector, Cursor<'a>)> {
        self.scan_selector(cursor).ok().flatten()
    }

    /// 扫描选择器
    ///
    /// `Ok(None)` 表示此处不是选择器；方括号内容解析失败时返回错误，
    /// 调用方不应再从同一位置重试。
    pub(crate) fn scan_selector<'a>(
        &self,
        cursor: Cursor<'a>,
    ) -> Result<Option<(Selector, Cursor<'a>)>, ParseError> {
        // 1. 前缀 `!`
        let (bangs, mut cur) = cursor.skip_while(|c| c == '!');
        let bool_prefix = (!bangs.is_empty()).then_some(bangs.len() % 2 == 0);

        // 2. 可选的字段名
        let mut field = None;
        if cur.peek() == Some('(') {
            let Some((name, rest)) = read_paired_symbol(cur, '(', ')') else {
                return Ok(None);
            };
            if !is_field_path(&name) {
                return Ok(None);
            }
            field = Some(name);
            cur = rest;
        }

        // 3. 基础选择器符号
        let symbol = cur;
        let Some(after) = cur.eat_str(BASE_SELECTOR) else {
            return Ok(None);
        };
        cur = after;

        // 4. 子选择器：每组方括号的内容必须是完整的表达式
        let mut selector = Selector::new(field.as_deref());
        selector.bool_prefix = bool_prefix;
        while cur.peek() == Some('[') {
            let Some((content, rest)) = read_enclosed(cur, '[', ']') else {
                return Ok(None);
            };
            let expr = self
                .nested(cur.offset())?
                .parse_all(content.cursor())
                .map_err(|e| match e {
                    ParseError::NestingTooDeep { .. } => e,
                    _ => ParseError::InvalidSelector {
                        offset: symbol.offset(),
                        text: token_at(symbol),
                    },
                })?;
            selector = selector.with_sub_selector(content.into_text(), expr);
            cur = rest;
        }

        if cur.peek().is_some_and(blocks_selector_end) {
            return Ok(None);
        }

        Ok(Some((selector, cur)))
    }
}
