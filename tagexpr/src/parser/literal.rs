//! # 字面量读取
//!
//! 每个读取函数只看游标开头：匹配成功返回 `(节点, 新游标)`，
//! 否则返回 `None`（不是错误）。

use super::is_ident_char;
use crate::cursor::{Cursor, read_paired_symbol};
use crate::expr::ExprNode;

/// 读取布尔字面量
///
/// 允许任意个前缀 `!`，按奇偶折叠为一次取反。关键字之后不能紧跟
/// 标识符字符，因此 `truex` 不匹配。
pub fn read_bool_expr_node(cursor: Cursor<'_>) -> Option<(ExprNode, Cursor<'_>)> {
    let (bangs, after) = cursor.skip_while(|c| c == '!');
    let (value, rest) = if let Some(rest) = after.eat_str("true") {
        (true, rest)
    } else if let Some(rest) = after.eat_str("false") {
        (false, rest)
    } else {
        return None;
    };

    if rest.peek().is_some_and(is_ident_char) {
        return None;
    }

    let negate = bangs.len() % 2 == 1;
    Some((ExprNode::BoolLiteral(value != negate), rest))
}

/// 读取数字字面量
///
/// 语法：`-? digit+ ("." digit+)?`。负号属于字面量本身，`-1` 是一个
/// 字面量而不是对 `1` 取负。数字后紧跟标识符字符、`.` 或 `$` 时不匹配
/// （例如 `1a`、`1.`）。
pub fn read_digital_expr_node(cursor: Cursor<'_>) -> Option<(ExprNode, Cursor<'_>)> {
    let text = cursor.rest();
    let bytes = text.as_bytes();
    let digits_from = |start: usize| {
        bytes[start..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let int_start = usize::from(bytes.first() == Some(&b'-'));
    let int_len = digits_from(int_start);
    if int_len == 0 {
        return None;
    }
    let mut end = int_start + int_len;

    if bytes.get(end) == Some(&b'.') {
        let frac_len = digits_from(end + 1);
        if frac_len > 0 {
            end += 1 + frac_len;
        }
    }

    if text[end..]
        .chars()
        .next()
        .is_some_and(|c| is_ident_char(c) || c == '.' || c == '$')
    {
        return None;
    }

    let value: f64 = text[..end].parse().ok()?;
    Some((ExprNode::NumberLiteral(value), cursor.advance(end)))
}

/// 读取单引号字符串字面量，`\'` 表示引号本身
pub fn read_string_expr_node(cursor: Cursor<'_>) -> Option<(ExprNode, Cursor<'_>)> {
    let (content, rest) = read_paired_symbol(cursor, '\'', '\'')?;
    Some((ExprNode::StringLiteral(content), rest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn test_read_bool_expr_node() {
        let cases = [
            ("false", false, ""),
            ("true", true, ""),
            ("true ", true, " "),
            ("!true&", false, "&"),
            ("!false|", true, "|"),
            ("!!!!false =", false, " ="),
            ("!!!true)", false, ")"),
        ];
        for (expr, val, last) in cases {
            let (node, rest) = read_bool_expr_node(Cursor::new(expr)).unwrap();
            assert_eq!(node.run(&()).unwrap(), Value::Bool(val), "expr: {expr:?}");
            assert_eq!(rest.rest(), last, "expr: {expr:?}");
        }
    }

    #[test]
    fn test_read_bool_expr_node_no_match() {
        for expr in ["truex", "false_", "True", "!", "", "$", "tru"] {
            assert!(read_bool_expr_node(Cursor::new(expr)).is_none(), "expr: {expr:?}");
        }
    }

    #[test]
    fn test_read_digital_expr_node() {
        let cases = [
            ("0.1 +1", 0.1, " +1"),
            ("-1\\1", -1.0, "\\1"),
            ("1", 1.0, ""),
            ("1.1", 1.1, ""),
            ("1.1/", 1.1, "/"),
            ("42)", 42.0, ")"),
            ("-0.5*2", -0.5, "*2"),
        ];
        for (expr, val, last) in cases {
            let (node, rest) = read_digital_expr_node(Cursor::new(expr)).unwrap();
            assert_eq!(node.run(&()).unwrap(), Value::Number(val), "expr: {expr:?}");
            assert_eq!(rest.rest(), last, "expr: {expr:?}");
        }
    }

    #[test]
    fn test_read_digital_expr_node_no_match() {
        for expr in ["1a", "1.", "1.2.3", "-", "-x", "+1", ".5", "", "2$"] {
            assert!(read_digital_expr_node(Cursor::new(expr)).is_none(), "expr: {expr:?}");
        }
    }

    #[test]
    fn test_read_string_expr_node() {
        let (node, rest) = read_string_expr_node(Cursor::new("'a b'+'c'")).unwrap();
        assert_eq!(node, ExprNode::string("a b"));
        assert_eq!(rest.rest(), "+'c'");

        let (node, _) = read_string_expr_node(Cursor::new(r"'it\'s'")).unwrap();
        assert_eq!(node, ExprNode::string("it's"));

        assert!(read_string_expr_node(Cursor::new("'open")).is_none());
        assert!(read_string_expr_node(Cursor::new("x'a'")).is_none());
    }

    #[test]
    fn test_consumed_plus_rest_is_source() {
        for expr in ["!!true && x", "-12.5 rest", "'q' tail"] {
            let cursor = Cursor::new(expr);
            let (_, rest) = read_bool_expr_node(cursor)
                .or_else(|| read_digital_expr_node(cursor))
                .or_else(|| read_string_expr_node(cursor))
                .unwrap();
            assert_eq!(rest.consumed().len() + rest.rest().len(), expr.len());
            assert!(expr.ends_with(rest.rest()));

            // 从剩余文本重新开始解析，结果与继续解析一致
            let fresh = Cursor::new(rest.rest()).skip_whitespace();
            assert_eq!(fresh.rest(), rest.skip_whitespace().rest());
        }
    }
}
