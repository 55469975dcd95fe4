//! # Cursor 模块
//!
//! 不可变源字符串 + 偏移量的扫描游标，以及成对符号读取器。
//!
//! 所有扫描函数按值接收 [`Cursor`]，成功时返回 `(结果, 新游标)`，
//! 失败时返回 `None`。调用方手里的旧游标始终不变，回溯只需丢弃新游标。

/// 扫描游标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor<'a> {
    source: &'a str,
    pos: usize,
    /// `source` 每个字节在最外层表达式中的偏移，末尾多一项（子表达式用）
    offsets: Option<&'a [usize]>,
}

impl<'a> Cursor<'a> {
    /// 从字符串开头创建游标
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            offsets: None,
        }
    }

    /// 完整源字符串
    pub fn source(&self) -> &'a str {
        self.source
    }

    /// 已消费的部分
    pub fn consumed(&self) -> &'a str {
        &self.source[..self.pos]
    }

    /// 剩余未消费的部分
    pub fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    /// 当前位置在最外层表达式中的字节偏移
    pub fn offset(&self) -> usize {
        self.offset_at(self.pos)
    }

    fn offset_at(&self, pos: usize) -> usize {
        match self.offsets {
            Some(offsets) => offsets[pos],
            None => pos,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.source.len()
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// 前进 `bytes` 个字节（调用方保证落在字符边界上）
    pub fn advance(self, bytes: usize) -> Self {
        Self {
            pos: (self.pos + bytes).min(self.source.len()),
            ..self
        }
    }

    /// 消费满足条件的最长前缀
    pub fn skip_while(self, pred: impl Fn(char) -> bool) -> (&'a str, Self) {
        let rest = self.rest();
        let len = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        (&rest[..len], self.advance(len))
    }

    pub fn skip_whitespace(self) -> Self {
        self.skip_while(char::is_whitespace).1
    }

    /// 消费指定字符
    pub fn eat(self, c: char) -> Option<Self> {
        self.rest()
            .starts_with(c)
            .then(|| self.advance(c.len_utf8()))
    }

    /// 消费指定字符串
    pub fn eat_str(self, s: &str) -> Option<Self> {
        self.rest().starts_with(s).then(|| self.advance(s.len()))
    }
}

/// 成对符号之间的内容
///
/// 去掉转义反斜杠后，内容与原文不再逐字节对应，因此附带每个字节在
/// 最外层表达式中的偏移，子表达式报错时仍能指向原文位置。
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Enclosed {
    text: String,
    offsets: Vec<usize>,
}

impl Enclosed {
    pub(crate) fn into_text(self) -> String {
        self.text
    }

    /// 指向内容开头的游标
    pub(crate) fn cursor(&self) -> Cursor<'_> {
        Cursor {
            source: &self.text,
            pos: 0,
            offsets: Some(&self.offsets),
        }
    }

    fn push(&mut self, c: char, offset: usize) {
        self.text.push(c);
        self.offsets.extend((0..c.len_utf8()).map(|k| offset + k));
    }
}

/// 读取成对符号之间的内容
///
/// 游标首字符必须是 `left`。返回两分隔符之间（不含分隔符）的文本，
/// 新游标位于闭合符之后。
///
/// - `left != right` 时按层数匹配嵌套，且单引号字符串内的分隔符不计数
/// - `left == right` 时遇到下一个未转义的分隔符即结束
/// - 反斜杠紧跟分隔符时视为转义：分隔符不参与匹配，反斜杠被去掉
///
/// 首字符不是 `left` 或找不到匹配的闭合符时返回 `None`。
pub fn read_paired_symbol(
    cursor: Cursor<'_>,
    left: char,
    right: char,
) -> Option<(String, Cursor<'_>)> {
    read_enclosed(cursor, left, right).map(|(enclosed, rest)| (enclosed.into_text(), rest))
}

/// 同 [`read_paired_symbol`]，但保留内容到原文的偏移映射
pub(crate) fn read_enclosed(
    cursor: Cursor<'_>,
    left: char,
    right: char,
) -> Option<(Enclosed, Cursor<'_>)> {
    let rest = cursor.rest();
    let mut chars = rest.char_indices().peekable();
    match chars.next() {
        Some((_, c)) if c == left => {}
        _ => return None,
    }

    let at = |i: usize| cursor.offset_at(cursor.pos + i);
    let track_quotes = left != right && left != '\'' && right != '\'';
    let mut content = Enclosed {
        text: String::new(),
        offsets: Vec::new(),
    };
    let mut depth = 0usize;
    let mut in_quote = false;

    while let Some((i, c)) = chars.next() {
        if c == '\\' {
            match chars.peek().copied() {
                // 引号内的转义原样保留，交给字符串读取器处理
                Some((j, next)) if in_quote => {
                    content.push(c, at(i));
                    content.push(next, at(j));
                    chars.next();
                }
                Some((j, next)) if next == left || next == right => {
                    content.push(next, at(j));
                    chars.next();
                }
                _ => content.push(c, at(i)),
            }
            continue;
        }

        if track_quotes && c == '\'' {
            in_quote = !in_quote;
            content.push(c, at(i));
            continue;
        }
        if in_quote {
            content.push(c, at(i));
            continue;
        }

        if c == right {
            if depth == 0 {
                content.offsets.push(at(i));
                return Some((content, cursor.advance(i + c.len_utf8())));
            }
            depth -= 1;
        } else if c == left {
            depth += 1;
        }
        content.push(c, at(i));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(expr: &str, left: char, right: char) -> Option<(String, &str)> {
        read_paired_symbol(Cursor::new(expr), left, right).map(|(s, c)| (s, c.rest()))
    }

    #[test]
    fn test_read_paired_symbol() {
        let cases = [
            ("'true '+'a'", "true ", "+'a'", '\'', '\''),
            ("((0+1)/(2-1)*9)%2", "(0+1)/(2-1)*9", "%2", '(', ')'),
            ("[1]['a']", "1", "['a']", '[', ']'),
            ("[(A)$[1]]", "(A)$[1]", "", '[', ']'),
            ("''x", "", "x", '\'', '\''),
        ];
        for (expr, val, last, left, right) in cases {
            assert_eq!(
                read(expr, left, right),
                Some((val.to_string(), last)),
                "expr: {expr:?}"
            );
        }
    }

    #[test]
    fn test_read_paired_symbol_no_match() {
        assert_eq!(read("", '(', ')'), None);
        assert_eq!(read("x(1)", '(', ')'), None);
        assert_eq!(read("((1)", '(', ')'), None);
        assert_eq!(read("'abc", '\'', '\''), None);
    }

    #[test]
    fn test_no_match_leaves_cursor_unchanged() {
        let cursor = Cursor::new("(1");
        assert!(read_paired_symbol(cursor, '(', ')').is_none());
        assert_eq!(cursor.rest(), "(1");
        assert_eq!(cursor.offset(), 0);
    }

    #[test]
    fn test_escaped_delimiter() {
        assert_eq!(
            read(r"'it\'s' rest", '\'', '\''),
            Some(("it's".to_string(), " rest"))
        );
        assert_eq!(read(r"(a\)b)", '(', ')'), Some(("a)b".to_string(), "")));
        // 非分隔符前的反斜杠保留
        assert_eq!(read(r"'a\nb'", '\'', '\''), Some((r"a\nb".to_string(), "")));
    }

    #[test]
    fn test_quotes_inside_group() {
        assert_eq!(read("(')')+1", '(', ')'), Some(("')'".to_string(), "+1")));
        assert_eq!(
            read(r"('a\'(' ) x", '(', ')'),
            Some((r"'a\'(' ".to_string(), " x"))
        );
    }

    #[test]
    fn test_consumed_plus_rest_is_source() {
        for expr in ["'x'+'y'", "(1)(2)", "[[1]]z"] {
            let cursor = Cursor::new(expr);
            let left = expr.chars().next().unwrap();
            let right = match left {
                '(' => ')',
                '[' => ']',
                c => c,
            };
            let (_, after) = read_paired_symbol(cursor, left, right).unwrap();
            assert_eq!(after.consumed().len() + after.rest().len(), expr.len());
            assert!(expr.ends_with(after.rest()));
        }
    }

    #[test]
    fn test_enclosed_offsets_follow_source() {
        let expr = r"x(a\)b)";
        let (enclosed, _) = read_enclosed(Cursor::new(expr).advance(1), '(', ')').unwrap();
        assert_eq!(enclosed.cursor().source(), "a)b");

        let inner = enclosed.cursor();
        assert_eq!(inner.offset(), 2);
        // 被去掉的反斜杠不影响后续偏移
        assert_eq!(inner.advance(1).offset(), 4);
        assert_eq!(inner.advance(2).offset(), 5);
        assert_eq!(inner.advance(3).offset(), 6);
        assert_eq!(&expr[6..7], ")");
    }

    #[test]
    fn test_nested_enclosed_offsets() {
        let expr = r"[(\]1)]";
        let (outer, _) = read_enclosed(Cursor::new(expr), '[', ']').unwrap();
        assert_eq!(outer.cursor().source(), "(]1)");
        let (inner, _) = read_enclosed(outer.cursor(), '(', ')').unwrap();
        assert_eq!(inner.cursor().source(), "]1");
        assert_eq!(inner.cursor().offset(), 3);
        assert_eq!(inner.cursor().advance(1).offset(), 4);
        assert_eq!(&expr[4..5], "1");
    }

    #[test]
    fn test_cursor_helpers() {
        let cursor = Cursor::new("  !!$");
        let cursor = cursor.skip_whitespace();
        assert_eq!(cursor.offset(), 2);
        let (bangs, cursor) = cursor.skip_while(|c| c == '!');
        assert_eq!(bangs, "!!");
        assert!(cursor.eat('x').is_none());
        let cursor = cursor.eat('$').unwrap();
        assert!(cursor.is_empty());
        assert_eq!(cursor.peek(), None);
        assert_eq!(cursor.consumed(), "  !!$");
    }
}
