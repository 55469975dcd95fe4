//! # Error 模块
//!
//! 定义 tagexpr 中使用的错误类型。
//!
//! - [`ParseError`]：编译期错误，总是带有出错位置（字节偏移）
//! - [`EvalError`]：求值期错误，每次求值单独产生

use thiserror::Error;

/// 解析错误
///
/// 扫描器层面的"未匹配"不是错误，只有表达式解析器在某个位置
/// 无法接受任何产生式时才会变成 `ParseError`。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// 成对分隔符不匹配（缺少闭合符，或多出闭合符）
    #[error("位置 {offset}：分隔符 '{delimiter}' 不匹配")]
    UnmatchedDelimiter { offset: usize, delimiter: char },

    /// 无效的字面量
    #[error("位置 {offset}：无效的字面量 '{literal}'")]
    InvalidLiteral { offset: usize, literal: String },

    /// 无效的选择器
    #[error("位置 {offset}：无效的选择器 '{text}'")]
    InvalidSelector { offset: usize, text: String },

    /// 意外的符号
    #[error("位置 {offset}：意外的符号 '{token}'")]
    UnexpectedToken { offset: usize, token: String },

    /// 表达式不完整
    #[error("位置 {offset}：表达式不完整 - {message}")]
    IncompleteExpression { offset: usize, message: String },

    /// 嵌套层数超过上限
    #[error("位置 {offset}：嵌套层数超过上限 {max_depth}")]
    NestingTooDeep { offset: usize, max_depth: usize },
}

/// 解析错误的种类（不携带位置信息）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    UnmatchedDelimiter,
    InvalidLiteral,
    InvalidSelector,
    UnexpectedToken,
    IncompleteExpression,
    NestingTooDeep,
}

impl ParseError {
    /// 出错位置（相对于原始表达式的字节偏移）
    pub fn offset(&self) -> usize {
        match self {
            Self::UnmatchedDelimiter { offset, .. }
            | Self::InvalidLiteral { offset, .. }
            | Self::InvalidSelector { offset, .. }
            | Self::UnexpectedToken { offset, .. }
            | Self::IncompleteExpression { offset, .. }
            | Self::NestingTooDeep { offset, .. } => *offset,
        }
    }

    /// 错误种类
    pub fn kind(&self) -> ParseErrorKind {
        match self {
            Self::UnmatchedDelimiter { .. } => ParseErrorKind::UnmatchedDelimiter,
            Self::InvalidLiteral { .. } => ParseErrorKind::InvalidLiteral,
            Self::InvalidSelector { .. } => ParseErrorKind::InvalidSelector,
            Self::UnexpectedToken { .. } => ParseErrorKind::UnexpectedToken,
            Self::IncompleteExpression { .. } => ParseErrorKind::IncompleteExpression,
            Self::NestingTooDeep { .. } => ParseErrorKind::NestingTooDeep,
        }
    }
}

/// 表达式求值错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// 选择器无法被求值环境解析
    #[error("选择器 '{selector}' 无法解析")]
    UnresolvedSelector { selector: String },

    /// 操作数类型不匹配
    #[error("类型不匹配: 运算符 '{operator}' 不支持 {left} 与 {right}")]
    TypeMismatch {
        operator: &'static str,
        left: &'static str,
        right: &'static str,
    },

    /// 除数为零
    #[error("运算符 '{operator}' 的除数为零")]
    DivisionByZero { operator: &'static str },

    /// 内置函数参数无效
    #[error("函数 '{function}' 参数无效: {message}")]
    InvalidArgument {
        function: &'static str,
        message: String,
    },
}

/// tagexpr 统一错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TagExprError {
    /// 解析错误
    #[error("解析错误: {0}")]
    Parse(#[from] ParseError),

    /// 求值错误
    #[error("求值错误: {0}")]
    Eval(#[from] EvalError),
}

/// Result 类型别名
pub type TagExprResult<T> = Result<T, TagExprError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_and_kind() {
        let err = ParseError::InvalidSelector {
            offset: 4,
            text: "$a".to_string(),
        };
        assert_eq!(err.offset(), 4);
        assert_eq!(err.kind(), ParseErrorKind::InvalidSelector);

        let err = ParseError::NestingTooDeep {
            offset: 9,
            max_depth: 2,
        };
        assert_eq!(err.offset(), 9);
        assert_eq!(err.kind(), ParseErrorKind::NestingTooDeep);
    }

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::UnmatchedDelimiter {
            offset: 0,
            delimiter: '(',
        };
        insta::assert_snapshot!(err.to_string(), @"位置 0：分隔符 '(' 不匹配");
    }

    #[test]
    fn test_eval_error_display() {
        let err = EvalError::TypeMismatch {
            operator: "+",
            left: "Number",
            right: "String",
        };
        assert!(err.to_string().contains("Number"));
        assert!(err.to_string().contains("String"));

        let err = EvalError::UnresolvedSelector {
            selector: "(A)$".to_string(),
        };
        assert!(err.to_string().contains("(A)$"));
    }

    #[test]
    fn test_unified_error_from() {
        let err: TagExprError = EvalError::DivisionByZero { operator: "/" }.into();
        assert!(matches!(err, TagExprError::Eval(_)));
        assert!(err.to_string().starts_with("求值错误"));
    }
}
