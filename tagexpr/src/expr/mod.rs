//! # 表达式模块
//!
//! 定义表达式 AST 节点与求值器。
//!
//! ## 设计原则
//!
//! - AST 构造后**不可变**，可被多个线程并发求值
//! - 求值是**无副作用**的，只通过 [`Environment`] 读取宿主数据
//! - 所有节点种类是封闭的枚举，新增运算符只需补充 match 分支
//!
//! ## 运算符优先级（由低到高）
//!
//! | 优先级 | 运算符 |
//! |--------|--------|
//! | 1 | `\|\|` |
//! | 2 | `&&` |
//! | 3 | `==` `!=` `>` `>=` `<` `<=` |
//! | 4 | `+` `-` |
//! | 5 | `*` `/` `%` |
//!
//! 一元 `!` 绑定最紧。

mod eval;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use eval::{Environment, evaluate, evaluate_to_bool};

/// 选择器中引用"当前值"的符号
pub const BASE_SELECTOR: &str = "$";

/// 表达式 AST 节点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprNode {
    /// 布尔字面量（前缀 `!` 已在解析时折叠）
    BoolLiteral(bool),

    /// 数字字面量
    NumberLiteral(f64),

    /// 字符串字面量
    StringLiteral(String),

    /// 选择器引用
    Selector(Selector),

    /// 一元运算
    Unary {
        op: UnaryOp,
        operand: Box<ExprNode>,
    },

    /// 二元运算
    Binary {
        op: BinaryOp,
        left: Box<ExprNode>,
        right: Box<ExprNode>,
    },

    /// 内置函数调用
    Call { func: Builtin, args: Vec<ExprNode> },
}

impl ExprNode {
    /// 创建布尔字面量
    pub fn bool(b: bool) -> Self {
        Self::BoolLiteral(b)
    }

    /// 创建数字字面量
    pub fn number(n: f64) -> Self {
        Self::NumberLiteral(n)
    }

    /// 创建字符串字面量
    pub fn string(s: impl Into<String>) -> Self {
        Self::StringLiteral(s.into())
    }

    /// 创建逻辑非
    #[allow(clippy::should_implement_trait)]
    pub fn not(operand: ExprNode) -> Self {
        Self::Unary {
            op: UnaryOp::Not,
            operand: Box::new(operand),
        }
    }

    /// 创建二元运算
    pub fn binary(op: BinaryOp, left: ExprNode, right: ExprNode) -> Self {
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// 是否为常量（不依赖求值环境）
    pub fn is_constant(&self) -> bool {
        match self {
            Self::BoolLiteral(_) | Self::NumberLiteral(_) | Self::StringLiteral(_) => true,
            Self::Selector(_) => false,
            Self::Unary { operand, .. } => operand.is_constant(),
            Self::Binary { left, right, .. } => left.is_constant() && right.is_constant(),
            Self::Call { args, .. } => args.iter().all(ExprNode::is_constant),
        }
    }
}

/// 一元运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// 逻辑非
    Not,
}

/// 二元运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    NotEq,
    Gt,
    Ge,
    Lt,
    Le,
    And,
    Or,
}

impl BinaryOp {
    /// 按最长匹配排列，双字符运算符在前
    const TOKENS: [(&'static str, BinaryOp); 13] = [
        ("&&", BinaryOp::And),
        ("||", BinaryOp::Or),
        ("==", BinaryOp::Eq),
        ("!=", BinaryOp::NotEq),
        (">=", BinaryOp::Ge),
        ("<=", BinaryOp::Le),
        (">", BinaryOp::Gt),
        ("<", BinaryOp::Lt),
        ("+", BinaryOp::Add),
        ("-", BinaryOp::Sub),
        ("*", BinaryOp::Mul),
        ("/", BinaryOp::Div),
        ("%", BinaryOp::Rem),
    ];

    /// 识别文本开头的运算符，返回运算符与其字节长度
    pub fn lex(text: &str) -> Option<(Self, usize)> {
        Self::TOKENS
            .iter()
            .find(|(token, _)| text.starts_with(token))
            .map(|(token, op)| (*op, token.len()))
    }

    /// 运算符的源码形式
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::And => "&&",
            Self::Or => "||",
        }
    }

    /// 绑定强度，数值越大绑定越紧
    pub fn precedence(self) -> u8 {
        match self {
            Self::Or => 1,
            Self::And => 2,
            Self::Eq | Self::NotEq | Self::Gt | Self::Ge | Self::Lt | Self::Le => 3,
            Self::Add | Self::Sub => 4,
            Self::Mul | Self::Div | Self::Rem => 5,
        }
    }
}

/// 内置函数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Builtin {
    /// `len(x)`：字符串长度，或选择器所选值的长度
    Len,
    /// `in(x, a, b, ...)`：`x` 是否等于其余参数之一
    In,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "len" => Some(Self::Len),
            "in" => Some(Self::In),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Len => "len",
            Self::In => "in",
        }
    }

    /// 参数个数是否合法
    pub fn accepts(self, arity: usize) -> bool {
        match self {
            Self::Len => arity == 1,
            Self::In => arity >= 2,
        }
    }
}

/// 选择器描述
///
/// 形如 `[!...][(field)]$[sub1][sub2]...`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selector {
    /// 字段名（可以是 `a.b` 形式的路径），缺省表示当前字段
    pub field: Option<String>,

    /// 引用符号，目前恒为 `$`
    pub name: String,

    /// 方括号内的原始子表达式文本
    sub_selector: Vec<String>,

    /// 前缀 `!` 折叠后的结果：偶数个为 `Some(true)`，奇数个为 `Some(false)`
    pub bool_prefix: Option<bool>,

    /// 与 `sub_selector` 一一对应的已解析子表达式
    sub_exprs: Vec<ExprNode>,
}

impl Selector {
    /// 创建不带子选择器的选择器
    pub fn new(field: Option<&str>) -> Self {
        Self {
            field: field.map(str::to_string),
            name: BASE_SELECTOR.to_string(),
            sub_selector: Vec::new(),
            bool_prefix: None,
            sub_exprs: Vec::new(),
        }
    }

    /// 追加一级子选择器：原始文本与其解析结果成对保存
    pub fn with_sub_selector(mut self, text: impl Into<String>, expr: ExprNode) -> Self {
        self.sub_selector.push(text.into());
        self.sub_exprs.push(expr);
        self
    }

    /// 方括号内的原始文本
    pub fn sub_selector(&self) -> &[String] {
        &self.sub_selector
    }

    /// 已解析的子表达式
    pub fn sub_exprs(&self) -> &[ExprNode] {
        &self.sub_exprs
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bool_prefix {
            Some(true) => f.write_str("!!")?,
            Some(false) => f.write_str("!")?,
            None => {}
        }
        if let Some(field) = &self.field {
            write!(f, "({})", field)?;
        }
        f.write_str(&self.name)?;
        for sub in &self.sub_selector {
            write!(f, "[{}]", sub)?;
        }
        Ok(())
    }
}

impl fmt::Display for ExprNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BoolLiteral(b) => write!(f, "{}", b),
            Self::NumberLiteral(n) => write!(f, "{}", n),
            Self::StringLiteral(s) => write!(f, "'{}'", s.replace('\'', "\\'")),
            Self::Selector(selector) => write!(f, "{}", selector),
            Self::Unary {
                op: UnaryOp::Not,
                operand,
            } => match operand.as_ref() {
                Self::Binary { .. } => write!(f, "!{}", operand),
                _ => write!(f, "!({})", operand),
            },
            Self::Binary { op, left, right } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
            Self::Call { func, args } => {
                write!(f, "{}(", func.name())?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
        }
    }
}
