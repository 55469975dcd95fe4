//! # 求值器
//!
//! 对 [`ExprNode`] 求值。字面量直接返回常量，选择器通过 [`Environment`]
//! 解析，运算符按以下规则处理类型：
//!
//! - 算术运算要求两侧都是数字；`+` 额外允许两个字符串拼接
//! - 比较运算只允许数字对数字、字符串对字符串；`==`/`!=` 还允许布尔对布尔
//! - `&&`/`||`/`!` 对非布尔值做真值转换，且 `&&`/`||` 短路求值
//! - 除数或模数为零时报错

use std::cmp::Ordering;

use tracing::trace;

use super::{BinaryOp, Builtin, ExprNode, Selector, UnaryOp};
use crate::error::EvalError;
use crate::value::Value;

/// 表达式求值环境
///
/// 由宿主提供，负责把选择器映射到具体的值。对同一宿主值与同一选择器，
/// 结果必须是确定的。
pub trait Environment {
    /// 解析选择器
    ///
    /// - `field`: 字段名，`None` 表示当前字段
    /// - `name`: 引用符号（`$`）
    /// - `sub_selector`: 已求值的子选择器，依次用于下钻
    ///
    /// 无法解析时返回 `None`。
    fn resolve(&self, field: Option<&str>, name: &str, sub_selector: &[Value]) -> Option<Value>;

    /// 选择器所选值的长度，供 `len()` 使用
    ///
    /// 默认实现只支持字符串（按字符计数）。
    fn length(&self, field: Option<&str>, name: &str, sub_selector: &[Value]) -> Option<usize> {
        match self.resolve(field, name, sub_selector)? {
            Value::String(s) => Some(s.chars().count()),
            _ => None,
        }
    }
}

/// 空环境：任何选择器都无法解析
impl Environment for () {
    fn resolve(&self, _field: Option<&str>, _name: &str, _sub_selector: &[Value]) -> Option<Value> {
        None
    }
}

impl<F> Environment for F
where
    F: Fn(Option<&str>, &str, &[Value]) -> Option<Value>,
{
    fn resolve(&self, field: Option<&str>, name: &str, sub_selector: &[Value]) -> Option<Value> {
        self(field, name, sub_selector)
    }
}

impl ExprNode {
    /// 在给定环境中求值
    pub fn run<E: Environment + ?Sized>(&self, env: &E) -> Result<Value, EvalError> {
        match self {
            ExprNode::BoolLiteral(b) => Ok(Value::Bool(*b)),
            ExprNode::NumberLiteral(n) => Ok(Value::Number(*n)),
            ExprNode::StringLiteral(s) => Ok(Value::String(s.clone())),
            ExprNode::Selector(selector) => selector.run(env),
            ExprNode::Unary {
                op: UnaryOp::Not,
                operand,
            } => Ok(Value::Bool(!operand.run(env)?.truthy())),
            ExprNode::Binary { op, left, right } => eval_binary(*op, left, right, env),
            ExprNode::Call { func, args } => eval_call(*func, args, env),
        }
    }
}

impl Selector {
    /// 解析选择器并应用布尔前缀
    pub fn run<E: Environment + ?Sized>(&self, env: &E) -> Result<Value, EvalError> {
        let sub_values = self.eval_sub_selector(env)?;
        trace!(selector = %self, sub_selector = ?sub_values, "解析选择器");

        let value = env
            .resolve(self.field.as_deref(), &self.name, &sub_values)
            .ok_or_else(|| self.unresolved())?;

        Ok(match self.bool_prefix {
            Some(keep) => Value::Bool(value.truthy() == keep),
            None => value,
        })
    }

    fn eval_sub_selector<E: Environment + ?Sized>(&self, env: &E) -> Result<Vec<Value>, EvalError> {
        self.sub_exprs.iter().map(|expr| expr.run(env)).collect()
    }

    fn unresolved(&self) -> EvalError {
        EvalError::UnresolvedSelector {
            selector: self.to_string(),
        }
    }
}

/// 对表达式求值
pub fn evaluate<E: Environment + ?Sized>(expr: &ExprNode, env: &E) -> Result<Value, EvalError> {
    expr.run(env)
}

/// 将表达式求值为布尔值
///
/// 便捷函数，用于校验谓词；非布尔结果按真值转换
pub fn evaluate_to_bool<E: Environment + ?Sized>(
    expr: &ExprNode,
    env: &E,
) -> Result<bool, EvalError> {
    Ok(expr.run(env)?.truthy())
}

fn eval_binary<E: Environment + ?Sized>(
    op: BinaryOp,
    left: &ExprNode,
    right: &ExprNode,
    env: &E,
) -> Result<Value, EvalError> {
    match op {
        // 短路求值
        BinaryOp::And => {
            if !left.run(env)?.truthy() {
                return Ok(Value::Bool(false));
            }
            Ok(Value::Bool(right.run(env)?.truthy()))
        }
        BinaryOp::Or => {
            if left.run(env)?.truthy() {
                return Ok(Value::Bool(true));
            }
            Ok(Value::Bool(right.run(env)?.truthy()))
        }
        _ => {
            let left_val = left.run(env)?;
            let right_val = right.run(env)?;
            apply_binary(op, left_val, right_val)
        }
    }
}

fn apply_binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, EvalError> {
    use Value::{Bool, Number, String};

    match (op, left, right) {
        (BinaryOp::Add, Number(a), Number(b)) => Ok(Number(a + b)),
        (BinaryOp::Add, String(a), String(b)) => Ok(String(a + &b)),
        (BinaryOp::Sub, Number(a), Number(b)) => Ok(Number(a - b)),
        (BinaryOp::Mul, Number(a), Number(b)) => Ok(Number(a * b)),
        (BinaryOp::Div | BinaryOp::Rem, Number(_), Number(b)) if b == 0.0 => {
            Err(EvalError::DivisionByZero {
                operator: op.symbol(),
            })
        }
        (BinaryOp::Div, Number(a), Number(b)) => Ok(Number(a / b)),
        (BinaryOp::Rem, Number(a), Number(b)) => Ok(Number(a % b)),

        (BinaryOp::Eq | BinaryOp::NotEq, Bool(a), Bool(b)) => {
            Ok(Bool((a == b) == (op == BinaryOp::Eq)))
        }
        (BinaryOp::Eq | BinaryOp::NotEq, Number(a), Number(b)) => {
            Ok(Bool((a == b) == (op == BinaryOp::Eq)))
        }
        (BinaryOp::Eq | BinaryOp::NotEq, String(a), String(b)) => {
            Ok(Bool((a == b) == (op == BinaryOp::Eq)))
        }

        (BinaryOp::Gt | BinaryOp::Ge | BinaryOp::Lt | BinaryOp::Le, Number(a), Number(b)) => {
            Ok(Bool(ordering_holds(op, a.partial_cmp(&b))))
        }
        (BinaryOp::Gt | BinaryOp::Ge | BinaryOp::Lt | BinaryOp::Le, String(a), String(b)) => {
            Ok(Bool(ordering_holds(op, Some(a.cmp(&b)))))
        }

        (op, left, right) => Err(EvalError::TypeMismatch {
            operator: op.symbol(),
            left: left.type_name(),
            right: right.type_name(),
        }),
    }
}

/// 判断比较结果是否满足运算符；无法比较（NaN）时恒为假
fn ordering_holds(op: BinaryOp, ordering: Option<Ordering>) -> bool {
    let Some(ordering) = ordering else {
        return false;
    };
    match op {
        BinaryOp::Gt => ordering == Ordering::Greater,
        BinaryOp::Ge => ordering != Ordering::Less,
        BinaryOp::Lt => ordering == Ordering::Less,
        BinaryOp::Le => ordering != Ordering::Greater,
        _ => false,
    }
}

fn eval_call<E: Environment + ?Sized>(
    func: Builtin,
    args: &[ExprNode],
    env: &E,
) -> Result<Value, EvalError> {
    match func {
        Builtin::Len => {
            let [arg] = args else {
                return Err(EvalError::InvalidArgument {
                    function: func.name(),
                    message: format!("需要 1 个参数，实际 {} 个", args.len()),
                });
            };
            // 选择器交给环境计算长度，以支持数组等非标量值
            if let ExprNode::Selector(selector) = arg
                && selector.bool_prefix.is_none()
            {
                let sub_values = selector.eval_sub_selector(env)?;
                let len = env
                    .length(selector.field.as_deref(), &selector.name, &sub_values)
                    .ok_or_else(|| selector.unresolved())?;
                return Ok(Value::Number(len as f64));
            }
            match arg.run(env)? {
                Value::String(s) => Ok(Value::Number(s.chars().count() as f64)),
                other => Err(EvalError::InvalidArgument {
                    function: func.name(),
                    message: format!("不支持 {} 类型", other.type_name()),
                }),
            }
        }
        Builtin::In => {
            let Some((needle, candidates)) = args.split_first() else {
                return Err(EvalError::InvalidArgument {
                    function: func.name(),
                    message: "缺少参数".to_string(),
                });
            };
            let needle = needle.run(env)?;
            for candidate in candidates {
                let candidate = candidate.run(env)?;
                // 不同类型不相等
                if needle == candidate {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }
    }
}
