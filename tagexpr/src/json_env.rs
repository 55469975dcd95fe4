//! # JSON 求值环境
//!
//! 以 `serde_json::Value` 作为宿主对象的 [`Environment`] 实现。
//!
//! - `$`：当前字段的值；未设置当前字段时为整个宿主对象
//! - `(a.b)$`：从宿主根对象按路径逐级取字段
//! - `[n]`：数组下标（非负整数）
//! - `['k']`：对象键
//!
//! `null` 与不存在的路径视为无法解析；数组与对象不是标量，
//! 只能通过 `len()` 取长度。

use serde_json::Value as Json;

use crate::expr::{BASE_SELECTOR, Environment};
use crate::value::Value;

/// 基于 JSON 的求值环境
#[derive(Debug, Clone, Copy)]
pub struct JsonEnv<'a> {
    host: &'a Json,
    current: Option<&'a str>,
}

impl<'a> JsonEnv<'a> {
    /// 以整个宿主对象作为当前值
    pub fn new(host: &'a Json) -> Self {
        Self {
            host,
            current: None,
        }
    }

    /// 设置当前字段（可以是 `a.b` 路径）
    pub fn with_current(mut self, field: &'a str) -> Self {
        self.current = Some(field);
        self
    }

    /// 选中的 JSON 节点
    fn select(&self, field: Option<&str>, name: &str, sub_selector: &[Value]) -> Option<&'a Json> {
        if name != BASE_SELECTOR {
            return None;
        }
        let start = match field.or(self.current) {
            Some(path) => walk(self.host, path)?,
            None => self.host,
        };
        sub_selector.iter().try_fold(start, descend)
    }
}

fn walk<'a>(root: &'a Json, path: &str) -> Option<&'a Json> {
    path.split('.').try_fold(root, |node, key| node.get(key))
}

fn descend<'a>(node: &'a Json, key: &Value) -> Option<&'a Json> {
    match key {
        Value::Number(n) if *n >= 0.0 && n.fract() == 0.0 => node.as_array()?.get(*n as usize),
        Value::String(s) => node.as_object()?.get(s),
        _ => None,
    }
}

impl Environment for JsonEnv<'_> {
    fn resolve(&self, field: Option<&str>, name: &str, sub_selector: &[Value]) -> Option<Value> {
        Value::from_json(self.select(field, name, sub_selector)?)
    }

    fn length(&self, field: Option<&str>, name: &str, sub_selector: &[Value]) -> Option<usize> {
        match self.select(field, name, sub_selector)? {
            Json::String(s) => Some(s.chars().count()),
            Json::Array(items) => Some(items.len()),
            Json::Object(map) => Some(map.len()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Selector;
    use serde_json::json;

    fn host() -> Json {
        json!({
            "Age": 30,
            "Name": "Alice",
            "Tags": ["a", "b", "c"],
            "Profile": { "Email": "a@example.com", "Scores": { "math": 90 } },
            "Nothing": null
        })
    }

    #[test]
    fn test_current_field() {
        let host = host();
        let env = JsonEnv::new(&host).with_current("Age");
        assert_eq!(env.resolve(None, "$", &[]), Some(Value::Number(30.0)));

        let env = JsonEnv::new(&host).with_current("Profile.Email");
        assert_eq!(env.resolve(None, "$", &[]), Some(Value::from("a@example.com")));
    }

    #[test]
    fn test_named_field_and_path() {
        let host = host();
        let env = JsonEnv::new(&host).with_current("Age");
        assert_eq!(env.resolve(Some("Name"), "$", &[]), Some(Value::from("Alice")));
        assert_eq!(
            env.resolve(Some("Profile.Scores"), "$", &[Value::from("math")]),
            Some(Value::Number(90.0))
        );
        assert_eq!(env.resolve(Some("Missing"), "$", &[]), None);
        assert_eq!(env.resolve(Some("Nothing"), "$", &[]), None);
    }

    #[test]
    fn test_sub_selector_descend() {
        let host = host();
        let env = JsonEnv::new(&host);
        assert_eq!(
            env.resolve(Some("Tags"), "$", &[Value::Number(1.0)]),
            Some(Value::from("b"))
        );
        assert_eq!(env.resolve(Some("Tags"), "$", &[Value::Number(3.0)]), None);
        assert_eq!(env.resolve(Some("Tags"), "$", &[Value::Number(0.5)]), None);
        assert_eq!(env.resolve(Some("Tags"), "$", &[Value::Number(-1.0)]), None);
        assert_eq!(env.resolve(Some("Tags"), "$", &[Value::Bool(true)]), None);
        assert_eq!(env.resolve(Some("Tags"), "$", &[Value::from("0")]), None);
    }

    #[test]
    fn test_non_scalar_is_unresolved_but_has_length() {
        let host = host();
        let env = JsonEnv::new(&host);
        assert_eq!(env.resolve(Some("Tags"), "$", &[]), None);
        assert_eq!(env.length(Some("Tags"), "$", &[]), Some(3));
        assert_eq!(env.length(Some("Profile"), "$", &[]), Some(2));
        assert_eq!(env.length(Some("Name"), "$", &[]), Some(5));
        assert_eq!(env.length(Some("Age"), "$", &[]), None);
    }

    #[test]
    fn test_unknown_symbol() {
        let host = host();
        let env = JsonEnv::new(&host);
        assert_eq!(env.resolve(None, "#", &[]), None);
    }

    #[test]
    fn test_selector_run_against_json() {
        let host = host();
        let env = JsonEnv::new(&host).with_current("Age");
        let mut selector = Selector::new(None);
        selector.bool_prefix = Some(false);
        assert_eq!(selector.run(&env).unwrap(), Value::Bool(false));
    }
}
