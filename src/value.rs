//! JSON-like values that may carry `unknown` leaves.
//!
//! `Null` means "does not exist"; `Unknown` means "will exist, content not yet
//! known". Both conform to every declared type.
use indexmap::IndexMap;
use serde_json::Number;

use crate::ty::Ty;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Unknown,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Value>),
    Object(IndexMap<String, Value>),
}

impl Value {
    /// Canonical null for `ty`. Nulls are untyped at runtime; the declared type
    /// travels alongside in the `Change`.
    pub fn null_of(_ty: &Ty) -> Self { Value::Null }

    pub fn unknown() -> Self { Value::Unknown }

    pub fn is_null(&self) -> bool { matches!(self, Value::Null) }
    pub fn is_unknown(&self) -> bool { matches!(self, Value::Unknown) }

    /// True when this value or any nested element is unknown.
    pub fn has_unknowns(&self) -> bool {
        match self {
            Value::Unknown => true,
            Value::Array(xs) => xs.iter().any(Value::has_unknowns),
            Value::Object(m) => m.values().any(Value::has_unknowns),
            _ => false,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(m) => m.get(key),
            _ => None,
        }
    }

    pub fn index(&self, i: usize) -> Option<&Value> {
        match self {
            Value::Array(xs) => xs.get(i),
            _ => None,
        }
    }

    /// Back to plain JSON. `None` when any leaf is unknown.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        Some(match self {
            Value::Null => serde_json::Value::Null,
            Value::Unknown => return None,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Value::Number(n.clone()),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(xs) => serde_json::Value::Array(
                xs.iter().map(Value::to_json).collect::<Option<Vec<_>>>()?,
            ),
            Value::Object(m) => {
                let mut out = serde_json::Map::new();
                for (k, v) in m {
                    out.insert(k.clone(), v.to_json()?);
                }
                serde_json::Value::Object(out)
            }
        })
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(xs) => Value::Array(xs.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(m) => {
                Value::Object(m.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(v: &serde_json::Value) -> Self { Value::from(v.clone()) }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self { Value::Bool(b) }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self { Value::String(s.to_string()) }
}

impl From<String> for Value {
    fn from(s: String) -> Self { Value::String(s) }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self { Value::Number(n.into()) }
}

impl FromIterator<(String, Value)> for Value {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Value::Object(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn converts_from_json_preserving_key_order() {
        let v = Value::from(json!({"b": 1, "a": [true, null, "x"]}));
        let Value::Object(m) = &v else { panic!("not an object") };
        assert_eq!(m.keys().collect::<Vec<_>>(), ["b", "a"]);
        assert_eq!(v.get("a").and_then(|a| a.index(2)), Some(&Value::from("x")));
        assert_eq!(v.to_json(), Some(json!({"b": 1, "a": [true, null, "x"]})));
    }

    #[test]
    fn unknown_leaves_are_detected_at_any_depth() {
        let mut v = Value::from(json!({"id": null, "nested": {"list": [1, 2]}}));
        assert!(!v.has_unknowns());
        if let Value::Object(m) = &mut v {
            m.insert("id".into(), Value::unknown());
        }
        assert!(v.has_unknowns());
        assert_eq!(v.to_json(), None);
    }

    #[test]
    fn null_of_any_type_is_null() {
        assert!(Value::null_of(&Ty::object([("name", Ty::String)])).is_null());
        assert!(Value::null_of(&Ty::Dynamic).is_null());
    }
}
