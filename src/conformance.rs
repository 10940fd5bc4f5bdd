//! Structural conformance of a `Value` to a declared `Ty`.
//!
//! Null and unknown conform everywhere. Every violation is reported with the
//! path of the offending location, in path order. The walk visits each node
//! of the value once.
use std::collections::BTreeSet;
use std::fmt;

use crate::path::{Path, PathStep};
use crate::ty::Ty;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConformanceError {
    pub path: Path,
    pub expected: String,
    pub found: String,
}

impl fmt::Display for ConformanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at {}: expected {}, found {}", self.path, self.expected, self.found)
    }
}

impl std::error::Error for ConformanceError {}

impl Ty {
    /// Check `v` against this type. Empty means it conforms.
    pub fn test_conformance(&self, v: &Value) -> Vec<ConformanceError> {
        test_conformance(self, v)
    }
}

pub fn test_conformance(ty: &Ty, v: &Value) -> Vec<ConformanceError> {
    let mut errs = Vec::new();
    let mut path = Path::root();
    check(ty, v, &mut path, &mut errs);
    errs
}

// ------------------------------ Checking --------------------------------- //

fn mismatch(path: &Path, expected: impl Into<String>, found: impl Into<String>) -> ConformanceError {
    ConformanceError { path: path.clone(), expected: expected.into(), found: found.into() }
}

fn check(ty: &Ty, v: &Value, path: &mut Path, errs: &mut Vec<ConformanceError>) {
    if v.is_null() || v.is_unknown() {
        return;
    }

    match (ty, v) {
        (Ty::Dynamic, _) => {}
        (Ty::Bool, Value::Bool(_)) => {}
        (Ty::String, Value::String(_)) => {}
        (Ty::Number, Value::Number(_)) => {}
        (Ty::Integer, Value::Number(n)) => {
            if !is_integral(n) {
                errs.push(mismatch(path, "integer", describe(v)));
            }
        }

        (Ty::List(item), Value::Array(xs)) => {
            for (i, el) in xs.iter().enumerate() {
                path.push(PathStep::Index(i));
                check(item, el, path, errs);
                path.pop();
            }
        }

        (Ty::Tuple(elems), Value::Array(xs)) => {
            if elems.len() != xs.len() {
                errs.push(mismatch(path, ty.friendly_name(), describe(v)));
                return;
            }
            for (i, (elem, el)) in elems.iter().zip(xs).enumerate() {
                path.push(PathStep::Index(i));
                check(elem, el, path, errs);
                path.pop();
            }
        }

        (Ty::Map(value), Value::Object(m)) => {
            for (k, el) in m {
                path.push(PathStep::Key(k.clone()));
                check(value, el, path, errs);
                path.pop();
            }
        }

        (Ty::Object(fields), Value::Object(m)) => {
            let names: BTreeSet<&str> = fields.iter().map(|f| f.name.as_str())
                .chain(m.keys().map(String::as_str))
                .collect();
            for name in names {
                path.push(PathStep::Attr(name.to_string()));
                match (ty.field(name), m.get(name)) {
                    (Some(decl), Some(el)) => check(&decl.ty, el, path, errs),
                    (Some(decl), None) => {
                        if decl.required {
                            errs.push(mismatch(path, decl.ty.friendly_name(), "no attribute"));
                        }
                    }
                    (None, Some(el)) => errs.push(mismatch(path, "no attribute", describe(el))),
                    (None, None) => {}
                }
                path.pop();
            }
        }

        _ => errs.push(mismatch(path, ty.friendly_name(), describe(v))),
    }
}

/// Whole numbers count as integral even when written as floats (`1.0`).
fn is_integral(n: &serde_json::Number) -> bool {
    n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0)
}

/// Name of what was found at a location, for the `found` half of a message.
fn describe(v: &Value) -> String {
    match v {
        Value::Null => "null".to_string(),
        Value::Unknown => "unknown".to_string(),
        Value::Bool(_) => "bool".to_string(),
        Value::Number(n) if is_integral(n) => "number".to_string(),
        Value::Number(_) => "number with a fractional part".to_string(),
        Value::String(_) => "string".to_string(),
        Value::Array(xs) => format!("array of {} elements", xs.len()),
        Value::Object(_) => "object".to_string(),
    }
}
