//! Declared types. A value conforms to a `Ty` structurally (see `conformance`).
//!
//! JSON encoding (used by the CLI and by serde):
//! - primitives: `"dynamic"`, `"bool"`, `"number"`, `"integer"`, `"string"`
//! - collections: `["list", T]`, `["map", T]`, `["tuple", [T, ...]]`
//! - objects: `["object", {"attr": T}]` or `["object", {"attr": T}, ["optional_attr"]]`
use std::fmt;

use serde_json::{json, Value as Json};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "Json", into = "Json")]
pub enum Ty {
    Dynamic,                 // any value conforms
    Bool,
    Number,
    Integer,                 // number without a fractional part
    String,
    List(Box<Ty>),
    Map(Box<Ty>),
    Tuple(Vec<Ty>),          // exact arity
    Object(Vec<Field>),      // sorted by name
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    pub name: String,
    pub ty: Ty,
    pub required: bool,      // must be present (may still be null)
}

impl Field {
    pub fn required(name: impl Into<String>, ty: Ty) -> Self {
        Self { name: name.into(), ty, required: true }
    }
    pub fn optional(name: impl Into<String>, ty: Ty) -> Self {
        Self { name: name.into(), ty, required: false }
    }
}

impl Ty {
    pub fn list(item: Ty) -> Self { Ty::List(Box::new(item)) }
    pub fn map(value: Ty) -> Self { Ty::Map(Box::new(value)) }
    pub fn tuple(elems: impl IntoIterator<Item = Ty>) -> Self { Ty::Tuple(elems.into_iter().collect()) }

    /// Object type with every attribute required.
    pub fn object<I, K>(attrs: I) -> Self
    where
        I: IntoIterator<Item = (K, Ty)>,
        K: Into<String>,
    {
        Self::object_with_fields(attrs.into_iter().map(|(k, ty)| Field::required(k, ty)))
    }

    /// Object type from explicit fields. Later duplicates replace earlier ones.
    pub fn object_with_fields(fields: impl IntoIterator<Item = Field>) -> Self {
        let mut out: Vec<Field> = Vec::new();
        for f in fields {
            match out.iter_mut().find(|x| x.name == f.name) {
                Some(slot) => *slot = f,
                None => out.push(f),
            }
        }
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ty::Object(out)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        match self {
            Ty::Object(fields) => fields.iter().find(|f| f.name == name),
            _ => None,
        }
    }

    /// Short human name used in conformance messages.
    pub fn friendly_name(&self) -> String {
        match self {
            Ty::Dynamic => "any value".to_string(),
            Ty::Bool => "bool".to_string(),
            Ty::Number => "number".to_string(),
            Ty::Integer => "integer".to_string(),
            Ty::String => "string".to_string(),
            Ty::List(item) => format!("list of {}", item.friendly_name()),
            Ty::Map(value) => format!("map of {}", value.friendly_name()),
            Ty::Tuple(elems) => format!("tuple of {} elements", elems.len()),
            Ty::Object(_) => "object".to_string(),
        }
    }

    // ------------------------------ JSON form ------------------------------ //

    pub fn to_json(&self) -> Json {
        match self {
            Ty::Dynamic => json!("dynamic"),
            Ty::Bool => json!("bool"),
            Ty::Number => json!("number"),
            Ty::Integer => json!("integer"),
            Ty::String => json!("string"),
            Ty::List(item) => json!(["list", item.to_json()]),
            Ty::Map(value) => json!(["map", value.to_json()]),
            Ty::Tuple(elems) => json!(["tuple", elems.iter().map(Ty::to_json).collect::<Vec<_>>()]),
            Ty::Object(fields) => {
                let mut attrs = serde_json::Map::new();
                for f in fields {
                    attrs.insert(f.name.clone(), f.ty.to_json());
                }
                let optional: Vec<Json> = fields.iter()
                    .filter(|f| !f.required)
                    .map(|f| Json::from(f.name.clone()))
                    .collect();
                if optional.is_empty() {
                    json!(["object", attrs])
                } else {
                    json!(["object", attrs, optional])
                }
            }
        }
    }

    pub fn from_json(src: &Json) -> Result<Self, TypeParseError> {
        parse_ty(src, "")
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl From<Ty> for Json {
    fn from(ty: Ty) -> Self { ty.to_json() }
}

impl TryFrom<Json> for Ty {
    type Error = TypeParseError;
    fn try_from(src: Json) -> Result<Self, Self::Error> { Ty::from_json(&src) }
}

// ------------------------------- Parsing --------------------------------- //

/// A malformed type encoding. `pointer` locates the problem inside the JSON.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid type at {}: {reason}", display_pointer(.pointer))]
pub struct TypeParseError {
    pub pointer: String,
    pub reason: String,
}

fn display_pointer(pointer: &str) -> &str {
    if pointer.is_empty() { "/" } else { pointer }
}

fn parse_err(pointer: &str, reason: impl Into<String>) -> TypeParseError {
    TypeParseError { pointer: pointer.to_string(), reason: reason.into() }
}

fn parse_ty(src: &Json, at: &str) -> Result<Ty, TypeParseError> {
    match src {
        Json::String(name) => match name.as_str() {
            "dynamic" => Ok(Ty::Dynamic),
            "bool" => Ok(Ty::Bool),
            "number" => Ok(Ty::Number),
            "integer" => Ok(Ty::Integer),
            "string" => Ok(Ty::String),
            other => Err(parse_err(at, format!("unknown primitive type {other:?}"))),
        },
        Json::Array(parts) => {
            let kind = parts.first()
                .and_then(Json::as_str)
                .ok_or_else(|| parse_err(at, "type constructor must start with its name"))?;
            let arg_at = format!("{at}/1");
            match (kind, parts.len()) {
                ("list", 2) => Ok(Ty::list(parse_ty(&parts[1], &arg_at)?)),
                ("map", 2) => Ok(Ty::map(parse_ty(&parts[1], &arg_at)?)),
                ("tuple", 2) => {
                    let elems = parts[1].as_array()
                        .ok_or_else(|| parse_err(&arg_at, "tuple elements must be an array"))?;
                    let elems = elems.iter().enumerate()
                        .map(|(i, e)| parse_ty(e, &format!("{arg_at}/{i}")))
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(Ty::Tuple(elems))
                }
                ("object", 2 | 3) => parse_object(parts, at),
                ("list" | "map" | "tuple" | "object", n) => {
                    Err(parse_err(at, format!("wrong number of arguments for {kind}: {}", n - 1)))
                }
                (other, _) => Err(parse_err(at, format!("unknown type constructor {other:?}"))),
            }
        }
        other => Err(parse_err(at, format!("expected a string or an array, found {other}"))),
    }
}

fn parse_object(parts: &[Json], at: &str) -> Result<Ty, TypeParseError> {
    let attrs_at = format!("{at}/1");
    let attrs = parts[1].as_object()
        .ok_or_else(|| parse_err(&attrs_at, "object attributes must be a JSON object"))?;

    let mut optional: Vec<&str> = Vec::new();
    if let Some(raw) = parts.get(2) {
        let opt_at = format!("{at}/2");
        let names = raw.as_array()
            .ok_or_else(|| parse_err(&opt_at, "optional attributes must be an array of names"))?;
        for (i, n) in names.iter().enumerate() {
            let n = n.as_str()
                .ok_or_else(|| parse_err(&format!("{opt_at}/{i}"), "attribute name must be a string"))?;
            if !attrs.contains_key(n) {
                return Err(parse_err(&format!("{opt_at}/{i}"), format!("optional attribute {n:?} is not declared")));
            }
            optional.push(n);
        }
    }

    let mut fields = Vec::with_capacity(attrs.len());
    for (name, raw) in attrs {
        let ty = parse_ty(raw, &format!("{attrs_at}/{}", escape_pointer_token(name)))?;
        let required = !optional.contains(&name.as_str());
        fields.push(Field { name: name.clone(), ty, required });
    }
    Ok(Ty::object_with_fields(fields))
}

fn escape_pointer_token(s: &str) -> String {
    s.replace('~', "~0").replace('/', "~1")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_form_round_trips_nested_types() {
        let ty = Ty::object_with_fields([
            Field::required("name", Ty::String),
            Field::optional("tags", Ty::map(Ty::String)),
            Field::required("ports", Ty::list(Ty::Integer)),
            Field::required("origin", Ty::tuple([Ty::Number, Ty::Number])),
        ]);
        let encoded = ty.to_json();
        assert_eq!(encoded[0], "object");
        assert_eq!(encoded[2], json!(["tags"]));
        assert_eq!(Ty::from_json(&encoded).unwrap(), ty);
    }

    #[test]
    fn object_fields_are_sorted_and_deduplicated() {
        let ty = Ty::object([("b", Ty::Bool), ("a", Ty::String), ("b", Ty::Number)]);
        let Ty::Object(fields) = &ty else { panic!("not an object") };
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(ty.field("b").unwrap().ty, Ty::Number);
    }

    #[test]
    fn parse_errors_point_at_the_offending_node() {
        let err = Ty::from_json(&json!(["object", {"a": ["list", "strin"]}])).unwrap_err();
        assert_eq!(err.pointer, "/1/a/1");
        assert!(err.reason.contains("strin"));

        let err = Ty::from_json(&json!(["object", {"a": "string"}, ["b"]])).unwrap_err();
        assert_eq!(err.pointer, "/2/0");

        let err = Ty::from_json(&json!(["list"])).unwrap_err();
        assert!(err.to_string().starts_with("invalid type at /:"));

        assert!(Ty::from_json(&json!(42)).is_err());
    }

    #[test]
    fn deserializes_through_serde() {
        let ty: Ty = serde_json::from_str(r#"["map", "integer"]"#).unwrap();
        assert_eq!(ty, Ty::map(Ty::Integer));
        assert_eq!(serde_json::to_string(&ty).unwrap(), r#"["map","integer"]"#);
        assert!(serde_json::from_str::<Ty>(r#"["set", "string"]"#).is_err());
    }
}
