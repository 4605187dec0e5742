//! Tagged lookups into registry JSON.
//!
//! Every access returns [`Field`]: the value, an explicit `Missing`, or
//! `Malformed` with the type that was expected. JSON `null` counts as
//! missing because the registry omits and nulls fields interchangeably.

use serde_json::{Map, Value};

/// Outcome of reading one field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Field<T> {
    Present(T),
    Missing,
    Malformed { expected: &'static str },
}

impl<T> Field<T> {
    /// Present value, or `None` for both missing and malformed.
    pub fn ok(self) -> Option<T> {
        match self {
            Field::Present(value) => Some(value),
            Field::Missing | Field::Malformed { .. } => None,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Field::Malformed { .. })
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Field::Missing)
    }
}

/// Walk an object path. Intermediate values must be objects.
pub fn lookup<'a>(root: &'a Value, path: &[&str]) -> Field<&'a Value> {
    let mut current = root;
    for segment in path {
        let Some(object) = current.as_object() else {
            return Field::Malformed { expected: "object" };
        };
        match object.get(*segment) {
            Some(Value::Null) | None => return Field::Missing,
            Some(next) => current = next,
        }
    }
    Field::Present(current)
}

pub fn str_at<'a>(root: &'a Value, path: &[&str]) -> Field<&'a str> {
    match lookup(root, path) {
        Field::Present(Value::String(s)) => Field::Present(s.as_str()),
        Field::Present(_) => Field::Malformed { expected: "string" },
        Field::Missing => Field::Missing,
        Field::Malformed { expected } => Field::Malformed { expected },
    }
}

/// Like [`str_at`] but treats blank strings as missing.
pub fn text_at<'a>(root: &'a Value, path: &[&str]) -> Field<&'a str> {
    match str_at(root, path) {
        Field::Present(s) if s.trim().is_empty() => Field::Missing,
        other => other,
    }
}

pub fn bool_at(root: &Value, path: &[&str]) -> Field<bool> {
    match lookup(root, path) {
        Field::Present(Value::Bool(b)) => Field::Present(*b),
        Field::Present(_) => Field::Malformed { expected: "boolean" },
        Field::Missing => Field::Missing,
        Field::Malformed { expected } => Field::Malformed { expected },
    }
}

pub fn u64_at(root: &Value, path: &[&str]) -> Field<u64> {
    match lookup(root, path) {
        Field::Present(value) => value
            .as_u64()
            .map_or(Field::Malformed { expected: "non-negative integer" }, Field::Present),
        Field::Missing => Field::Missing,
        Field::Malformed { expected } => Field::Malformed { expected },
    }
}

pub fn array_at<'a>(root: &'a Value, path: &[&str]) -> Field<&'a [Value]> {
    match lookup(root, path) {
        Field::Present(Value::Array(items)) => Field::Present(items.as_slice()),
        Field::Present(_) => Field::Malformed { expected: "array" },
        Field::Missing => Field::Missing,
        Field::Malformed { expected } => Field::Malformed { expected },
    }
}

pub fn object_at<'a>(root: &'a Value, path: &[&str]) -> Field<&'a Map<String, Value>> {
    match lookup(root, path) {
        Field::Present(Value::Object(map)) => Field::Present(map),
        Field::Present(_) => Field::Malformed { expected: "object" },
        Field::Missing => Field::Missing,
        Field::Malformed { expected } => Field::Malformed { expected },
    }
}

/// String elements of an array field, skipping blanks and non-strings.
pub fn strings_at(root: &Value, path: &[&str]) -> Vec<String> {
    array_at(root, path)
        .ok()
        .unwrap_or_default()
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Dotted form of a path for error messages.
pub fn dotted(path: &[&str]) -> String {
    path.join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_and_absent_are_missing() {
        let value = json!({"a": {"b": null}});
        assert!(lookup(&value, &["a", "b"]).is_missing());
        assert!(lookup(&value, &["a", "c"]).is_missing());
        assert!(lookup(&value, &["x", "y"]).is_missing());
    }

    #[test]
    fn wrong_intermediate_type_is_malformed() {
        let value = json!({"a": "text"});
        assert_eq!(
            lookup(&value, &["a", "b"]),
            Field::Malformed { expected: "object" }
        );
    }

    #[test]
    fn typed_accessors() {
        let value = json!({"s": "x", "b": true, "n": 12, "neg": -1, "blank": "  ", "l": ["a", 3, " ", "b"]});
        assert_eq!(str_at(&value, &["s"]), Field::Present("x"));
        assert_eq!(str_at(&value, &["n"]), Field::Malformed { expected: "string" });
        assert_eq!(bool_at(&value, &["b"]), Field::Present(true));
        assert_eq!(u64_at(&value, &["n"]), Field::Present(12));
        assert!(matches!(u64_at(&value, &["neg"]), Field::Malformed { .. }));
        assert!(text_at(&value, &["blank"]).is_missing());
        assert_eq!(strings_at(&value, &["l"]), vec!["a", "b"]);
        assert!(strings_at(&value, &["missing"]).is_empty());
    }
}
