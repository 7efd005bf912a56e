//! Action parameters and their conversion from text.
//!
//! Parameters are JSON values keyed by field name. Callers that collect input
//! as text (HTML forms, command-line `name=value` pairs) use
//! [`parse_params`] to convert each raw value according to the declared
//! [`FieldKind`] of the matching link field.

use indexmap::IndexMap;
use serde_json::Value;

use crate::document::{Field, Link};
use crate::errors::ActionError;
use crate::types::FieldKind;

/// Parameter values for one action, in insertion order.
pub type Params = IndexMap<String, Value>;

/// Converts raw `(name, text)` pairs into typed parameters for `link`.
///
/// Empty values are skipped, so an untouched optional input is never sent.
/// Names the link does not declare are kept as strings; the transport
/// rejects them as unknown parameters.
pub fn parse_params<'a, I>(link: &Link, entries: I) -> Result<Params, ActionError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut params = Params::new();
    for (name, raw) in entries {
        if raw.is_empty() {
            continue;
        }
        let kind = link.field(name).map(Field::kind).unwrap_or_default();
        params.insert(name.to_owned(), parse_value(name, kind, raw)?);
    }
    Ok(params)
}

/// Converts one raw value. Values that do not parse as `kind` are rejected
/// rather than dropped.
pub fn parse_value(name: &str, kind: FieldKind, raw: &str) -> Result<Value, ActionError> {
    let invalid = || {
        ActionError::parameter(format!(
            "Invalid {} value for field \"{name}\": {raw:?}",
            kind.as_str()
        ))
    };

    match kind {
        FieldKind::String => Ok(Value::String(raw.to_owned())),
        FieldKind::Integer => raw
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| invalid()),
        FieldKind::Number => raw
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .ok_or_else(invalid),
        FieldKind::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(invalid()),
        },
        FieldKind::Array => match serde_json::from_str(raw) {
            Ok(array @ Value::Array(_)) => Ok(array),
            _ => Err(invalid()),
        },
        FieldKind::Object => match serde_json::from_str(raw) {
            Ok(object @ Value::Object(_)) => Ok(object),
            _ => Err(invalid()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::identifiers::{FieldName, Method};
    use serde_json::json;

    fn link() -> Link {
        let field = |name: &str, kind| Field::new(FieldName::new(name).unwrap()).of_kind(kind);
        Link::new("http://api.test/", Method::get()).with_fields(vec![
            field("count", FieldKind::Integer),
            field("ratio", FieldKind::Number),
            field("active", FieldKind::Boolean),
            field("tags", FieldKind::Array),
            field("extra", FieldKind::Object),
            field("name", FieldKind::String),
        ])
    }

    #[test]
    fn values_are_converted_by_field_kind() {
        let params = parse_params(
            &link(),
            [
                ("count", "42"),
                ("ratio", "0.5"),
                ("active", "TRUE"),
                ("tags", r#"["a","b"]"#),
                ("extra", r#"{"k":1}"#),
                ("name", " spaced "),
            ],
        )
        .unwrap();

        assert_eq!(params["count"], json!(42));
        assert_eq!(params["ratio"], json!(0.5));
        assert_eq!(params["active"], json!(true));
        assert_eq!(params["tags"], json!(["a", "b"]));
        assert_eq!(params["extra"], json!({"k": 1}));
        assert_eq!(params["name"], json!(" spaced "));
    }

    #[test]
    fn empty_values_are_skipped() {
        let params = parse_params(&link(), [("count", ""), ("name", "x")]).unwrap();
        assert_eq!(params.len(), 1);
        assert!(!params.contains_key("count"));
    }

    #[test]
    fn undeclared_names_pass_through_as_strings() {
        let params = parse_params(&link(), [("other", "7")]).unwrap();
        assert_eq!(params["other"], json!("7"));
    }

    #[test]
    fn unparseable_values_are_rejected() {
        for (name, raw) in [
            ("active", "yes"),
            ("count", "12abc"),
            ("ratio", "NaN"),
            ("tags", r#"{"a":1}"#),
            ("extra", "[1]"),
            ("extra", "{broken"),
        ] {
            let err = parse_params(&link(), [(name, raw)]).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Parameter, "{name}={raw}");
        }
    }

    #[test]
    fn rejection_names_the_field() {
        let err = parse_value("active", FieldKind::Boolean, "maybe").unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"Invalid boolean value for field "active": "maybe""#
        );
    }
}
