//! Query input decoding shared by both tiers
//!
//! Queries arrive either as JSON text (a `Value::String`) or already
//! structured (a `Value::Object`). Both tiers run the same first step:
//! reject falsy input, decode text, and insist on an object.

use crate::error::{QueryError, Result};
use serde_json::{Map, Value};
use std::borrow::Cow;

/// A query as handed to a tier entry point.
///
/// Text converts to a JSON string value and is decoded on use; structured
/// values are borrowed or owned as given.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryInput<'a>(Cow<'a, Value>);

impl QueryInput<'_> {
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0.into_owned()
    }
}

impl<'a> From<&'a str> for QueryInput<'a> {
    fn from(text: &'a str) -> Self {
        QueryInput(Cow::Owned(Value::from(text)))
    }
}

impl From<String> for QueryInput<'_> {
    fn from(text: String) -> Self {
        QueryInput(Cow::Owned(Value::String(text)))
    }
}

impl From<Value> for QueryInput<'_> {
    fn from(value: Value) -> Self {
        QueryInput(Cow::Owned(value))
    }
}

impl<'a> From<&'a Value> for QueryInput<'a> {
    fn from(value: &'a Value) -> Self {
        QueryInput(Cow::Borrowed(value))
    }
}

/// Whether a value counts as present (JSON truthiness)
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Decode a query input into its record form
pub fn decode(query: &Value) -> Result<Cow<'_, Map<String, Value>>> {
    if !is_truthy(query) {
        return Err(QueryError::NotTruthy {
            value: query.to_string(),
        });
    }

    match query {
        Value::String(text) => {
            let decoded: Value =
                serde_json::from_str(text).map_err(|e| QueryError::MalformedJson {
                    message: e.to_string(),
                })?;
            match decoded {
                Value::Object(map) => Ok(Cow::Owned(map)),
                other => Err(QueryError::InvalidShapeKind {
                    found: format!("JSON {}", kind_name(&other)),
                }),
            }
        }
        Value::Object(map) => Ok(Cow::Borrowed(map)),
        other => Err(QueryError::InvalidShapeKind {
            found: kind_name(other).to_string(),
        }),
    }
}

/// Render a query input for diagnostics
pub fn render(query: &Value) -> String {
    match query {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(0.0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!(3)));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!({})));
    }

    #[test]
    fn test_decode_object_is_borrowed() {
        let query = json!({"op": "type", "string": "vote"});
        let decoded = decode(&query).unwrap();
        assert!(matches!(decoded, Cow::Borrowed(_)));
        assert_eq!(decoded.get("op"), Some(&json!("type")));
    }

    #[test]
    fn test_decode_string() {
        let query = Value::from(r#"{"op":"type","string":"vote"}"#);
        let decoded = decode(&query).unwrap();
        assert_eq!(decoded.get("string"), Some(&json!("vote")));
    }

    #[test]
    fn test_decode_rejections() {
        assert!(matches!(
            decode(&json!(null)),
            Err(QueryError::NotTruthy { .. })
        ));
        assert!(matches!(
            decode(&json!(3)),
            Err(QueryError::InvalidShapeKind { .. })
        ));
        assert!(matches!(
            decode(&json!(["author"])),
            Err(QueryError::InvalidShapeKind { .. })
        ));
        assert!(matches!(
            decode(&Value::from("completenonsense")),
            Err(QueryError::MalformedJson { .. })
        ));
        assert!(matches!(
            decode(&Value::from("[1, 2]")),
            Err(QueryError::InvalidShapeKind { .. })
        ));
    }

    #[test]
    fn test_query_input_conversions() {
        let text = QueryInput::from(r#"{"op":"type","string":"vote"}"#);
        assert_eq!(text.as_value(), &Value::from(r#"{"op":"type","string":"vote"}"#));
        assert_eq!(
            decode(text.as_value()).unwrap().get("string"),
            Some(&json!("vote"))
        );

        let owned = QueryInput::from(String::from("{}"));
        assert_eq!(owned.into_value(), Value::from("{}"));

        let value = json!({"op": "and", "args": []});
        let borrowed = QueryInput::from(&value);
        assert!(matches!(borrowed.0, Cow::Borrowed(_)));
        assert_eq!(QueryInput::from(value.clone()), borrowed);
    }

    #[test]
    fn test_render() {
        assert_eq!(render(&Value::from("{\"a\":1}")), "{\"a\":1}");
        assert_eq!(render(&json!({"a": 1})), "{\"a\":1}");
    }
}
