use rowmap_schema::types::FieldKind;
use thiserror::Error as ThisError;

///
/// JsonError
/// A JSON document that cannot be mapped onto its schema.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[remain::sorted]
pub enum JsonError {
    #[error("field '{field}' expects a JSON array, found {found}")]
    ExpectedArray { field: String, found: String },

    #[error("'{schema}' expects a JSON object, found {found}")]
    ExpectedObject { schema: String, found: String },

    #[error("field '{field}' holds invalid base64: {reason}")]
    InvalidBinary { field: String, reason: String },

    #[error("field '{field}' holds an unparseable date: {text:?}")]
    InvalidDate { field: String, text: String },

    #[error("field '{field}' expects {expected}, found {found}")]
    InvalidValue {
        field: String,
        expected: FieldKind,
        found: String,
    },

    #[error("value {value} is out of range for field '{field}' ({kind})")]
    OutOfRange {
        field: String,
        kind: FieldKind,
        value: String,
    },

    #[error("field '{field}' appears more than once")]
    RepeatedField { field: String },

    #[error("malformed JSON: {0}")]
    Syntax(String),
}

impl JsonError {
    pub(crate) fn syntax(err: impl ToString) -> Self {
        Self::Syntax(err.to_string())
    }
}

/// Short description of a JSON value for diagnostics.
pub(crate) fn describe(json: &serde_json::Value) -> String {
    match json {
        serde_json::Value::Null => "null".to_string(),
        serde_json::Value::Bool(v) => format!("bool {v}"),
        serde_json::Value::Number(v) => format!("number {v}"),
        serde_json::Value::String(v) => format!("string {v:?}"),
        serde_json::Value::Array(v) => format!("array of {}", v.len()),
        serde_json::Value::Object(_) => "object".to_string(),
    }
}
