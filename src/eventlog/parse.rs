//! Line decoding for event log records.
//!
//! Each line of an event log is one JSON object. Decoding never aborts the
//! stream: every failure is reported as a [`DecodeError`] which callers count
//! and skip.

use serde_json::{Map, Value};
use thiserror::Error;

/// An untyped event record, discarded right after normalization.
pub type RawRecord = Map<String, Value>;

/// Errors that can occur while decoding a single line.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("blank line")]
    Blank,

    #[error("line is not valid UTF-8: {0}")]
    InvalidEncoding(#[from] std::str::Utf8Error),

    #[error("invalid JSON: {0}")]
    Syntax(#[from] serde_json::Error),

    #[error("record is a JSON {found}, not an object")]
    NotAnObject { found: &'static str },
}

impl DecodeError {
    /// Whether this failure is a skipped blank line rather than bad input.
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Blank)
    }
}

/// Decode one line (with or without its trailing newline) into a [`RawRecord`].
pub fn decode_line(line: &[u8]) -> Result<RawRecord, DecodeError> {
    let text = std::str::from_utf8(line)?.trim();
    if text.is_empty() {
        return Err(DecodeError::Blank);
    }

    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        other => Err(DecodeError::NotAnObject {
            found: json_type_name(&other),
        }),
    }
}

fn json_type_name(value: &Value) -> &'static str {
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

    #[test]
    fn test_decode_object_with_newline() {
        let rec = decode_line(b"{\"Event\":\"SparkListenerJobStart\",\"Job ID\":3}\r\n")
            .expect("decode");
        assert_eq!(rec.get("Job ID"), Some(&Value::from(3)));
    }

    #[test]
    fn test_blank_lines_are_blank() {
        assert!(decode_line(b"").unwrap_err().is_blank());
        assert!(decode_line(b"   \t\n").unwrap_err().is_blank());
    }

    #[test]
    fn test_invalid_json_is_syntax_error() {
        let err = decode_line(b"{\"Event\": ").unwrap_err();
        assert!(matches!(err, DecodeError::Syntax(_)));
        assert!(!err.is_blank());
    }

    #[test]
    fn test_invalid_utf8_is_encoding_error() {
        let err = decode_line(&[b'{', 0xff, 0xfe, b'}']).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidEncoding(_)));
    }

    #[test]
    fn test_non_object_json_rejected() {
        let err = decode_line(b"[1,2,3]").unwrap_err();
        assert!(err.to_string().contains("array"));

        let err = decode_line(b"42").unwrap_err();
        assert!(matches!(err, DecodeError::NotAnObject { found: "number" }));
    }
}
