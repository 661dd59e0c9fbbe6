//! Validation and framing of operator-supplied request text.

use serde_json::Value;
use thiserror::Error;

use crate::wire::framing::{frame, FrameError};

/// Errors that stop a request before any connection is opened.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The request text is not valid JSON.
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The request cannot be expressed in the length header.
    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// A request that parsed as JSON and has been framed for the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    /// Compact JSON body as it goes on the wire.
    pub body: String,
    /// Header plus body.
    pub framed: String,
    /// Value of the top-level `cmd` field, if present.
    pub command: Option<String>,
}

impl PreparedRequest {
    /// Parse, normalise and frame request text.
    ///
    /// The body is re-serialised compactly with key order preserved, so
    /// whitespace and indentation from the editor never reach the server.
    pub fn parse(text: &str) -> Result<Self, RequestError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    /// Frame an already-parsed JSON value.
    pub fn from_value(value: &Value) -> Result<Self, RequestError> {
        let body = serde_json::to_string(value)?;
        let framed = frame(&body)?;
        let command = value
            .get("cmd")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self {
            body,
            framed,
            command,
        })
    }

    /// Bytes to write to the socket.
    pub fn as_bytes(&self) -> &[u8] {
        self.framed.as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_compacts_and_frames() {
        let text = "{\n  \"cmd\": \"heartBeat\",\n  \"sessionId\": \"abcde12345\"\n}";
        let request = PreparedRequest::parse(text).unwrap();

        assert_eq!(request.body, r#"{"cmd":"heartBeat","sessionId":"abcde12345"}"#);
        assert_eq!(
            request.framed,
            format!("({:08}){}", request.body.len(), request.body)
        );
        assert_eq!(request.command.as_deref(), Some("heartBeat"));
    }

    #[test]
    fn test_parse_keeps_non_ascii() {
        let request = PreparedRequest::parse(r#"{"memo": "테스트"}"#).unwrap();
        assert_eq!(request.body, r#"{"memo":"테스트"}"#);
        assert!(request.framed.starts_with("(00000020)"));
    }

    #[test]
    fn test_parse_keeps_numbers_exact() {
        let request = PreparedRequest::parse("{\"reqNo\": 123456789012345678901234567890}").unwrap();
        assert_eq!(
            request.framed,
            "(00000040){\"reqNo\":123456789012345678901234567890}"
        );
    }

    #[test]
    fn test_parse_without_cmd_field() {
        let request = PreparedRequest::parse("[1, 2]").unwrap();
        assert_eq!(request.command, None);
        assert_eq!(request.framed, "(00000005)[1,2]");
    }

    #[test]
    fn test_parse_rejects_invalid_json() {
        let err = PreparedRequest::parse("{\"cmd\": ").unwrap_err();
        assert!(matches!(err, RequestError::InvalidJson(_)));
        assert!(err.to_string().starts_with("Invalid JSON: "), "{}", err);
    }

    #[test]
    fn test_parse_rejects_empty_text() {
        assert!(PreparedRequest::parse("   ").is_err());
    }
}
