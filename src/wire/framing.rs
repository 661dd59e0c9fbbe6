//! Parenthesised length-header framing for AMAS gateway messages.
//!
//! Every message on the wire is a 10-character header followed by a UTF-8
//! JSON body:
//!
//! ```text
//! (00000023){"cmd":"heartBeat",...}
//! ^^^^^^^^^^
//! "(" + 8-digit zero-padded body length in bytes + ")"
//! ```
//!
//! There is no trailer and no delimiter beyond the header. Responses are
//! unwrapped leniently: the header is skipped by position, never validated.

use serde_json::Value;
use thiserror::Error;

/// Length of the `(NNNNNNNN)` header in bytes (and characters).
pub const HEADER_LEN: usize = 10;

/// Number of decimal digits in the header length field.
const LENGTH_DIGITS: usize = 8;

/// Largest body the 8-digit length field can describe.
pub const MAX_PAYLOAD_LEN: usize = 99_999_999;

/// Marker returned when a response is too short to carry a body.
pub const INVALID_FORMAT: &str = "invalid format";

/// Errors raised while framing an outgoing payload.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// The body does not fit in the 8-digit length field.
    #[error("Payload of {0} bytes exceeds the {MAX_PAYLOAD_LEN}-byte header limit")]
    PayloadTooLarge(usize),
}

/// Wrap a payload in the `(NNNNNNNN)` length header.
///
/// The length is the UTF-8 byte length of `payload`, not its character count.
///
/// # Errors
///
/// Returns `FrameError::PayloadTooLarge` if the body needs more than 8 digits.
///
/// # Example
///
/// ```
/// use amas_console::wire::frame;
///
/// assert_eq!(frame(r#"{"a":1}"#).unwrap(), r#"(00000007){"a":1}"#);
/// ```
pub fn frame(payload: &str) -> Result<String, FrameError> {
    let byte_len = payload.len();
    if byte_len > MAX_PAYLOAD_LEN {
        return Err(FrameError::PayloadTooLarge(byte_len));
    }

    let mut framed = String::with_capacity(HEADER_LEN + byte_len);
    framed.push_str(&format!("({:0width$})", byte_len, width = LENGTH_DIGITS));
    framed.push_str(payload);
    Ok(framed)
}

/// Parse the declared body length from a `(NNNNNNNN)` header.
///
/// Returns `None` when the first 10 bytes do not have the expected shape.
pub fn declared_length(raw: &[u8]) -> Option<usize> {
    let header = raw.get(..HEADER_LEN)?;
    if header[0] != b'(' || header[HEADER_LEN - 1] != b')' {
        return None;
    }

    let digits = &header[1..HEADER_LEN - 1];
    if !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }

    std::str::from_utf8(digits).ok()?.parse().ok()
}

/// Decoded response body, ready for display.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Body parsed as JSON.
    Json(Value),
    /// Body was not valid JSON; kept verbatim.
    Raw(String),
    /// Response too short to contain a body.
    InvalidFormat,
}

impl ResponseBody {
    /// Text shown to the operator.
    ///
    /// JSON is pretty-printed with 2-space indentation, keys in the order
    /// the server sent them and non-ASCII characters left unescaped.
    pub fn display_text(&self) -> String {
        match self {
            ResponseBody::Json(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            ResponseBody::Raw(text) => text.clone(),
            ResponseBody::InvalidFormat => INVALID_FORMAT.to_string(),
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, ResponseBody::Json(_))
    }
}

/// Strip the header from a response and decode what remains.
///
/// Anything of 10 characters or fewer (including the empty string) is
/// `InvalidFormat`. Otherwise the first 10 characters are dropped without
/// looking at them and the tail is parsed as JSON, falling back to the raw
/// tail when it does not parse.
pub fn extract_body(raw: &str) -> ResponseBody {
    let Some((offset, _)) = raw.char_indices().nth(HEADER_LEN) else {
        return ResponseBody::InvalidFormat;
    };

    let tail = &raw[offset..];
    match serde_json::from_str::<Value>(tail) {
        Ok(value) => ResponseBody::Json(value),
        Err(_) => ResponseBody::Raw(tail.to_string()),
    }
}

/// Compare a response header's declared length with the bytes that followed it.
///
/// Returns `Some((declared, actual))` when the header is well formed and the
/// two disagree, `None` when they match or the header cannot be read.
pub fn length_mismatch(raw: &str) -> Option<(usize, usize)> {
    let declared = declared_length(raw.as_bytes())?;
    let actual = raw.len() - HEADER_LEN;
    (declared != actual).then_some((declared, actual))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_frame_header_shape() {
        let payload = r#"{"cmd":"heartBeat","x":1}"#;
        let framed = frame(payload).unwrap();

        assert_eq!(&framed[..1], "(");
        assert_eq!(&framed[9..10], ")");
        assert_eq!(&framed[1..9], format!("{:08}", payload.len()));
        assert_eq!(&framed[HEADER_LEN..], payload);
    }

    #[test]
    fn test_frame_uses_byte_length() {
        // 3 chars, 5 bytes
        let framed = frame("\"한\"").unwrap();
        assert_eq!(&framed[..HEADER_LEN], "(00000005)");

        let framed = frame(r#"{"name":"홍길동"}"#).unwrap();
        assert_eq!(&framed[..HEADER_LEN], "(00000020)");
    }

    #[test]
    fn test_frame_23_byte_payload() {
        let payload = r#"{"cmd":"auth","n":1234}"#;
        assert_eq!(payload.len(), 23);
        assert!(frame(payload).unwrap().starts_with("(00000023)"));
    }

    #[test]
    fn test_frame_empty_payload() {
        assert_eq!(frame("").unwrap(), "(00000000)");
    }

    #[test]
    fn test_frame_rejects_oversized_payload() {
        let payload = "x".repeat(MAX_PAYLOAD_LEN + 1);
        assert_eq!(
            frame(&payload),
            Err(FrameError::PayloadTooLarge(MAX_PAYLOAD_LEN + 1))
        );
    }

    #[test]
    fn test_extract_body_short_input_is_invalid() {
        for raw in ["", "(", "(00000000)", "0123456789", "한국어한국어한국어한"] {
            assert_eq!(extract_body(raw), ResponseBody::InvalidFormat, "input {:?}", raw);
        }
        assert_eq!(extract_body("").display_text(), INVALID_FORMAT);
    }

    #[test]
    fn test_extract_body_pretty_prints_json() {
        let body = extract_body("(00000013){\"a\": 1}");
        assert!(body.is_json());
        assert_eq!(body.display_text(), "{\n  \"a\": 1\n}");
    }

    #[test]
    fn test_extract_body_keeps_key_order_and_unicode() {
        let body = extract_body(r#"(00000000){"z":"값","a":[1,2]}"#);
        assert_eq!(
            body.display_text(),
            "{\n  \"z\": \"값\",\n  \"a\": [\n    1,\n    2\n  ]\n}"
        );
    }

    #[test]
    fn test_extract_body_keeps_large_integers() {
        let body = extract_body(r#"(00000040){"reqNo":123456789012345678901234567890}"#);
        assert_eq!(
            body.display_text(),
            "{\n  \"reqNo\": 123456789012345678901234567890\n}"
        );
    }

    #[test]
    fn test_extract_body_falls_back_to_raw_text() {
        let body = extract_body("(00000005)hello");
        assert_eq!(body, ResponseBody::Raw("hello".to_string()));
        assert_eq!(body.display_text(), "hello");
    }

    #[test]
    fn test_extract_body_ignores_header_shape() {
        let body = extract_body("garbage!!![true]");
        assert_eq!(body.display_text(), "[\n  true\n]");
    }

    #[test]
    fn test_extract_body_counts_characters_not_bytes() {
        // Ten multi-byte characters followed by a JSON body
        let raw = format!("{}{}", "가".repeat(HEADER_LEN), "{\"ok\":true}");
        assert_eq!(extract_body(&raw).display_text(), "{\n  \"ok\": true\n}");
    }

    #[test]
    fn test_self_framed_payload_unwraps_to_pretty_form() {
        for payload in [
            r#"{"cmd":"auth","accessKey":"test_user1","reqNo":"test_1"}"#,
            r#"{"cmd":"execute","params":{"target":"127.0.0.1"}}"#,
            "[1,2,3]",
            "\"text\"",
        ] {
            let expected: Value = serde_json::from_str(payload).unwrap();
            let unwrapped = extract_body(&frame(payload).unwrap()).display_text();
            assert_eq!(unwrapped, serde_json::to_string_pretty(&expected).unwrap());
        }
    }

    #[test]
    fn test_declared_length() {
        assert_eq!(declared_length(b"(00000042){}"), Some(42));
        assert_eq!(declared_length(b"(00000000)"), Some(0));
        assert_eq!(declared_length(b"(0000004)"), None);
        assert_eq!(declared_length(b"[00000042]{}"), None);
        assert_eq!(declared_length(b"(0000004x){}"), None);
        assert_eq!(declared_length(b""), None);
    }

    #[test]
    fn test_length_mismatch() {
        assert_eq!(length_mismatch("(00000002){}"), None);
        assert_eq!(length_mismatch("(00000010){}"), Some((10, 2)));
        assert_eq!(length_mismatch("no header here"), None);
    }
}
