//! Wire types and message framing.
//!
//! Messages are bare JSON documents with no length prefix:
//!
//! ```text
//! request:  {"type": <0..6>, "data": {...}}
//! response: {"status": 0|1, "data": {...}, "error_message": "..."}
//! ```
//!
//! A message ends when the whole accumulated buffer parses as one JSON
//! document, so JSON text inside a string value never ends a message early.

use crate::config::ServerConfig;
use crate::{LabError, Result};
use bytes::{Buf, BytesMut};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Operation selected by a request's `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Login = 0,
    Register = 1,
    CipherEncrypt = 2,
    CipherDecrypt = 3,
    SolveEquation = 4,
    StegoHide = 5,
    StegoExtract = 6,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Login => "login",
            RequestKind::Register => "register",
            RequestKind::CipherEncrypt => "cipher_encrypt",
            RequestKind::CipherDecrypt => "cipher_decrypt",
            RequestKind::SolveEquation => "solve_equation",
            RequestKind::StegoHide => "stego_hide",
            RequestKind::StegoExtract => "stego_extract",
        }
    }
}

impl std::fmt::Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<i64> for RequestKind {
    type Error = LabError;

    fn try_from(value: i64) -> Result<Self> {
        Ok(match value {
            0 => RequestKind::Login,
            1 => RequestKind::Register,
            2 => RequestKind::CipherEncrypt,
            3 => RequestKind::CipherDecrypt,
            4 => RequestKind::SolveEquation,
            5 => RequestKind::StegoHide,
            6 => RequestKind::StegoExtract,
            other => return Err(LabError::UnknownRequestType(other)),
        })
    }
}

/// A request exactly as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireRequest {
    #[serde(rename = "type")]
    pub kind: i64,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl WireRequest {
    pub fn new(kind: RequestKind, data: Map<String, Value>) -> Self {
        Self {
            kind: kind as i64,
            data,
        }
    }
}

/// Response outcome, serialized as `0` or `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Status {
    Success,
    Failure,
}

impl From<Status> for u8 {
    fn from(status: Status) -> u8 {
        match status {
            Status::Success => 0,
            Status::Failure => 1,
        }
    }
}

impl TryFrom<u8> for Status {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, String> {
        match value {
            0 => Ok(Status::Success),
            1 => Ok(Status::Failure),
            other => Err(format!("invalid status {}", other)),
        }
    }
}

const FALLBACK_ERROR: &str = "request failed";

/// Reply to exactly one request.
///
/// `status` is [`Status::Failure`] exactly when `error_message` is non-empty;
/// the constructors keep that true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: Status,
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub error_message: String,
}

impl Response {
    /// Create a success response.
    pub fn success(data: Map<String, Value>) -> Self {
        Self {
            status: Status::Success,
            data,
            error_message: String::new(),
        }
    }

    /// Create an error response. An empty message is replaced with a
    /// generic one.
    pub fn error(message: impl Into<String>) -> Self {
        let mut error_message = message.into();
        if error_message.is_empty() {
            error_message = FALLBACK_ERROR.to_string();
        }
        Self {
            status: Status::Failure,
            data: Map::new(),
            error_message,
        }
    }

    /// Attach a data field.
    pub fn with_data(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// String field from `data`, if present.
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }
}

fn last_non_whitespace(bytes: &[u8]) -> Option<u8> {
    bytes
        .iter()
        .rev()
        .copied()
        .find(|b| !b.is_ascii_whitespace())
}

/// Per-connection inbound accumulator.
#[derive(Debug)]
pub struct MessageBuffer {
    buf: BytesMut,
    max_size: usize,
}

impl Default for MessageBuffer {
    fn default() -> Self {
        Self::new(ServerConfig::MAX_MESSAGE_SIZE)
    }
}

impl MessageBuffer {
    pub fn new(max_size: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            max_size,
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Append freshly read bytes. Fails once the accumulator would exceed
    /// its cap; the buffer is left unchanged in that case.
    pub fn extend(&mut self, bytes: &[u8]) -> Result<()> {
        let size = self.buf.len() + bytes.len();
        if size > self.max_size {
            return Err(LabError::MessageTooLarge {
                size,
                max: self.max_size,
            });
        }
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    /// Parse the whole accumulator as one JSON document.
    ///
    /// Returns `None` while the buffer is incomplete or invalid. On success
    /// the buffer is cleared.
    pub fn try_take(&mut self) -> Option<Value> {
        match last_non_whitespace(&self.buf) {
            Some(b'}') | Some(b']') => {}
            _ => return None,
        }
        let value = serde_json::from_slice::<Value>(&self.buf).ok()?;
        self.buf.clear();
        Some(value)
    }

    /// Pull every complete document off the front of the buffer, leaving a
    /// trailing partial one in place.
    ///
    /// Used by the client, which may see a late response followed by the
    /// current one in a single read.
    pub fn drain_documents(&mut self) -> Result<Vec<Value>> {
        let mut documents = Vec::new();
        let mut consumed = 0;
        {
            let mut stream = serde_json::Deserializer::from_slice(&self.buf).into_iter::<Value>();
            loop {
                match stream.next() {
                    Some(Ok(value)) => {
                        documents.push(value);
                        consumed = stream.byte_offset();
                    }
                    Some(Err(e)) if e.is_eof() => break,
                    Some(Err(e)) => return Err(e.into()),
                    None => break,
                }
            }
        }
        self.buf.advance(consumed);
        if last_non_whitespace(&self.buf).is_none() {
            self.buf.clear();
        }
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_kind_from_wire() {
        assert_eq!(RequestKind::try_from(0).unwrap(), RequestKind::Login);
        assert_eq!(RequestKind::try_from(6).unwrap(), RequestKind::StegoExtract);
        let err = RequestKind::try_from(7).unwrap_err();
        assert_eq!(err.to_string(), "unknown request type: 7");
        assert!(RequestKind::try_from(-1).is_err());
    }

    #[test]
    fn test_wire_request_shape() {
        let mut data = Map::new();
        data.insert("username".into(), json!("alice"));
        let req = WireRequest::new(RequestKind::Register, data);
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value, json!({"type": 1, "data": {"username": "alice"}}));
    }

    #[test]
    fn test_wire_request_without_data() {
        let req: WireRequest = serde_json::from_value(json!({"type": 4})).unwrap();
        assert_eq!(req.kind, 4);
        assert!(req.data.is_empty());
    }

    #[test]
    fn test_response_serialization() {
        let ok = Response::success(Map::new()).with_data("message", "hi");
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"status": 0, "data": {"message": "hi"}, "error_message": ""})
        );

        let err = Response::error("boom");
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"status": 1, "data": {}, "error_message": "boom"})
        );
    }

    #[test]
    fn test_error_response_never_has_empty_message() {
        let err = Response::error("");
        assert!(!err.is_success());
        assert!(!err.error_message.is_empty());
    }

    #[test]
    fn test_response_rejects_unknown_status() {
        let parsed: std::result::Result<Response, _> =
            serde_json::from_value(json!({"status": 2, "data": {}, "error_message": ""}));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_buffer_split_message() {
        let mut buffer = MessageBuffer::default();
        let message = br#"{"type": 0, "data": {"username": "a", "password": "b"}}"#;
        for chunk in message.chunks(5) {
            assert!(buffer.try_take().is_none());
            buffer.extend(chunk).unwrap();
        }
        let value = buffer.try_take().unwrap();
        assert_eq!(value["data"]["username"], "a");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_buffer_brace_inside_string_is_not_message_end() {
        let mut buffer = MessageBuffer::default();
        buffer.extend(br#"{"type": 2, "data": {"text": "{\"x\": 1}"#).unwrap();
        assert!(buffer.try_take().is_none());
        buffer.extend(br#"}"}}"#).unwrap();
        let value = buffer.try_take().unwrap();
        assert_eq!(value["data"]["text"], "{\"x\": 1}}");
    }

    #[test]
    fn test_buffer_keeps_invalid_json() {
        let mut buffer = MessageBuffer::default();
        buffer.extend(b"{not json}").unwrap();
        assert!(buffer.try_take().is_none());
        assert_eq!(buffer.len(), 10);
    }

    #[test]
    fn test_buffer_cap() {
        let mut buffer = MessageBuffer::new(8);
        buffer.extend(b"{\"a\":").unwrap();
        let err = buffer.extend(b"12345").unwrap_err();
        assert!(matches!(err, LabError::MessageTooLarge { size: 10, max: 8 }));
        assert_eq!(buffer.len(), 5);
    }

    #[test]
    fn test_drain_documents_keeps_partial_tail() {
        let mut buffer = MessageBuffer::default();
        buffer.extend(br#"{"a": 1} {"b": 2}{"c""#).unwrap();
        let docs = buffer.drain_documents().unwrap();
        assert_eq!(docs, vec![json!({"a": 1}), json!({"b": 2})]);

        buffer.extend(br#": 3}"#).unwrap();
        let docs = buffer.drain_documents().unwrap();
        assert_eq!(docs, vec![json!({"c": 3})]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_drain_documents_rejects_garbage() {
        let mut buffer = MessageBuffer::default();
        buffer.extend(b"]]").unwrap();
        assert!(buffer.drain_documents().is_err());
    }
}
