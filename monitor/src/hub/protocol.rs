//! JSON hub protocol framing
//!
//! Messages are JSON objects terminated by the ASCII record separator. The
//! client opens with a handshake naming the protocol, the server answers
//! with an empty object or an error.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::MonitorError;

pub const RECORD_SEPARATOR: char = '\u{1e}';
pub const PROTOCOL_NAME: &str = "json";
pub const PROTOCOL_VERSION: u32 = 1;

const TYPE_INVOCATION: u8 = 1;
const TYPE_STREAM_ITEM: u8 = 2;
const TYPE_COMPLETION: u8 = 3;
const TYPE_PING: u8 = 6;
const TYPE_CLOSE: u8 = 7;

#[derive(Debug, Serialize)]
struct HandshakeRequest<'a> {
    protocol: &'a str,
    version: u32,
}

#[derive(Debug, Deserialize)]
struct HandshakeResponse {
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMessage {
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    arguments: Vec<Value>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    allow_reconnect: Option<bool>,
}

/// Decoded hub message
#[derive(Debug, Clone, PartialEq)]
pub enum HubMessage {
    /// Server-to-client method call, the only carrier of events
    Invocation { target: String, arguments: Vec<Value> },

    /// Keep-alive
    Ping,

    /// Server is closing the session
    Close {
        error: Option<String>,
        allow_reconnect: bool,
    },

    /// Stream items, completions and anything newer than this client
    Other(u8),
}

/// Handshake frame sent right after the socket opens
pub fn handshake_request() -> String {
    let request = HandshakeRequest {
        protocol: PROTOCOL_NAME,
        version: PROTOCOL_VERSION,
    };
    // Serializing two plain fields cannot fail
    let body = serde_json::to_string(&request).unwrap_or_default();
    frame(&body)
}

/// Check the server's handshake answer
pub fn parse_handshake_response(record: &str) -> Result<(), MonitorError> {
    let response: HandshakeResponse = serde_json::from_str(record)
        .map_err(|e| MonitorError::HubProtocolError(format!("bad handshake response: {e}")))?;
    match response.error {
        Some(error) => Err(MonitorError::HubProtocolError(format!(
            "handshake rejected: {error}"
        ))),
        None => Ok(()),
    }
}

/// Ping frame
pub fn ping_frame() -> String {
    frame(&format!("{{\"type\":{TYPE_PING}}}"))
}

/// Close frame
pub fn close_frame() -> String {
    frame(&format!("{{\"type\":{TYPE_CLOSE}}}"))
}

fn frame(body: &str) -> String {
    let mut framed = String::with_capacity(body.len() + 1);
    framed.push_str(body);
    framed.push(RECORD_SEPARATOR);
    framed
}

/// Split a text frame into records, dropping the empty tail
pub fn split_records(text: &str) -> impl Iterator<Item = &str> {
    text.split(RECORD_SEPARATOR)
        .filter(|record| !record.trim().is_empty())
}

/// Decode one record
pub fn parse_message(record: &str) -> Result<HubMessage, MonitorError> {
    let raw: RawMessage = serde_json::from_str(record)
        .map_err(|e| MonitorError::HubProtocolError(format!("bad hub message: {e}")))?;

    let message = match raw.kind {
        TYPE_INVOCATION => HubMessage::Invocation {
            target: raw.target.ok_or_else(|| {
                MonitorError::HubProtocolError("invocation without target".to_string())
            })?,
            arguments: raw.arguments,
        },
        TYPE_PING => HubMessage::Ping,
        TYPE_CLOSE => HubMessage::Close {
            error: raw.error,
            allow_reconnect: raw.allow_reconnect.unwrap_or(false),
        },
        TYPE_STREAM_ITEM | TYPE_COMPLETION => HubMessage::Other(raw.kind),
        other => HubMessage::Other(other),
    };

    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_handshake_frames() {
        assert_eq!(handshake_request(), "{\"protocol\":\"json\",\"version\":1}\u{1e}");
        assert!(parse_handshake_response("{}").is_ok());
        assert!(parse_handshake_response("{\"error\":\"unsupported\"}").is_err());
        assert!(parse_handshake_response("nope").is_err());
    }

    #[test]
    fn test_control_frames() {
        assert_eq!(ping_frame(), "{\"type\":6}\u{1e}");
        assert_eq!(close_frame(), "{\"type\":7}\u{1e}");
    }

    #[test]
    fn test_split_records() {
        let text = "{\"type\":6}\u{1e}{\"type\":1,\"target\":\"status\",\"arguments\":[]}\u{1e}";
        let records: Vec<&str> = split_records(text).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(parse_message(records[0]).unwrap(), HubMessage::Ping);
    }

    #[test]
    fn test_parse_invocation() {
        let record = r#"{"type":1,"target":"status","arguments":["{\"Machine\":\"CNC-01\",\"Status\":3}"]}"#;
        match parse_message(record).unwrap() {
            HubMessage::Invocation { target, arguments } => {
                assert_eq!(target, "status");
                assert_eq!(arguments, vec![json!("{\"Machine\":\"CNC-01\",\"Status\":3}")]);
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn test_parse_close() {
        let message = parse_message(r#"{"type":7,"error":"bye","allowReconnect":true}"#).unwrap();
        assert_eq!(
            message,
            HubMessage::Close {
                error: Some("bye".to_string()),
                allow_reconnect: true
            }
        );
        let message = parse_message(r#"{"type":7}"#).unwrap();
        assert_eq!(
            message,
            HubMessage::Close {
                error: None,
                allow_reconnect: false
            }
        );
    }

    #[test]
    fn test_parse_other_and_invalid() {
        assert_eq!(parse_message(r#"{"type":3,"invocationId":"1"}"#).unwrap(), HubMessage::Other(3));
        assert_eq!(parse_message(r#"{"type":42}"#).unwrap(), HubMessage::Other(42));
        assert!(parse_message(r#"{"type":1,"arguments":[]}"#).is_err());
        assert!(parse_message("garbage").is_err());
    }
}
