// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Coordination service wire protocol (client-side).
//!
//! Frames are JSON with a 4-byte big-endian length prefix. Node data travels
//! hex-encoded so payloads stay opaque bytes end to end. The server pushes
//! watch events as unsolicited frames interleaved with request replies;
//! correlation is by request id.

use super::{NodeEventKind, NodeMode};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// A client request with its correlation id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub id: u64,
    pub op: RequestOp,
}

/// Operations the client can ask of the coordination service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestOp {
    Exists { path: String, watch: bool },
    Create { path: String, data: String, mode: NodeMode },
    SetData { path: String, data: String, version: i32 },
    GetData { path: String, watch: bool },
    Children { path: String, watch: bool },
    Close,
}

/// Reply payloads, one per request shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplyBody {
    Exists { exists: bool },
    Created { path: String },
    Stat { version: i32 },
    Data { data: String },
    Children { children: Vec<String> },
    Closed,
    Error { code: ErrorCode, message: String },
}

/// Error taxonomy carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NoNode,
    NodeExists,
    NotEmpty,
    BadVersion,
    Internal,
}

/// Frames the server sends: correlated replies or pushed watch events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "frame", rename_all = "snake_case")]
pub enum ServerFrame {
    Reply { id: u64, body: ReplyBody },
    Event { path: String, kind: NodeEventKind },
}

/// Translate a wire error reply into the client error taxonomy.
pub fn error_from_reply(code: ErrorCode, message: String) -> Error {
    match code {
        ErrorCode::NoNode => Error::NoNode(message),
        ErrorCode::NodeExists => Error::NodeExists(message),
        ErrorCode::NotEmpty => Error::NotEmpty(message),
        ErrorCode::BadVersion => Error::BadVersion(message),
        ErrorCode::Internal => Error::Protocol(message),
    }
}

/// Encode a message as a length-prefixed JSON frame.
pub fn encode_frame<T: Serialize>(msg: &T, max_frame_size: usize) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(msg).map_err(|e| Error::Protocol(e.to_string()))?;
    if json.len() > max_frame_size {
        return Err(Error::Protocol(format!(
            "frame too large: {} bytes",
            json.len()
        )));
    }
    let mut buf = Vec::with_capacity(4 + json.len());
    buf.extend_from_slice(&(json.len() as u32).to_be_bytes());
    buf.extend_from_slice(&json);
    Ok(buf)
}

/// Decode a frame body (length prefix already stripped).
pub fn decode_frame<T: for<'de> Deserialize<'de>>(data: &[u8]) -> Result<T> {
    serde_json::from_slice(data).map_err(|e| Error::Protocol(e.to_string()))
}

/// Encode bytes as a lowercase hex string.
pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Decode a lowercase hex string back into bytes.
pub fn from_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_round_trip() {
        let req = Request {
            id: 42,
            op: RequestOp::Create {
                path: "/emberq/sub/trade".into(),
                data: to_hex(b"payload"),
                mode: NodeMode::Persistent,
            },
        };
        let frame = encode_frame(&req, 1024).unwrap();
        assert_eq!(
            u32::from_be_bytes(frame[..4].try_into().unwrap()) as usize,
            frame.len() - 4
        );

        let decoded: Request = decode_frame(&frame[4..]).unwrap();
        assert_eq!(decoded.id, 42);
        match decoded.op {
            RequestOp::Create { path, data, mode } => {
                assert_eq!(path, "/emberq/sub/trade");
                assert_eq!(from_hex(&data).unwrap(), b"payload");
                assert_eq!(mode, NodeMode::Persistent);
            }
            other => panic!("unexpected op: {:?}", other),
        }
    }

    #[test]
    fn test_reply_frame_round_trip() {
        let frame = ServerFrame::Reply {
            id: 7,
            body: ReplyBody::Children {
                children: vec!["g1".into(), "g2".into()],
            },
        };
        let bytes = encode_frame(&frame, 1024).unwrap();
        let decoded: ServerFrame = decode_frame(&bytes[4..]).unwrap();
        match decoded {
            ServerFrame::Reply {
                id,
                body: ReplyBody::Children { children },
            } => {
                assert_eq!(id, 7);
                assert_eq!(children, vec!["g1".to_string(), "g2".to_string()]);
            }
            other => panic!("unexpected frame: {:?}", other),
        }
    }

    #[test]
    fn test_event_frame_round_trip() {
        let frame = ServerFrame::Event {
            path: "/emberq/server/trade".into(),
            kind: NodeEventKind::ChildSetChanged,
        };
        let bytes = encode_frame(&frame, 1024).unwrap();
        let decoded: ServerFrame = decode_frame(&bytes[4..]).unwrap();
        match decoded {
            ServerFrame::Event { path, kind } => {
                assert_eq!(path, "/emberq/server/trade");
                assert_eq!(kind, NodeEventKind::ChildSetChanged);
            }
            other => panic!("unexpected frame: {:?}", other),
        }
    }

    #[test]
    fn test_error_reply_mapping() {
        let err = error_from_reply(ErrorCode::NoNode, "/emberq/x".into());
        assert!(matches!(err, Error::NoNode(_)));
        let err = error_from_reply(ErrorCode::BadVersion, "/emberq/x".into());
        assert!(matches!(err, Error::BadVersion(_)));
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let req = Request {
            id: 1,
            op: RequestOp::GetData {
                path: "/a".repeat(100),
                watch: false,
            },
        };
        assert!(encode_frame(&req, 16).is_err());
    }

    #[test]
    fn test_hex_round_trip() {
        assert_eq!(to_hex(&[0x00, 0xff, 0x7a]), "00ff7a");
        assert_eq!(from_hex("00ff7a").unwrap(), vec![0x00, 0xff, 0x7a]);
        assert!(from_hex("abc").is_none());
        assert!(from_hex("zz").is_none());
    }
}
