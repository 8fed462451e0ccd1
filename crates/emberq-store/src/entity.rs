// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Persisted message entities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity fields of a persisted message. Immutable for the lifetime of the
/// entity; delivery tracking lives on [`MessageEntity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHeader {
    /// Globally unique message id.
    pub message_id: String,

    /// Topic the message was published to.
    pub topic: String,

    /// Application-level message type.
    pub message_type: String,

    /// Publishing group id.
    pub group_id: String,

    /// Expiration timestamp (Unix milliseconds).
    pub expired_time: i64,
}

/// Body encoding of a persisted message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// UTF-8 text body.
    Text,
    /// Opaque byte body.
    Bytes,
}

/// A message as held by the store from `save` until `delete`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEntity {
    /// Identity fields.
    pub header: MessageHeader,

    /// Body encoding.
    pub kind: MessageKind,

    /// Serialized body.
    body: Vec<u8>,

    /// Whether the publish transaction has been committed. Starts false;
    /// flipped only by the store's commit operation.
    pub commit: bool,

    /// Address of the broker server currently owning delivery.
    pub server: String,

    /// Consumer groups that failed delivery; append-only until deletion.
    pub fail_groups: Vec<String>,

    /// Next delivery attempt (Unix milliseconds); never moves backwards.
    pub next_deliver_time: i64,
}

impl MessageEntity {
    /// Create an uncommitted entity with empty delivery tracking.
    pub fn new(header: MessageHeader, kind: MessageKind, body: Vec<u8>) -> Self {
        Self {
            header,
            kind,
            body,
            commit: false,
            server: String::new(),
            fail_groups: Vec::new(),
            next_deliver_time: 0,
        }
    }

    /// The unique message id.
    pub fn message_id(&self) -> &str {
        &self.header.message_id
    }

    /// The topic the message belongs to.
    pub fn topic(&self) -> &str {
        &self.header.topic
    }

    /// The serialized body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

impl fmt::Display for MessageEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "id:{} topic:{} commit:{} body:{}B",
            self.header.message_id,
            self.header.topic,
            self.commit,
            self.body.len()
        )
    }
}
