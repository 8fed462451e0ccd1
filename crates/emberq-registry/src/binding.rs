// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Subscription bindings and their wire codec.
//!
//! A binding is a consumer group's declared interest in a topic, optionally
//! carrying a filtering rule. All bindings a group holds for one topic are
//! encoded into a single payload stored at `{root}/sub/{topic}/{groupId}-bind`.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// A consumer group's subscription to one topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    /// Topic the group subscribes to.
    pub topic: String,

    /// Consumer group identifier; stamped by the publisher at registration.
    #[serde(default)]
    pub group_id: String,

    /// Filtering rule applied to messages of the topic (opaque expression).
    pub rule: String,

    /// Whether the subscription is durable. Carried in the payload but not
    /// yet honored for node creation; see `BindingPublisher`.
    #[serde(default)]
    pub persistent: bool,
}

impl Binding {
    /// Create a binding.
    pub fn new(topic: &str, group_id: &str, rule: &str, persistent: bool) -> Self {
        Self {
            topic: topic.to_string(),
            group_id: group_id.to_string(),
            rule: rule.to_string(),
            persistent,
        }
    }
}

/// Encode a binding set into one payload.
pub fn encode_bindings(bindings: &[Binding]) -> Result<Vec<u8>> {
    serde_json::to_vec(bindings).map_err(|e| Error::Codec(e.to_string()))
}

/// Decode a binding payload.
pub fn decode_bindings(data: &[u8]) -> Result<Vec<Binding>> {
    serde_json::from_slice(data).map_err(|e| Error::Codec(e.to_string()))
}
