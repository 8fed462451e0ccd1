// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Subscription binding registration.

use super::registrar::PathRegistrar;
use super::{bind_leaf_name, sub_topic_path};
use crate::binding::{encode_bindings, Binding};
use crate::coordination::NodeMode;
use crate::error::Result;
use std::collections::HashMap;

/// Group a binding list by topic.
///
/// Pure function: the mapping is rebuilt from the input on every call.
pub fn group_by_topic(bindings: Vec<Binding>) -> HashMap<String, Vec<Binding>> {
    let mut groups: HashMap<String, Vec<Binding>> = HashMap::new();
    for binding in bindings {
        groups.entry(binding.topic.clone()).or_default().push(binding);
    }
    groups
}

/// Registers consumer-group binding sets, one payload per topic.
pub struct BindingPublisher {
    registrar: PathRegistrar,
}

impl BindingPublisher {
    /// Create a binding publisher.
    pub fn new(registrar: PathRegistrar) -> Self {
        Self { registrar }
    }

    /// Publish `bindings` for `group_id`, grouped by topic.
    ///
    /// Each topic group is encoded into one payload and written to the
    /// persistent leaf `{root}/sub/{topic}/{groupId}-bind`, overwriting any
    /// previous payload for that group. An encode failure for any topic
    /// aborts the whole call; nodes written for earlier topics remain.
    pub fn publish_bindings(&self, group_id: &str, bindings: Vec<Binding>) -> Result<()> {
        for (topic, mut group) in group_by_topic(bindings) {
            for binding in &mut group {
                binding.group_id = group_id.to_string();
            }

            let payload = match encode_bindings(&group) {
                Ok(payload) => payload,
                Err(e) => {
                    log::warn!(
                        "[BINDING] encode failed for group {} topic {}: {}",
                        group_id,
                        topic,
                        e
                    );
                    return Err(e);
                }
            };

            // TODO: honor Binding::persistent with an ephemeral leaf once
            // non-durable subscriptions are productized.
            let mode = NodeMode::Persistent;

            let branch = sub_topic_path(&topic);
            match self
                .registrar
                .register(&branch, &bind_leaf_name(group_id), mode, &payload)
            {
                Ok(path) => {
                    log::info!("[BINDING] published {} binding(s) at {}", group.len(), path);
                }
                Err(e) => {
                    log::warn!("[BINDING] publish failed at {}: {}", branch, e);
                    return Err(e);
                }
            }
        }
        Ok(())
    }
}
