// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Liveness announcements for broker servers and producers.

use super::registrar::PathRegistrar;
use super::{pub_group_path, server_topic_path};
use crate::coordination::NodeMode;
use crate::error::Result;

/// Publishes ephemeral presence nodes.
///
/// Presence is fail-fast across a topic list: the first failing topic aborts
/// the call and the remaining topics are not attempted. Callers needing
/// per-topic isolation invoke per topic themselves.
pub struct PresencePublisher {
    registrar: PathRegistrar,
}

impl PresencePublisher {
    /// Create a presence publisher.
    pub fn new(registrar: PathRegistrar) -> Self {
        Self { registrar }
    }

    /// Announce a broker server serving `topics`, keyed by its address.
    pub fn publish_server_presence(&self, address: &str, topics: &[String]) -> Result<()> {
        for topic in topics {
            let branch = server_topic_path(topic);
            match self
                .registrar
                .register(&branch, address, NodeMode::Ephemeral, &[])
            {
                Ok(path) => log::info!("[PRESENCE] server registered at {}", path),
                Err(e) => {
                    log::warn!(
                        "[PRESENCE] server registration failed at {}/{}: {}",
                        branch,
                        address,
                        e
                    );
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Announce a producer group able to publish `topics`.
    pub fn publish_topic_capability(
        &self,
        topics: &[String],
        group_id: &str,
        address: &str,
    ) -> Result<()> {
        for topic in topics {
            let branch = pub_group_path(topic, group_id);
            match self
                .registrar
                .register(&branch, address, NodeMode::Ephemeral, &[])
            {
                Ok(path) => log::info!("[PRESENCE] publisher registered at {}", path),
                Err(e) => {
                    log::warn!(
                        "[PRESENCE] publisher registration failed at {}/{}: {}",
                        branch,
                        address,
                        e
                    );
                    return Err(e);
                }
            }
        }
        Ok(())
    }
}
