// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Broker namespace layout and the registry facade.
//!
//! Every broker node shares one hierarchical namespace under a fixed root:
//!
//! ```text
//! /emberq                                  persistent, bootstrap-created
//! /emberq/server/{topic}/{address}         ephemeral   broker presence
//! /emberq/pub/{topic}/{groupId}/{address}  ephemeral   publisher presence
//! /emberq/sub/{topic}/{groupId}-bind       persistent  encoded binding set
//! ```

pub mod presence;
pub mod publisher;
pub mod registrar;

pub use presence::PresencePublisher;
pub use publisher::BindingPublisher;
pub use registrar::PathRegistrar;

use crate::config::ConfirmPolicy;
use crate::coordination::{Coordination, NodeMode};
use crate::discovery::DiscoveryQueries;
use crate::error::{Error, Result};
use std::sync::Arc;

/// Fixed namespace root; not configurable.
pub const ROOT: &str = "/emberq";
/// Broker server presence sub-tree.
pub const SERVER_ROOT: &str = "/emberq/server";
/// Publisher presence sub-tree.
pub const PUB_ROOT: &str = "/emberq/pub";
/// Subscription binding sub-tree.
pub const SUB_ROOT: &str = "/emberq/sub";
/// Suffix of a binding leaf node name.
pub const BIND_SUFFIX: &str = "-bind";

/// Server presence branch for a topic.
pub fn server_topic_path(topic: &str) -> String {
    format!("{}/{}", SERVER_ROOT, topic)
}

/// Publisher presence branch for a (topic, group) pair.
pub fn pub_group_path(topic: &str, group_id: &str) -> String {
    format!("{}/{}/{}", PUB_ROOT, topic, group_id)
}

/// Subscription branch for a topic.
pub fn sub_topic_path(topic: &str) -> String {
    format!("{}/{}", SUB_ROOT, topic)
}

/// Leaf node name holding a group's encoded binding set.
pub fn bind_leaf_name(group_id: &str) -> String {
    format!("{}{}", group_id, BIND_SUFFIX)
}

/// True for paths of the form `{root}/sub/{topic}/{groupId}-bind`.
///
/// Anything shallower, or whose 4th segment lacks a `-bind`-suffixed name
/// with a non-empty stem, is structural namespace traffic rather than a
/// binding payload.
pub fn is_binding_leaf(path: &str) -> bool {
    match path.split('/').nth(4) {
        Some(leaf) => leaf.len() > BIND_SUFFIX.len() && leaf.ends_with(BIND_SUFFIX),
        None => false,
    }
}

/// Entry point to the registry layer.
///
/// Wraps an injected coordination handle, ensures the namespace root exists,
/// and hands out the publishers and discovery queries. Construction fails if
/// the root cannot be created -- callers treat that as fatal to startup.
pub struct RegistryClient {
    coord: Arc<dyn Coordination>,
    confirm: ConfirmPolicy,
}

impl RegistryClient {
    /// Bootstrap the namespace root and build the facade.
    pub fn new(coord: Arc<dyn Coordination>) -> Result<Self> {
        Self::with_confirm(coord, ConfirmPolicy::default())
    }

    /// Same as [`RegistryClient::new`] with an explicit confirmation policy.
    pub fn with_confirm(coord: Arc<dyn Coordination>, confirm: ConfirmPolicy) -> Result<Self> {
        if !coord.exists(ROOT, None)? {
            match coord.create(ROOT, &[], NodeMode::Persistent) {
                Ok(path) => log::info!("[REGISTRY] created root {}", path),
                // Lost the bootstrap race to another broker; fine.
                Err(Error::NodeExists(_)) => {}
                Err(e) => {
                    log::warn!("[REGISTRY] root bootstrap failed: {}", e);
                    return Err(e);
                }
            }
        }
        Ok(Self { coord, confirm })
    }

    /// The underlying coordination handle.
    pub fn coordination(&self) -> Arc<dyn Coordination> {
        Arc::clone(&self.coord)
    }

    /// Presence publisher for servers and producers.
    pub fn presence(&self) -> PresencePublisher {
        PresencePublisher::new(self.registrar())
    }

    /// Subscription binding publisher for consumer groups.
    pub fn bindings(&self) -> BindingPublisher {
        BindingPublisher::new(self.registrar())
    }

    /// Discovery queries (snapshot + watch).
    pub fn discovery(&self) -> DiscoveryQueries {
        DiscoveryQueries::new(Arc::clone(&self.coord))
    }

    fn registrar(&self) -> PathRegistrar {
        PathRegistrar::new(Arc::clone(&self.coord), self.confirm.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordination::MemoryCoordination;

    #[test]
    fn test_path_builders() {
        assert_eq!(server_topic_path("trade"), "/emberq/server/trade");
        assert_eq!(pub_group_path("trade", "g1"), "/emberq/pub/trade/g1");
        assert_eq!(sub_topic_path("trade"), "/emberq/sub/trade");
        assert_eq!(bind_leaf_name("g1"), "g1-bind");
    }

    #[test]
    fn test_is_binding_leaf() {
        assert!(is_binding_leaf("/emberq/sub/trade/g1-bind"));
        assert!(is_binding_leaf("/emberq/sub/trade/g1-bind/extra"));

        // Too shallow.
        assert!(!is_binding_leaf("/emberq/sub/trade"));
        assert!(!is_binding_leaf("/emberq/sub"));
        // Wrong leaf name.
        assert!(!is_binding_leaf("/emberq/sub/trade/g1"));
        // Empty stem.
        assert!(!is_binding_leaf("/emberq/sub/trade/-bind"));
    }

    #[test]
    fn test_new_bootstraps_root() {
        let coord = Arc::new(MemoryCoordination::new());
        assert!(!coord.exists(ROOT, None).unwrap());

        let _registry = RegistryClient::new(coord.clone()).unwrap();
        assert!(coord.exists(ROOT, None).unwrap());

        // Second bootstrap against an existing root succeeds too.
        let _registry = RegistryClient::new(coord.clone()).unwrap();
    }
}
