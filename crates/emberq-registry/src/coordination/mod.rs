// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Coordination service client abstraction.
//!
//! The registry layer talks to a hierarchical, watch-capable coordination
//! service through the [`Coordination`] trait. Two backends are provided:
//!
//! - [`MemoryCoordination`] -- in-process store for tests and embedded use
//! - [`CoordinationSession`] -- TCP client for a standalone service
//!
//! # Architecture
//!
//! ```text
//! Coordination Trait
//! +-- MemoryCoordination   (in-process node tree, single-fire watches)
//! +-- CoordinationSession  (framed TCP, reader thread demuxes replies/events)
//! ```
//!
//! Watches are single-fire: arming happens as a side effect of `exists`,
//! `get_data`, and `children` when an [`EventSubscriber`] is supplied, and a
//! fired watch must be re-armed to keep observing the path.

pub mod memory;
pub mod protocol;
pub mod session;

pub use memory::MemoryCoordination;
pub use session::CoordinationSession;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TrySendError};

/// Capacity of the per-session watch event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 10;

/// Node creation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeMode {
    /// Survives session disconnects; must be explicitly deleted.
    Persistent,
    /// Bound to the creating session's liveness; removed on disconnect.
    Ephemeral,
}

/// Minimal node metadata returned by conditional writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeStat {
    /// Data version, incremented on every write.
    pub version: i32,
}

/// Normalized view over the coordination service's native event taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeEventKind {
    /// The watched node was created.
    Created,
    /// The watched node was deleted.
    Deleted,
    /// The watched node's data changed.
    Changed,
    /// The watched node's child set changed.
    ChildSetChanged,
}

/// A raw watch event as delivered on the session event channel.
#[derive(Debug, Clone)]
pub struct NodeEvent {
    /// Path the event fired for.
    pub path: String,
    /// What happened.
    pub kind: NodeEventKind,
}

/// Sender half of a watch session's bounded event channel.
///
/// Handed to [`Coordination`] calls to arm watches. Delivery never blocks the
/// backend: an event that would overflow the bounded channel is dropped with
/// a warning (single-fire watches already make the feed lossy; consumers
/// re-query on callbacks rather than treating them as a change log).
#[derive(Clone)]
pub struct EventSubscriber {
    tx: SyncSender<NodeEvent>,
}

impl EventSubscriber {
    /// Deliver an event to the owning watch session.
    pub fn deliver(&self, event: NodeEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(ev)) => {
                log::warn!(
                    "[COORD] event channel full, dropping {:?} for {}",
                    ev.kind,
                    ev.path
                );
            }
            // Session torn down; nothing left to notify.
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}

/// Create a bounded watch event channel of [`EVENT_CHANNEL_CAPACITY`].
pub fn event_channel() -> (EventSubscriber, Receiver<NodeEvent>) {
    let (tx, rx) = sync_channel(EVENT_CHANNEL_CAPACITY);
    (EventSubscriber { tx }, rx)
}

/// Client operations against the hierarchical coordination store.
///
/// All operations are synchronous network round trips and may fail with a
/// connectivity or protocol error; no automatic retries happen at this layer.
/// The handle is safe for concurrent use by multiple callers and is injected
/// explicitly into every registry component.
pub trait Coordination: Send + Sync {
    /// Check whether `path` exists, optionally arming a data watch.
    ///
    /// The watch fires for a later create, delete, or data change of the
    /// path, and may be armed on a node that does not exist yet.
    fn exists(&self, path: &str, watch: Option<&EventSubscriber>) -> Result<bool>;

    /// Create `path` with `data` in the given mode. The parent must exist.
    fn create(&self, path: &str, data: &[u8], mode: NodeMode) -> Result<String>;

    /// Replace the data of `path`. `version` of `-1` writes unconditionally;
    /// any other value must match the node's current version.
    fn set_data(&self, path: &str, data: &[u8], version: i32) -> Result<NodeStat>;

    /// Read the data of `path`, optionally arming a data watch.
    fn get_data(&self, path: &str, watch: Option<&EventSubscriber>) -> Result<Vec<u8>>;

    /// List the child names of `path`, optionally arming a child watch.
    fn children(&self, path: &str, watch: Option<&EventSubscriber>) -> Result<Vec<String>>;

    /// Tear the session down. Ephemeral nodes owned by it are released.
    fn close(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_channel_is_bounded() {
        let (sub, rx) = event_channel();
        for i in 0..EVENT_CHANNEL_CAPACITY + 3 {
            sub.deliver(NodeEvent {
                path: format!("/n{}", i),
                kind: NodeEventKind::Created,
            });
        }
        let delivered: Vec<_> = rx.try_iter().collect();
        assert_eq!(delivered.len(), EVENT_CHANNEL_CAPACITY);
    }

    #[test]
    fn test_deliver_after_receiver_drop_is_silent() {
        let (sub, rx) = event_channel();
        drop(rx);
        sub.deliver(NodeEvent {
            path: "/gone".into(),
            kind: NodeEventKind::Deleted,
        });
    }
}
