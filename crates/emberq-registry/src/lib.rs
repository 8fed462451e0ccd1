// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # emberq-registry - broker service discovery and subscription registry
//!
//! The coordination-client layer of the emberq message broker. Broker servers
//! announce liveness, producers announce topic capability, and consumer
//! groups register durable subscription bindings in a hierarchical,
//! watch-capable namespace shared by every node.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use emberq_registry::{CoordinationConfig, CoordinationSession, RegistryClient};
//! use std::sync::Arc;
//!
//! fn main() -> emberq_registry::Result<()> {
//!     let config = CoordinationConfig::from_endpoint_list("zk1:2181,zk2:2181");
//!     let session = Arc::new(CoordinationSession::connect(config)?);
//!     let registry = RegistryClient::new(session)?;
//!
//!     registry
//!         .presence()
//!         .publish_server_presence("10.0.0.7:13800", &["trade".into()])?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +--------------------------------------------------------------------+
//! |                        Broker Components                           |
//! |  PresencePublisher | BindingPublisher | DiscoveryQueries           |
//! +--------------------------------------------------------------------+
//! |                        Registry Layer                              |
//! |  PathRegistrar | WatchSession dispatch | event classification      |
//! +--------------------------------------------------------------------+
//! |                     Coordination Client                            |
//! |  Coordination trait -> MemoryCoordination | CoordinationSession    |
//! +--------------------------------------------------------------------+
//! ```
//!
//! ## Namespace
//!
//! ```text
//! /emberq                                  persistent, bootstrap-created
//! /emberq/server/{topic}/{address}         ephemeral   broker presence
//! /emberq/pub/{topic}/{groupId}/{address}  ephemeral   publisher presence
//! /emberq/sub/{topic}/{groupId}-bind       persistent  encoded binding set
//! ```
//!
//! Watches are single-fire: the window between an event's delivery and the
//! dispatch task re-arming the watch can hide a further change to the same
//! path. Snapshot queries are authoritative; watch callbacks are hints to
//! re-query.

/// Subscription bindings and their wire codec.
pub mod binding;
/// Coordination client configuration.
pub mod config;
/// Coordination service client abstraction and backends.
pub mod coordination;
/// Snapshot queries that arm watches as a side effect.
pub mod discovery;
/// Error types.
pub mod error;
/// Namespace layout, path registration, and the presence/binding publishers.
pub mod registry;
/// Watch callbacks and per-path dispatch sessions.
pub mod watch;

pub use binding::{decode_bindings, encode_bindings, Binding};
pub use config::{ConfirmPolicy, CoordinationConfig, DEFAULT_ENDPOINT};
pub use coordination::{
    Coordination, CoordinationSession, EventSubscriber, MemoryCoordination, NodeEvent,
    NodeEventKind, NodeMode, NodeStat,
};
pub use discovery::DiscoveryQueries;
pub use error::{Error, Result};
pub use registry::{BindingPublisher, PathRegistrar, PresencePublisher, RegistryClient};
pub use watch::{WatchSession, Watcher};
