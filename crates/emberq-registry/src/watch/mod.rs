// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Watch callbacks and the per-path dispatch session.
//!
//! Raw coordination events are classified into broker-level semantics and
//! delivered through the [`Watcher`] capability: data-level events (server
//! joined/left, binding changed) via `event_notify`, structural events via
//! `child_watcher`. Each armed path owns one dispatch task; the underlying
//! watch mechanism is single-fire, so the task re-arms after every event.

pub mod session;

pub use session::WatchSession;

use crate::binding::Binding;
use crate::coordination::NodeEventKind;

/// Consumer of classified discovery events.
///
/// Both methods are invoked from the dispatch task's thread; implementations
/// must not block indefinitely, or that path's watch re-arming stalls.
/// Callbacks are hints to re-query, not a lossless change feed.
pub trait Watcher: Send + Sync {
    /// A data-level event fired for `path`. `bindings` is populated only for
    /// a changed binding leaf.
    fn event_notify(&self, path: &str, kind: NodeEventKind, bindings: Option<Vec<Binding>>);

    /// The child set of `path` changed; `children` is the fresh listing.
    fn child_watcher(&self, path: &str, children: Vec<String>);
}
