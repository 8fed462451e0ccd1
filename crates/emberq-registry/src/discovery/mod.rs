// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Snapshot queries that arm watches as a side effect.
//!
//! A consumer fetches the current set of servers or bindings for a topic and
//! simultaneously arms a [`WatchSession`](crate::watch::WatchSession) on the
//! topic path. The snapshot is authoritative; subsequent watch callbacks are
//! hints to re-query.

use crate::binding::Binding;
use crate::coordination::Coordination;
use crate::error::Result;
use crate::registry::{server_topic_path, sub_topic_path};
use crate::watch::session::fetch_bindings;
use crate::watch::WatchSession;
use std::sync::Arc;

/// Discovery queries over the broker namespace.
pub struct DiscoveryQueries {
    coord: Arc<dyn Coordination>,
}

impl DiscoveryQueries {
    /// Create discovery queries over the given coordination handle.
    pub fn new(coord: Arc<dyn Coordination>) -> Self {
        Self { coord }
    }

    /// Current broker servers for `topic`, arming `session` on the path.
    ///
    /// An unknown topic yields an empty list, never an error; the existence
    /// watch stays armed so the topic's creation is observed, but no child
    /// listing is attempted and the dispatch task is not started.
    pub fn servers_and_watch(
        &self,
        topic: &str,
        session: &mut WatchSession,
    ) -> Result<Vec<String>> {
        let path = server_topic_path(topic);
        let subscriber = session.subscriber();

        if !self.coord.exists(&path, Some(&subscriber))? {
            return Ok(Vec::new());
        }

        let servers = match self.coord.children(&path, Some(&subscriber)) {
            Ok(servers) => servers,
            Err(e) => {
                log::warn!("[DISCOVERY] server listing failed for {}: {}", path, e);
                return Err(e);
            }
        };

        session.start_dispatch(Arc::clone(&self.coord), &path)?;
        Ok(servers)
    }

    /// Current binding sets for `topic` across all consumer groups, arming
    /// `session` on the path.
    ///
    /// Aggregation is partial-success: a group whose payload fails to fetch
    /// or decode is logged and omitted; the other groups still contribute.
    pub fn bindings_and_watch(
        &self,
        topic: &str,
        session: &mut WatchSession,
    ) -> Result<Vec<Binding>> {
        let path = sub_topic_path(topic);
        let subscriber = session.subscriber();

        if !self.coord.exists(&path, Some(&subscriber))? {
            return Ok(Vec::new());
        }

        let groups = match self.coord.children(&path, Some(&subscriber)) {
            Ok(groups) => groups,
            Err(e) => {
                log::warn!("[DISCOVERY] group listing failed for {}: {}", path, e);
                return Err(e);
            }
        };

        session.start_dispatch(Arc::clone(&self.coord), &path)?;

        let mut bindings = Vec::with_capacity(groups.len());
        for group in &groups {
            let leaf = format!("{}/{}", path, group);
            match fetch_bindings(self.coord.as_ref(), &leaf, &subscriber) {
                Ok(group_bindings) => bindings.extend(group_bindings),
                Err(e) => {
                    log::warn!("[DISCOVERY] binding payload skipped for {}: {}", leaf, e);
                }
            }
        }
        Ok(bindings)
    }
}
