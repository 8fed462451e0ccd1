// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-process coordination backend.
//!
//! Implements the full [`Coordination`] contract -- hierarchical nodes,
//! version-checked writes, single-fire watches, ephemeral cleanup -- against
//! an in-memory node tree. Used by tests and by embedded single-process
//! deployments that do not run a standalone coordination service.

use super::{Coordination, EventSubscriber, NodeEvent, NodeEventKind, NodeMode, NodeStat};
use crate::error::{Error, Result};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone)]
struct Node {
    data: Vec<u8>,
    mode: NodeMode,
    version: i32,
}

/// In-memory hierarchical node store with single-fire watches.
///
/// `close()` models a session disconnect: every ephemeral node is dropped
/// (firing the relevant watches) while the tree itself stays readable, which
/// is what other sessions of the real service would observe.
#[derive(Default)]
pub struct MemoryCoordination {
    nodes: RwLock<BTreeMap<String, Node>>,
    data_watches: Mutex<HashMap<String, Vec<EventSubscriber>>>,
    child_watches: Mutex<HashMap<String, Vec<EventSubscriber>>>,
}

impl MemoryCoordination {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delete `path`. The node must exist and have no children.
    ///
    /// Not part of the [`Coordination`] trait -- the registry layer never
    /// deletes nodes itself; deletion happens through session expiry or
    /// operator tooling.
    pub fn delete(&self, path: &str) -> Result<()> {
        {
            let mut nodes = self.nodes.write();
            if !nodes.contains_key(path) {
                return Err(Error::NoNode(path.to_string()));
            }
            if !child_names(&nodes, path).is_empty() {
                return Err(Error::NotEmpty(path.to_string()));
            }
            nodes.remove(path);
        }
        self.fire_data(path, NodeEventKind::Deleted);
        if let Some(parent) = parent_of(path) {
            self.fire_children(parent);
        }
        Ok(())
    }

    fn arm_data_watch(&self, path: &str, watch: Option<&EventSubscriber>) {
        if let Some(sub) = watch {
            self.data_watches
                .lock()
                .entry(path.to_string())
                .or_default()
                .push(sub.clone());
        }
    }

    fn arm_child_watch(&self, path: &str, watch: Option<&EventSubscriber>) {
        if let Some(sub) = watch {
            self.child_watches
                .lock()
                .entry(path.to_string())
                .or_default()
                .push(sub.clone());
        }
    }

    /// Fire-and-forget the single-fire data watches armed on `path`.
    fn fire_data(&self, path: &str, kind: NodeEventKind) {
        let armed = self.data_watches.lock().remove(path);
        for sub in armed.into_iter().flatten() {
            sub.deliver(NodeEvent {
                path: path.to_string(),
                kind,
            });
        }
    }

    /// Fire-and-forget the single-fire child watches armed on `path`.
    fn fire_children(&self, path: &str) {
        let armed = self.child_watches.lock().remove(path);
        for sub in armed.into_iter().flatten() {
            sub.deliver(NodeEvent {
                path: path.to_string(),
                kind: NodeEventKind::ChildSetChanged,
            });
        }
    }
}

impl Coordination for MemoryCoordination {
    fn exists(&self, path: &str, watch: Option<&EventSubscriber>) -> Result<bool> {
        // An exists watch may be armed on a node that is not there yet.
        self.arm_data_watch(path, watch);
        Ok(self.nodes.read().contains_key(path))
    }

    fn create(&self, path: &str, data: &[u8], mode: NodeMode) -> Result<String> {
        validate_path(path)?;
        {
            let mut nodes = self.nodes.write();
            if nodes.contains_key(path) {
                return Err(Error::NodeExists(path.to_string()));
            }
            if let Some(parent) = parent_of(path) {
                if !nodes.contains_key(parent) {
                    return Err(Error::NoNode(parent.to_string()));
                }
            }
            nodes.insert(
                path.to_string(),
                Node {
                    data: data.to_vec(),
                    mode,
                    version: 0,
                },
            );
        }
        self.fire_data(path, NodeEventKind::Created);
        if let Some(parent) = parent_of(path) {
            self.fire_children(parent);
        }
        Ok(path.to_string())
    }

    fn set_data(&self, path: &str, data: &[u8], version: i32) -> Result<NodeStat> {
        let stat = {
            let mut nodes = self.nodes.write();
            let node = nodes
                .get_mut(path)
                .ok_or_else(|| Error::NoNode(path.to_string()))?;
            if version != -1 && version != node.version {
                return Err(Error::BadVersion(path.to_string()));
            }
            node.data = data.to_vec();
            node.version += 1;
            NodeStat {
                version: node.version,
            }
        };
        self.fire_data(path, NodeEventKind::Changed);
        Ok(stat)
    }

    fn get_data(&self, path: &str, watch: Option<&EventSubscriber>) -> Result<Vec<u8>> {
        let data = {
            let nodes = self.nodes.read();
            nodes
                .get(path)
                .map(|n| n.data.clone())
                .ok_or_else(|| Error::NoNode(path.to_string()))?
        };
        self.arm_data_watch(path, watch);
        Ok(data)
    }

    fn children(&self, path: &str, watch: Option<&EventSubscriber>) -> Result<Vec<String>> {
        let names = {
            let nodes = self.nodes.read();
            if !nodes.contains_key(path) {
                return Err(Error::NoNode(path.to_string()));
            }
            child_names(&nodes, path)
        };
        self.arm_child_watch(path, watch);
        Ok(names)
    }

    fn close(&self) {
        let ephemerals: Vec<String> = {
            let nodes = self.nodes.read();
            nodes
                .iter()
                .filter(|(_, n)| n.mode == NodeMode::Ephemeral)
                .map(|(p, _)| p.clone())
                .collect()
        };
        // Deepest first so children are gone before their parents.
        for path in ephemerals.iter().rev() {
            if let Err(e) = self.delete(path) {
                log::warn!("[COORD] ephemeral sweep failed for {}: {}", path, e);
            }
        }
        if !ephemerals.is_empty() {
            log::info!("[COORD] released {} ephemeral node(s)", ephemerals.len());
        }
    }
}

fn validate_path(path: &str) -> Result<()> {
    let well_formed = path.starts_with('/')
        && path.len() > 1
        && !path.ends_with('/')
        && !path.contains("//");
    if well_formed {
        Ok(())
    } else {
        Err(Error::Protocol(format!("malformed path: {:?}", path)))
    }
}

fn parent_of(path: &str) -> Option<&str> {
    match path.rfind('/') {
        Some(0) | None => None,
        Some(idx) => Some(&path[..idx]),
    }
}

fn child_names(nodes: &BTreeMap<String, Node>, path: &str) -> Vec<String> {
    let prefix = format!("{}/", path);
    nodes
        .range(prefix.clone()..)
        .take_while(|(k, _)| k.starts_with(&prefix))
        .filter_map(|(k, _)| {
            let rest = &k[prefix.len()..];
            if rest.contains('/') {
                None
            } else {
                Some(rest.to_string())
            }
        })
        .collect()
}
