// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Hierarchical path registration.

use crate::config::ConfirmPolicy;
use crate::coordination::{Coordination, NodeMode};
use crate::error::{Error, Result};
use std::sync::Arc;
use std::thread;

/// Creates namespace branches and leaves, absorbing partial failures.
///
/// Registration is idempotent: existing branch nodes are left alone, an
/// existing leaf has its data overwritten. Every freshly created node is
/// confirmed visible with a bounded backoff poll before proceeding; an
/// unconfirmed node is logged and the operation continues optimistically.
#[derive(Clone)]
pub struct PathRegistrar {
    coord: Arc<dyn Coordination>,
    confirm: ConfirmPolicy,
}

impl PathRegistrar {
    /// Create a registrar over the given coordination handle.
    pub fn new(coord: Arc<dyn Coordination>, confirm: ConfirmPolicy) -> Self {
        Self { coord, confirm }
    }

    /// Register `path/child`: every segment of `path` is created as a
    /// persistent, data-less node if absent, then the leaf is created with
    /// the requested `mode` and `data`. Returns the full leaf path.
    pub fn register(
        &self,
        path: &str,
        child: &str,
        mode: NodeMode,
        data: &[u8],
    ) -> Result<String> {
        self.create_branch(path)?;
        let leaf = format!("{}/{}", path, child);
        self.ensure_node(&leaf, data, mode)?;
        Ok(leaf)
    }

    fn create_branch(&self, path: &str) -> Result<()> {
        let mut node = String::with_capacity(path.len());
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            node.push('/');
            node.push_str(segment);
            self.ensure_node(&node, &[], NodeMode::Persistent)?;
        }
        Ok(())
    }

    fn ensure_node(&self, path: &str, data: &[u8], mode: NodeMode) -> Result<()> {
        if self.coord.exists(path, None)? {
            if !data.is_empty() {
                self.coord.set_data(path, data, -1)?;
            }
            return Ok(());
        }

        match self.coord.create(path, data, mode) {
            Ok(_) => {
                self.confirm_visible(path);
                Ok(())
            }
            // Lost a creation race; converge on the overwrite behavior.
            Err(Error::NodeExists(_)) => {
                if !data.is_empty() {
                    self.coord.set_data(path, data, -1)?;
                }
                Ok(())
            }
            Err(e) => {
                log::warn!("[REGISTRY] create failed for {}: {}", path, e);
                Err(e)
            }
        }
    }

    fn confirm_visible(&self, path: &str) {
        for attempt in 0..self.confirm.max_attempts {
            match self.coord.exists(path, None) {
                Ok(true) => return,
                Ok(false) | Err(_) => thread::sleep(self.confirm.backoff(attempt)),
            }
        }
        if self.confirm.max_attempts > 0 {
            log::warn!(
                "[REGISTRY] {} not visible after {} confirmation attempt(s)",
                path,
                self.confirm.max_attempts
            );
        }
    }
}
