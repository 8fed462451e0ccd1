// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-memory reference store.
//!
//! Enforces the full [`MessageStore`] contract against a hash map. Used by
//! tests and as the reference behavior for durable backends, which live
//! elsewhere.

use crate::entity::MessageEntity;
use crate::store::MessageStore;
use anyhow::{bail, Result};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory message store.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, MessageEntity>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entities.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    /// True when no entities are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.read().unwrap().is_empty()
    }
}

impl MessageStore for MemoryStore {
    fn query(&self, message_id: &str) -> Result<Option<MessageEntity>> {
        Ok(self.entries.read().unwrap().get(message_id).cloned())
    }

    fn save(&self, entity: MessageEntity) -> Result<()> {
        if entity.commit {
            bail!("entity {} is already committed", entity.message_id());
        }
        let mut entries = self.entries.write().unwrap();
        match entries.entry(entity.message_id().to_string()) {
            Entry::Occupied(_) => bail!("duplicate message id: {}", entity.message_id()),
            Entry::Vacant(slot) => {
                tracing::debug!(message_id = %entity.message_id(), "saved");
                slot.insert(entity);
                Ok(())
            }
        }
    }

    fn commit(&self, message_id: &str) -> Result<()> {
        let mut entries = self.entries.write().unwrap();
        let Some(entity) = entries.get_mut(message_id) else {
            bail!("unknown message id: {}", message_id);
        };
        entity.commit = true;
        tracing::debug!(message_id, "committed");
        Ok(())
    }

    fn rollback(&self, message_id: &str) -> Result<()> {
        let mut entries = self.entries.write().unwrap();
        match entries.get(message_id) {
            None => bail!("unknown message id: {}", message_id),
            Some(entity) if entity.commit => {
                bail!("message {} is already committed", message_id)
            }
            Some(_) => {
                entries.remove(message_id);
                tracing::debug!(message_id, "rolled back");
                Ok(())
            }
        }
    }

    fn update_entity(&self, entity: &MessageEntity) -> Result<()> {
        let mut entries = self.entries.write().unwrap();
        let Some(stored) = entries.get_mut(entity.message_id()) else {
            bail!("unknown message id: {}", entity.message_id());
        };

        stored.server = entity.server.clone();
        for group in &entity.fail_groups {
            if !stored.fail_groups.contains(group) {
                stored.fail_groups.push(group.clone());
            }
        }
        stored.next_deliver_time = stored.next_deliver_time.max(entity.next_deliver_time);
        Ok(())
    }

    fn delete(&self, message_id: &str) -> Result<()> {
        let mut entries = self.entries.write().unwrap();
        if entries.remove(message_id).is_none() {
            bail!("unknown message id: {}", message_id);
        }
        tracing::debug!(message_id, "deleted");
        Ok(())
    }
}
