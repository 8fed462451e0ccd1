// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Message store abstraction.
//!
//! Defines the contract every storage backend must honor. The durable engine
//! behind it (file, SQL, whatever) is a separate concern; the registry layer
//! and the broker only ever see this trait.

use crate::entity::MessageEntity;
use anyhow::Result;

/// Backend-agnostic message store contract.
///
/// # Contract
///
/// - `save` rejects a duplicate `message_id` and rejects entities already
///   marked committed: the commit flag starts false and is flipped only by
///   `commit`.
/// - `commit` fails for an unknown `message_id`.
/// - `rollback` is defined only for uncommitted entries; it fails once the
///   entity has been committed.
/// - `update_entity` replaces the mutable delivery-tracking fields (owning
///   server, failed-groups set, next delivery time) and never the identity
///   fields. The failed-groups set is append-only and `next_deliver_time`
///   never moves backwards.
/// - Between `save` and `delete` the entity is owned by the store; callers
///   mutate it only through this interface.
pub trait MessageStore: Send + Sync {
    /// Look up an entity by message id.
    fn query(&self, message_id: &str) -> Result<Option<MessageEntity>>;

    /// Persist a new, uncommitted entity.
    fn save(&self, entity: MessageEntity) -> Result<()>;

    /// Mark the publish transaction committed.
    fn commit(&self, message_id: &str) -> Result<()>;

    /// Discard an uncommitted entity.
    fn rollback(&self, message_id: &str) -> Result<()>;

    /// Merge updated delivery-tracking fields into the stored entity.
    fn update_entity(&self, entity: &MessageEntity) -> Result<()>;

    /// Remove an entity.
    fn delete(&self, message_id: &str) -> Result<()>;
}
