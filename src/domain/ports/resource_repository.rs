//! Resource Repository Port
//!
//! Defines the interface for the authoritative resource store.
//! Implementations may use SQLite or in-memory storage.

use crate::domain::entities::ResourceRecord;
use crate::domain::error::StoreError;
use crate::domain::value_objects::{ResourceKey, ResourceKind};
use async_trait::async_trait;

/// Durable keyed storage for resource records.
///
/// The (name, provider, protocol, type) key is unique; the implementation
/// enforces it so that racing creates surface as `StoreError::Conflict`
/// to exactly one caller. Collection reads filter to enabled records
/// unless told otherwise; lookups by key never filter.
#[async_trait]
pub trait ResourceRepository: Send + Sync {
    /// Insert a new record. Fails with `Conflict` if the key exists.
    async fn create(&self, record: &ResourceRecord) -> Result<(), StoreError>;

    /// Get the record with exactly this key, enabled or not.
    async fn find_by_key(&self, key: &ResourceKey) -> Result<Option<ResourceRecord>, StoreError>;

    /// Get all records of one protocol and type.
    async fn find_by_kind(
        &self,
        kind: ResourceKind,
        enabled_only: bool,
    ) -> Result<Vec<ResourceRecord>, StoreError>;

    /// Get every enabled record across all protocols and types.
    async fn find_all_enabled(&self) -> Result<Vec<ResourceRecord>, StoreError>;

    /// Get every enabled servers transport, any protocol.
    async fn find_servers_transports(&self) -> Result<Vec<ResourceRecord>, StoreError>;

    /// Replace the enabled flag and config body of an existing record.
    /// Fails with `NotFound` if the key does not exist.
    async fn update(&self, record: &ResourceRecord) -> Result<(), StoreError>;

    /// Remove a record, returning the number of rows removed (0 or 1).
    async fn delete(&self, key: &ResourceKey) -> Result<u64, StoreError>;

    /// Total number of records.
    async fn count(&self) -> Result<u64, StoreError>;
}
