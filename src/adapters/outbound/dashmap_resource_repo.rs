//! DashMap Resource Repository
//!
//! Implements ResourceRepository in memory using DashMap for concurrent
//! access. Nothing survives the process.

use crate::domain::entities::ResourceRecord;
use crate::domain::error::StoreError;
use crate::domain::ports::ResourceRepository;
use crate::domain::value_objects::{ResourceKey, ResourceKind};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// DashMap-backed resource repository.
///
/// Uniqueness is decided inside the entry API, so of two racing creates
/// for one key exactly one wins.
pub struct DashMapResourceRepository {
    records: Arc<DashMap<ResourceKey, ResourceRecord>>,
}

impl DashMapResourceRepository {
    pub fn new() -> Self {
        Self {
            records: Arc::new(DashMap::new()),
        }
    }

    fn collect<F>(&self, filter: F) -> Vec<ResourceRecord>
    where
        F: Fn(&ResourceRecord) -> bool,
    {
        self.records
            .iter()
            .filter(|e| filter(e.value()))
            .map(|e| e.value().clone())
            .collect()
    }
}

impl Default for DashMapResourceRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResourceRepository for DashMapResourceRepository {
    async fn create(&self, record: &ResourceRecord) -> Result<(), StoreError> {
        match self.records.entry(record.key()) {
            Entry::Occupied(e) => Err(StoreError::Conflict(e.key().to_string())),
            Entry::Vacant(e) => {
                e.insert(record.clone());
                Ok(())
            }
        }
    }

    async fn find_by_key(&self, key: &ResourceKey) -> Result<Option<ResourceRecord>, StoreError> {
        Ok(self.records.get(key).map(|e| e.value().clone()))
    }

    async fn find_by_kind(
        &self,
        kind: ResourceKind,
        enabled_only: bool,
    ) -> Result<Vec<ResourceRecord>, StoreError> {
        Ok(self.collect(|r| r.kind == kind && (r.enabled || !enabled_only)))
    }

    async fn find_all_enabled(&self) -> Result<Vec<ResourceRecord>, StoreError> {
        Ok(self.collect(|r| r.enabled))
    }

    async fn find_servers_transports(&self) -> Result<Vec<ResourceRecord>, StoreError> {
        Ok(self.collect(|r| r.enabled && r.kind.is_servers_transport()))
    }

    async fn update(&self, record: &ResourceRecord) -> Result<(), StoreError> {
        let key = record.key();
        match self.records.get_mut(&key) {
            Some(mut existing) => {
                existing.enabled = record.enabled;
                existing.config = record.config.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(key.to_string())),
        }
    }

    async fn delete(&self, key: &ResourceKey) -> Result<u64, StoreError> {
        Ok(self.records.remove(key).map_or(0, |_| 1))
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.records.len() as u64)
    }
}
