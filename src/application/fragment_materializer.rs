//! Fragment Materializer
//!
//! Keeps the per-transport fragments in line with the authoritative store.
//! The fragment directory is a cache: anything written here can be
//! rebuilt from the store with [`FragmentMaterializer::restore_all`].

use crate::domain::entities::ResourceRecord;
use crate::domain::error::{SinkError, StoreError};
use crate::domain::ports::{FragmentSink, ResourceRepository};
use crate::domain::value_objects::ResourceKey;
use std::sync::Arc;

/// Outcome of a full restoration pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub succeeded: usize,
    pub failed: usize,
}

pub struct FragmentMaterializer {
    sink: Arc<dyn FragmentSink>,
}

impl FragmentMaterializer {
    pub fn new(sink: Arc<dyn FragmentSink>) -> Self {
        Self { sink }
    }

    /// Project one record onto the sink.
    ///
    /// Enabled transports are (re)written and disabled ones removed; every
    /// other resource type has no fragment and is ignored.
    pub async fn sync(&self, record: &ResourceRecord) -> Result<(), SinkError> {
        if !record.kind.is_servers_transport() {
            return Ok(());
        }
        if record.enabled {
            self.sink
                .write_fragment(record.kind, &record.name, &record.config)
                .await
        } else {
            self.sink.delete_fragment(record.kind, &record.name).await
        }
    }

    /// Remove the fragment of a deleted record, if it has one.
    pub async fn remove(&self, key: &ResourceKey) -> Result<(), SinkError> {
        if !key.kind.is_servers_transport() {
            return Ok(());
        }
        self.sink.delete_fragment(key.kind, &key.name).await
    }

    /// Rewrite the fragment of every enabled transport in the store.
    ///
    /// A failed write is counted and the pass continues. Only a failed
    /// store query ends the pass early.
    pub async fn restore_all(
        &self,
        repo: &dyn ResourceRepository,
    ) -> Result<RestoreReport, StoreError> {
        if !self.sink.is_enabled() {
            tracing::info!("fragment directory not configured, skipping servers transport restoration");
            return Ok(RestoreReport::default());
        }

        tracing::info!("restoring servers transport fragments");
        let transports = repo.find_servers_transports().await.map_err(|e| {
            tracing::error!("failed to query servers transports: {}", e);
            e
        })?;

        if transports.is_empty() {
            tracing::info!("no servers transports in store");
            return Ok(RestoreReport::default());
        }

        let mut report = RestoreReport::default();
        for record in &transports {
            match self
                .sink
                .write_fragment(record.kind, &record.name, &record.config)
                .await
            {
                Ok(()) => report.succeeded += 1,
                Err(e) => {
                    tracing::error!(
                        "failed to restore fragment for {}@{} ({}): {}",
                        record.name,
                        record.provider,
                        record.kind.protocol(),
                        e
                    );
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            "servers transport restoration complete: {} succeeded, {} failed",
            report.succeeded,
            report.failed
        );
        Ok(report)
    }
}
