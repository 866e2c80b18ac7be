//! Upstream Mirror Port
//!
//! Read-only access to the proxy's live introspection API.

use crate::domain::entities::{Entrypoint, MirrorRecord};
use crate::domain::error::UpstreamError;
use crate::domain::value_objects::ResourceKind;
use async_trait::async_trait;

/// Live view of the configuration the proxy is currently running.
///
/// Records are returned already normalized to the store's shape. A kind
/// the upstream does not know is an empty list, not an error.
#[async_trait]
pub trait UpstreamMirror: Send + Sync {
    async fn list_entrypoints(&self) -> Result<Vec<Entrypoint>, UpstreamError>;

    /// Fails with `UpstreamError::NotFound` if no entrypoint has this name.
    async fn get_entrypoint(&self, name: &str) -> Result<Entrypoint, UpstreamError>;

    async fn list_resources(&self, kind: ResourceKind) -> Result<Vec<MirrorRecord>, UpstreamError>;

    /// Find one resource by listing and matching on name and provider.
    async fn get_resource(
        &self,
        kind: ResourceKind,
        name: &str,
        provider: &str,
    ) -> Result<MirrorRecord, UpstreamError> {
        self.list_resources(kind)
            .await?
            .into_iter()
            .find(|r| r.matches(name, provider))
            .ok_or_else(|| UpstreamError::NotFound(format!("{} {}@{}", kind, name, provider)))
    }
}
