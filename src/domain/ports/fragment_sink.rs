//! Fragment Sink Port
//!
//! Destination for the per-transport configuration fragments.

use crate::domain::entities::ConfigDocument;
use crate::domain::error::SinkError;
use crate::domain::value_objects::ResourceKind;
use async_trait::async_trait;

/// Writes one fragment per servers transport.
///
/// The target of a (kind, name) pair is deterministic, so a rewrite
/// replaces the previous fragment. An unconfigured sink succeeds without
/// doing anything.
#[async_trait]
pub trait FragmentSink: Send + Sync {
    /// Whether fragments are actually written anywhere.
    fn is_enabled(&self) -> bool;

    async fn write_fragment(
        &self,
        kind: ResourceKind,
        name: &str,
        config: &ConfigDocument,
    ) -> Result<(), SinkError>;

    /// Remove the fragment. A fragment that is already gone is a success.
    async fn delete_fragment(&self, kind: ResourceKind, name: &str) -> Result<(), SinkError>;
}
