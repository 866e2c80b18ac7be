//! TOML Fragment Writer
//!
//! Implements FragmentSink as one TOML file per servers transport, read by
//! the proxy's file provider.

use crate::domain::entities::ConfigDocument;
use crate::domain::error::SinkError;
use crate::domain::ports::FragmentSink;
use crate::domain::value_objects::ResourceKind;
use async_trait::async_trait;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

/// File name of the fragment for one transport.
///
/// `traefikr_{protocol}_{type}_{hex(sha256(name))}.toml`; the name is hashed
/// so arbitrary resource names map to safe, distinct file names.
pub fn fragment_file_name(kind: ResourceKind, name: &str) -> String {
    let digest = hex::encode(Sha256::digest(name.as_bytes()));
    format!(
        "traefikr_{}_{}_{}.toml",
        kind.protocol(),
        kind.resource_type(),
        digest
    )
}

/// Render the fragment body: `[{protocol}.serversTransports.{name}]`.
pub fn render_fragment(
    kind: ResourceKind,
    name: &str,
    config: &ConfigDocument,
) -> Result<String, SinkError> {
    let mut transports = serde_json::Map::new();
    transports.insert(name.to_string(), config.to_value());

    let mut root = serde_json::Map::new();
    root.insert(
        kind.protocol().as_str().to_string(),
        json!({ "serversTransports": Value::Object(transports) }),
    );

    toml::to_string(&Value::Object(root)).map_err(|e| SinkError::Serialize(e.to_string()))
}

/// Writes fragments into a directory, or nowhere when unconfigured.
pub struct TomlFragmentWriter {
    dir: Option<PathBuf>,
}

impl TomlFragmentWriter {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    /// A writer that never touches the file system.
    pub fn disabled() -> Self {
        Self { dir: None }
    }

    pub fn fragment_path(&self, kind: ResourceKind, name: &str) -> Option<PathBuf> {
        self.dir
            .as_ref()
            .map(|dir| dir.join(fragment_file_name(kind, name)))
    }
}

#[async_trait]
impl FragmentSink for TomlFragmentWriter {
    fn is_enabled(&self) -> bool {
        self.dir.is_some()
    }

    async fn write_fragment(
        &self,
        kind: ResourceKind,
        name: &str,
        config: &ConfigDocument,
    ) -> Result<(), SinkError> {
        let Some(dir) = self.dir.as_ref() else {
            return Ok(());
        };

        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| SinkError::CreateDir {
                path: dir.display().to_string(),
                source,
            })?;

        let body = render_fragment(kind, name, config)?;
        let path = dir.join(fragment_file_name(kind, name));
        tokio::fs::write(&path, body)
            .await
            .map_err(|source| SinkError::Write {
                path: path.display().to_string(),
                source,
            })?;

        tracing::debug!("wrote fragment {} for {} {}", path.display(), kind, name);
        Ok(())
    }

    async fn delete_fragment(&self, kind: ResourceKind, name: &str) -> Result<(), SinkError> {
        let Some(dir) = self.dir.as_ref() else {
            return Ok(());
        };

        let path = dir.join(fragment_file_name(kind, name));
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!("removed fragment {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SinkError::Delete {
                path: path.display().to_string(),
                source,
            }),
        }
    }
}
