//! Resource Service - Main application use case
//!
//! Orchestrates validation, the authoritative store, the upstream mirror
//! and fragment materialization. This is the primary interface for the
//! inbound adapter.
//!
//! Writes go schema → store → fragment. A fragment failure is logged and
//! never fails the request.

use crate::application::fragment_materializer::{FragmentMaterializer, RestoreReport};
use crate::domain::entities::{
    ConfigDocument, Entrypoint, MergedView, ResourceRecord, ResourceView,
};
use crate::domain::error::{ResourceError, StoreError};
use crate::domain::ports::{FragmentSink, ResourceRepository, UpstreamMirror};
use crate::domain::services::{merge_list, SchemaKey, SchemaRegistry};
use crate::domain::value_objects::{Protocol, ResourceKey, ResourceKind, ResourceType};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Resource types published through the provider document.
const PROVIDER_SECTIONS: [ResourceType; 3] = [
    ResourceType::Routers,
    ResourceType::Services,
    ResourceType::Middlewares,
];

/// Last path segment of the schema document routes.
const SCHEMA_DOCUMENT_NAME: &str = "schema.json";

/// Knobs of a list request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Seed the view with the upstream mirror.
    pub include_mirror: bool,
    /// Also return disabled authoritative records.
    pub include_disabled: bool,
}

pub struct ResourceService {
    repo: Arc<dyn ResourceRepository>,
    mirror: Arc<dyn UpstreamMirror>,
    schemas: Arc<SchemaRegistry>,
    fragments: FragmentMaterializer,
}

impl ResourceService {
    pub fn new(
        repo: Arc<dyn ResourceRepository>,
        mirror: Arc<dyn UpstreamMirror>,
        schemas: Arc<SchemaRegistry>,
        sink: Arc<dyn FragmentSink>,
    ) -> Self {
        Self {
            repo,
            mirror,
            schemas,
            fragments: FragmentMaterializer::new(sink),
        }
    }

    /// List one (protocol, type), optionally merged with the mirror.
    ///
    /// The mirror is laid down first and authoritative records overwrite
    /// it. An unreachable mirror degrades to authoritative-only results.
    pub async fn list(
        &self,
        protocol: &str,
        resource_type: &str,
        options: ListOptions,
    ) -> Result<MergedView, ResourceError> {
        let kind = ResourceKind::parse(protocol, resource_type)?;

        let records = self
            .repo
            .find_by_kind(kind, !options.include_disabled)
            .await
            .map_err(|e| store_failure("list", e))?;

        let mirrored = if options.include_mirror {
            self.mirror.list_resources(kind).await.unwrap_or_else(|e| {
                tracing::warn!("upstream listing of {} failed, serving store only: {}", kind, e);
                Vec::new()
            })
        } else {
            Vec::new()
        };

        Ok(merge_list(mirrored, &records))
    }

    /// Look up one resource: the store first, the mirror only on a miss.
    pub async fn get(
        &self,
        protocol: &str,
        resource_type: &str,
        name_provider: &str,
    ) -> Result<ResourceView, ResourceError> {
        let kind = ResourceKind::parse(protocol, resource_type)?;
        let key = ResourceKey::from_path(name_provider, kind);

        if let Some(record) = self
            .repo
            .find_by_key(&key)
            .await
            .map_err(|e| store_failure("get", e))?
        {
            return Ok(ResourceView::from_record(&record));
        }

        match self.mirror.get_resource(kind, &key.name, &key.provider).await {
            Ok(record) => Ok(ResourceView::from_mirror(record)),
            Err(e) => {
                tracing::debug!("{} not in store, mirror lookup failed: {}", key, e);
                Err(ResourceError::NotFound)
            }
        }
    }

    /// Validate and store a new resource, then write its fragment.
    ///
    /// The provider is assigned by resource type.
    pub async fn create(
        &self,
        protocol: &str,
        resource_type: &str,
        name: &str,
        config: Value,
    ) -> Result<ResourceRecord, ResourceError> {
        let kind = ResourceKind::parse(protocol, resource_type)?;
        check_name(name)?;
        let config = self.validated(kind, config)?;

        let record = ResourceRecord::originate(name, kind, config);
        self.repo
            .create(&record)
            .await
            .map_err(|e| store_failure("create", e))?;
        tracing::info!("created {}", record.key());

        self.materialize(&record).await;
        Ok(record)
    }

    /// Replace the config of an existing resource wholesale.
    ///
    /// `enabled` is kept unless given. A transport that ends up disabled
    /// loses its fragment.
    pub async fn update(
        &self,
        protocol: &str,
        resource_type: &str,
        name_provider: &str,
        config: Value,
        enabled: Option<bool>,
    ) -> Result<ResourceRecord, ResourceError> {
        let kind = ResourceKind::parse(protocol, resource_type)?;
        let config = self.validated(kind, config)?;
        let key = ResourceKey::from_path(name_provider, kind);

        let mut record = self
            .repo
            .find_by_key(&key)
            .await
            .map_err(|e| store_failure("update", e))?
            .ok_or(ResourceError::NotFound)?;

        record.config = config;
        if let Some(enabled) = enabled {
            record.enabled = enabled;
        }
        self.repo
            .update(&record)
            .await
            .map_err(|e| store_failure("update", e))?;
        tracing::info!("updated {}", key);

        self.materialize(&record).await;
        Ok(record)
    }

    /// Remove a resource and its fragment.
    pub async fn delete(
        &self,
        protocol: &str,
        resource_type: &str,
        name_provider: &str,
    ) -> Result<(), ResourceError> {
        let kind = ResourceKind::parse(protocol, resource_type)?;
        let key = ResourceKey::from_path(name_provider, kind);

        let removed = self
            .repo
            .delete(&key)
            .await
            .map_err(|e| store_failure("delete", e))?;
        if removed == 0 {
            return Err(ResourceError::NotFound);
        }
        tracing::info!("deleted {}", key);

        if let Err(e) = self.fragments.remove(&key).await {
            tracing::warn!("failed to delete fragment for {}: {}", key, e);
        }
        Ok(())
    }

    /// Raw schema document for one (protocol, type).
    pub fn schema(&self, protocol: &str, resource_type: &str) -> Result<&'static str, ResourceError> {
        let kind = ResourceKind::parse(protocol, resource_type)?;
        self.schemas.get_schema(SchemaKey::Resource(kind))
    }

    pub fn entrypoint_schema(&self) -> Result<&'static str, ResourceError> {
        self.schemas.get_schema(SchemaKey::Entrypoints)
    }

    /// The provider document polled by the proxy.
    ///
    /// `{protocol: {type: {name: config}}}` over enabled routers, services
    /// and middlewares, keyed by bare name. Empty sections and protocols
    /// are left out.
    pub async fn provider_config(&self) -> Result<Value, ResourceError> {
        let records = self
            .repo
            .find_all_enabled()
            .await
            .map_err(|e| store_failure("provider config", e))?;

        let mut document = Map::new();
        for protocol in Protocol::ALL {
            let mut sections = Map::new();
            for resource_type in PROVIDER_SECTIONS {
                let entries: Map<String, Value> = records
                    .iter()
                    .filter(|r| {
                        r.kind.protocol() == protocol && r.kind.resource_type() == resource_type
                    })
                    .map(|r| (r.name.clone(), r.config.to_value()))
                    .collect();
                if !entries.is_empty() {
                    sections.insert(resource_type.as_str().to_string(), Value::Object(entries));
                }
            }
            if !sections.is_empty() {
                document.insert(protocol.as_str().to_string(), Value::Object(sections));
            }
        }
        Ok(Value::Object(document))
    }

    pub async fn list_entrypoints(&self) -> Result<Vec<Entrypoint>, ResourceError> {
        self.mirror.list_entrypoints().await.map_err(|e| {
            tracing::warn!("failed to fetch entrypoints: {}", e);
            ResourceError::Upstream(e)
        })
    }

    pub async fn get_entrypoint(&self, name: &str) -> Result<Entrypoint, ResourceError> {
        self.mirror.get_entrypoint(name).await.map_err(|e| {
            tracing::warn!("failed to fetch entrypoint {}: {}", name, e);
            ResourceError::Upstream(e)
        })
    }

    /// Number of records in the store.
    pub async fn resource_count(&self) -> Result<u64, ResourceError> {
        self.repo
            .count()
            .await
            .map_err(|e| store_failure("count", e))
    }

    /// Rebuild every transport fragment from the store.
    pub async fn restore_fragments(&self) -> Result<RestoreReport, ResourceError> {
        Ok(self.fragments.restore_all(self.repo.as_ref()).await?)
    }

    fn validated(&self, kind: ResourceKind, config: Value) -> Result<ConfigDocument, ResourceError> {
        self.schemas.validate(SchemaKey::Resource(kind), &config)?;
        ConfigDocument::from_value(config).ok_or_else(|| {
            ResourceError::Validation(vec!["config must be a JSON object".to_string()])
        })
    }

    async fn materialize(&self, record: &ResourceRecord) {
        if let Err(e) = self.fragments.sync(record).await {
            tracing::warn!("failed to write fragment for {}: {}", record.key(), e);
        }
    }
}

/// Map a store error, logging the ones that are not the caller's fault.
fn store_failure(operation: &str, err: StoreError) -> ResourceError {
    if let StoreError::Backend(msg) = &err {
        tracing::error!("store {} failed: {}", operation, msg);
    }
    err.into()
}

/// Names must stay addressable as a `name[@provider]` path segment that
/// does not collide with the schema route.
fn check_name(name: &str) -> Result<(), ResourceError> {
    let problem = if name.is_empty() {
        "name is required"
    } else if name.contains('@') {
        "name must not contain '@'"
    } else if name == SCHEMA_DOCUMENT_NAME {
        "name 'schema.json' is reserved"
    } else {
        return Ok(());
    };
    Err(ResourceError::Validation(vec![problem.to_string()]))
}
