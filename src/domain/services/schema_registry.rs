//! Schema Registry
//!
//! One JSON Schema per supported (protocol, type) pair plus one for the
//! entrypoint read model. Documents are embedded at build time and
//! compiled once when the registry is constructed.

use crate::domain::error::{ResourceError, SchemaError};
use crate::domain::value_objects::{Protocol, ResourceKind, ResourceType};
use serde_json::Value;
use std::collections::HashMap;

/// Identifies one schema document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKey {
    Resource(ResourceKind),
    Entrypoints,
}

impl std::fmt::Display for SchemaKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resource(kind) => write!(f, "{}", kind),
            Self::Entrypoints => write!(f, "entrypoints"),
        }
    }
}

struct CompiledSchema {
    raw: &'static str,
    validator: jsonschema::Validator,
}

/// Registry of compiled schemas. Read-only after construction.
pub struct SchemaRegistry {
    schemas: HashMap<SchemaKey, CompiledSchema>,
}

impl SchemaRegistry {
    /// Compile every embedded schema.
    pub fn new() -> Result<Self, SchemaError> {
        let keys = ResourceKind::all()
            .into_iter()
            .map(SchemaKey::Resource)
            .chain(std::iter::once(SchemaKey::Entrypoints));

        let mut schemas = HashMap::new();
        for key in keys {
            // every valid kind has a document; see `embedded_document`
            let Some(raw) = embedded_document(key) else {
                continue;
            };
            let doc: Value = serde_json::from_str(raw).map_err(|source| SchemaError::Parse {
                name: key.to_string(),
                source,
            })?;
            let validator = jsonschema::validator_for(&doc).map_err(|e| SchemaError::Compile {
                name: key.to_string(),
                message: e.to_string(),
            })?;
            schemas.insert(key, CompiledSchema { raw, validator });
        }

        tracing::debug!("compiled {} resource schemas", schemas.len());
        Ok(Self { schemas })
    }

    /// The raw schema document.
    pub fn get_schema(&self, key: SchemaKey) -> Result<&'static str, ResourceError> {
        self.schemas
            .get(&key)
            .map(|s| s.raw)
            .ok_or_else(|| ResourceError::SchemaNotFound(key.to_string()))
    }

    /// Check a document against the schema for `key`.
    ///
    /// Every violation is reported, each prefixed with the JSON pointer of
    /// the offending value.
    pub fn validate(&self, key: SchemaKey, document: &Value) -> Result<(), ResourceError> {
        let schema = self
            .schemas
            .get(&key)
            .ok_or_else(|| ResourceError::SchemaNotFound(key.to_string()))?;

        let details: Vec<String> = schema
            .validator
            .iter_errors(document)
            .map(|e| {
                let path = e.instance_path.to_string();
                if path.is_empty() {
                    e.to_string()
                } else {
                    format!("{}: {}", path, e)
                }
            })
            .collect();

        if details.is_empty() {
            Ok(())
        } else {
            Err(ResourceError::Validation(details))
        }
    }
}

fn embedded_document(key: SchemaKey) -> Option<&'static str> {
    let kind = match key {
        SchemaKey::Entrypoints => return Some(include_str!("../../../schemas/entrypoints.json")),
        SchemaKey::Resource(kind) => kind,
    };
    match (kind.protocol(), kind.resource_type()) {
        (Protocol::Http, ResourceType::Routers) => {
            Some(include_str!("../../../schemas/http_routers.json"))
        }
        (Protocol::Http, ResourceType::Services) => {
            Some(include_str!("../../../schemas/http_services.json"))
        }
        (Protocol::Http, ResourceType::Middlewares) => {
            Some(include_str!("../../../schemas/http_middlewares.json"))
        }
        (Protocol::Http, ResourceType::ServersTransport) => {
            Some(include_str!("../../../schemas/http_serversTransport.json"))
        }
        (Protocol::Http, ResourceType::Tls) => Some(include_str!("../../../schemas/http_tls.json")),
        (Protocol::Tcp, ResourceType::Routers) => {
            Some(include_str!("../../../schemas/tcp_routers.json"))
        }
        (Protocol::Tcp, ResourceType::Services) => {
            Some(include_str!("../../../schemas/tcp_services.json"))
        }
        (Protocol::Tcp, ResourceType::Middlewares) => {
            Some(include_str!("../../../schemas/tcp_middlewares.json"))
        }
        (Protocol::Tcp, ResourceType::ServersTransport) => {
            Some(include_str!("../../../schemas/tcp_serversTransport.json"))
        }
        (Protocol::Tcp, ResourceType::Tls) => Some(include_str!("../../../schemas/tcp_tls.json")),
        (Protocol::Udp, ResourceType::Routers) => {
            Some(include_str!("../../../schemas/udp_routers.json"))
        }
        (Protocol::Udp, ResourceType::Services) => {
            Some(include_str!("../../../schemas/udp_services.json"))
        }
        (Protocol::Udp, ResourceType::Middlewares) => {
            Some(include_str!("../../../schemas/udp_middlewares.json"))
        }
        (Protocol::Udp, ResourceType::ServersTransport | ResourceType::Tls) => None,
    }
}
