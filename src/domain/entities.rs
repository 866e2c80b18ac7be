//! Domain Entities - Core business objects
//!
//! A resource is one named, typed unit of proxy configuration. The store
//! holds `ResourceRecord`s; the upstream proxy reports `MirrorRecord`s;
//! callers receive `ResourceView`s built from either.

use crate::domain::value_objects::{qualified_name, ResourceKey, ResourceKind, Source};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// An opaque resource body.
///
/// Always a JSON object. Only the schema registry and the fragment
/// serializer look inside it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigDocument(Map<String, Value>);

impl ConfigDocument {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Wrap a value if it is a JSON object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

/// The authoritative record of one resource.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceRecord {
    pub name: String,
    pub provider: String,
    pub kind: ResourceKind,
    pub enabled: bool,
    pub config: ConfigDocument,
}

impl ResourceRecord {
    /// New enabled record with the provider assigned by type.
    pub fn originate(name: impl Into<String>, kind: ResourceKind, config: ConfigDocument) -> Self {
        Self {
            name: name.into(),
            provider: kind.resource_type().assigned_provider().to_string(),
            kind,
            enabled: true,
            config,
        }
    }

    pub fn key(&self) -> ResourceKey {
        ResourceKey::new(self.name.clone(), self.provider.clone(), self.kind)
    }

    pub fn qualified_name(&self) -> String {
        qualified_name(&self.name, &self.provider)
    }
}

impl Serialize for ResourceRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ResourceRecord", 6)?;
        s.serialize_field("name", &self.name)?;
        s.serialize_field("provider", &self.provider)?;
        s.serialize_field("protocol", &self.kind.protocol())?;
        s.serialize_field("type", &self.kind.resource_type())?;
        s.serialize_field("enabled", &self.enabled)?;
        s.serialize_field("config", &self.config)?;
        s.end()
    }
}

/// A resource as reported by the upstream proxy, already normalized.
///
/// Never stored and never authoritative.
#[derive(Debug, Clone, PartialEq)]
pub struct MirrorRecord {
    /// Name as the upstream reports it, usually `name@provider`.
    pub name: String,
    pub provider: String,
    pub status: String,
    pub config: ConfigDocument,
}

impl MirrorRecord {
    /// Lift `name`, `provider` and `status` to the top level; every other
    /// key becomes the config body.
    pub fn from_upstream(mut raw: Map<String, Value>) -> Self {
        let mut take = |field: &str| match raw.remove(field) {
            Some(Value::String(s)) => s,
            _ => String::new(),
        };
        let name = take("name");
        let provider = take("provider");
        let status = take("status");
        Self {
            name,
            provider,
            status,
            config: ConfigDocument::new(raw),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.status == "enabled"
    }

    /// True if this entry is the resource addressed by (name, provider),
    /// either as a composite `name@provider` or as separate fields. Entries
    /// without a provider never match.
    pub fn matches(&self, name: &str, provider: &str) -> bool {
        if self.provider.is_empty() {
            return false;
        }
        self.name == qualified_name(name, provider) || (self.name == name && self.provider == provider)
    }
}

/// Caller-facing representation of a resource, tagged with its origin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceView {
    pub name: String,
    pub provider: String,
    pub config: ConfigDocument,
    pub enabled: bool,
    pub source: Source,
}

impl ResourceView {
    pub fn from_record(record: &ResourceRecord) -> Self {
        Self {
            name: record.name.clone(),
            provider: record.provider.clone(),
            config: record.config.clone(),
            enabled: record.enabled,
            source: Source::Database,
        }
    }

    pub fn from_mirror(record: MirrorRecord) -> Self {
        let enabled = record.is_enabled();
        Self {
            name: record.name,
            provider: record.provider,
            config: record.config,
            enabled,
            source: Source::Traefik,
        }
    }
}

/// Merged view of one (protocol, type): key -> representation.
pub type MergedView = HashMap<String, ResourceView>;

/// An upstream entrypoint, passed through untouched.
pub type Entrypoint = Map<String, Value>;
