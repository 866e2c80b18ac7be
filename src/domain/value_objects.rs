//! Value Objects - Immutable domain primitives
//!
//! The closed vocabulary of protocols and resource types, and the
//! composite key that identifies one resource.

use crate::domain::error::ResourceError;
use serde::{Deserialize, Serialize};

/// Provider assigned to resources served through the HTTP provider endpoint.
pub const DEFAULT_PROVIDER: &str = "http";

/// Provider assigned to servers transports, which reach the proxy as files.
pub const FILE_PROVIDER: &str = "file";

/// Protocol section of the proxy configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Tcp,
    Udp,
}

impl Protocol {
    pub const ALL: [Protocol; 3] = [Protocol::Http, Protocol::Tcp, Protocol::Udp];

    /// Parse a protocol path segment. Matching is exact.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "http" => Some(Self::Http),
            "tcp" => Some(Self::Tcp),
            "udp" => Some(Self::Udp),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        }
    }

    /// Resource types this protocol supports.
    pub fn resource_types(&self) -> &'static [ResourceType] {
        match self {
            Self::Http | Self::Tcp => &[
                ResourceType::Routers,
                ResourceType::Services,
                ResourceType::Middlewares,
                ResourceType::ServersTransport,
                ResourceType::Tls,
            ],
            Self::Udp => &[
                ResourceType::Routers,
                ResourceType::Services,
                ResourceType::Middlewares,
            ],
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of configuration unit within a protocol section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    #[serde(rename = "routers")]
    Routers,
    #[serde(rename = "services")]
    Services,
    #[serde(rename = "middlewares")]
    Middlewares,
    #[serde(rename = "serversTransport")]
    ServersTransport,
    #[serde(rename = "tls")]
    Tls,
}

impl ResourceType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "routers" => Some(Self::Routers),
            "services" => Some(Self::Services),
            "middlewares" => Some(Self::Middlewares),
            "serversTransport" => Some(Self::ServersTransport),
            "tls" => Some(Self::Tls),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Routers => "routers",
            Self::Services => "services",
            Self::Middlewares => "middlewares",
            Self::ServersTransport => "serversTransport",
            Self::Tls => "tls",
        }
    }

    /// Provider this system assigns to resources it originates.
    ///
    /// The caller never chooses it: servers transports are written as
    /// file fragments, everything else is served by the HTTP provider.
    pub fn assigned_provider(&self) -> &'static str {
        match self {
            Self::ServersTransport => FILE_PROVIDER,
            _ => DEFAULT_PROVIDER,
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A valid (protocol, resource type) pair.
///
/// Only obtainable through [`ResourceKind::new`] or [`ResourceKind::parse`],
/// so holding one proves the combination is supported (no udp transports
/// or udp tls).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceKind {
    protocol: Protocol,
    resource_type: ResourceType,
}

impl ResourceKind {
    pub fn new(protocol: Protocol, resource_type: ResourceType) -> Option<Self> {
        protocol
            .resource_types()
            .contains(&resource_type)
            .then_some(Self {
                protocol,
                resource_type,
            })
    }

    /// Parse path segments, distinguishing an unknown protocol from a type
    /// the protocol does not support.
    pub fn parse(protocol: &str, resource_type: &str) -> Result<Self, ResourceError> {
        let proto = Protocol::parse(protocol)
            .ok_or_else(|| ResourceError::InvalidProtocol(protocol.to_string()))?;
        ResourceType::parse(resource_type)
            .and_then(|t| Self::new(proto, t))
            .ok_or_else(|| ResourceError::InvalidType {
                protocol: protocol.to_string(),
                resource_type: resource_type.to_string(),
            })
    }

    /// Every supported combination.
    pub fn all() -> Vec<Self> {
        Protocol::ALL
            .iter()
            .flat_map(|p| {
                p.resource_types().iter().map(move |t| Self {
                    protocol: *p,
                    resource_type: *t,
                })
            })
            .collect()
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    pub fn is_servers_transport(&self) -> bool {
        self.resource_type == ResourceType::ServersTransport
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.protocol, self.resource_type)
    }
}

/// Unique identity of a resource: (name, provider, protocol, type).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    pub name: String,
    pub provider: String,
    pub kind: ResourceKind,
}

impl ResourceKey {
    pub fn new(name: impl Into<String>, provider: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            name: name.into(),
            provider: provider.into(),
            kind,
        }
    }

    /// Build a key from a `name[@provider]` path segment.
    pub fn from_path(name_provider: &str, kind: ResourceKind) -> Self {
        let (name, provider) = parse_name_provider(name_provider);
        Self::new(name, provider, kind)
    }
}

impl std::fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{} ({})", self.name, self.provider, self.kind)
    }
}

/// Split `name@provider`. Without exactly one `@` the whole value up to the
/// first `@` is the name and the provider defaults to `http`.
pub fn parse_name_provider(value: &str) -> (String, String) {
    let parts: Vec<&str> = value.split('@').collect();
    match parts.as_slice() {
        [name, provider] => (name.to_string(), provider.to_string()),
        _ => (
            parts.first().copied().unwrap_or_default().to_string(),
            DEFAULT_PROVIDER.to_string(),
        ),
    }
}

pub fn qualified_name(name: &str, provider: &str) -> String {
    format!("{}@{}", name, provider)
}

/// Where a resource representation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// The authoritative store.
    Database,
    /// The upstream proxy's live view.
    Traefik,
}
