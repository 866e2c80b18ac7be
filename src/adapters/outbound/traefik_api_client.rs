//! Traefik API Client
//!
//! Implements UpstreamMirror over the proxy's read-only introspection API
//! (`/api/entrypoints`, `/api/{protocol}/{type}`).

use crate::domain::entities::{Entrypoint, MirrorRecord};
use crate::domain::error::UpstreamError;
use crate::domain::ports::UpstreamMirror;
use crate::domain::value_objects::ResourceKind;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

/// Connection settings for the upstream API.
#[derive(Debug, Clone)]
pub struct TraefikClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub basic_auth_username: Option<String>,
    pub basic_auth_password: Option<String>,
    pub api_key_header: Option<String>,
    pub api_key_secret: Option<String>,
}

impl Default for TraefikClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://traefik:8080".to_string(),
            timeout: Duration::from_secs(10),
            basic_auth_username: None,
            basic_auth_password: None,
            api_key_header: None,
            api_key_secret: None,
        }
    }
}

/// Credentials attached to every upstream request.
#[derive(Debug, Clone, PartialEq)]
enum Credentials {
    None,
    Basic { username: String, password: String },
    Header { name: String, secret: String },
}

impl Credentials {
    /// Basic auth wins over the header scheme when both are configured.
    fn from_config(config: &TraefikClientConfig) -> Self {
        if let Some(username) = config.basic_auth_username.as_deref().filter(|u| !u.is_empty()) {
            return Self::Basic {
                username: username.to_string(),
                password: config.basic_auth_password.clone().unwrap_or_default(),
            };
        }
        if let Some(name) = config.api_key_header.as_deref().filter(|h| !h.is_empty()) {
            return Self::Header {
                name: name.to_string(),
                secret: config.api_key_secret.clone().unwrap_or_default(),
            };
        }
        Self::None
    }
}

/// reqwest-backed upstream mirror.
pub struct TraefikApiClient {
    base_url: String,
    client: reqwest::Client,
    credentials: Credentials,
}

impl TraefikApiClient {
    pub fn new(config: TraefikClientConfig) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials: Credentials::from_config(&config),
            client,
        })
    }

    async fn fetch(&self, path: &str) -> Result<reqwest::Response, UpstreamError> {
        let url = format!("{}{}", self.base_url, path);
        let request = self.client.get(&url);
        let request = match &self.credentials {
            Credentials::None => request,
            Credentials::Basic { username, password } => {
                request.basic_auth(username, Some(password))
            }
            Credentials::Header { name, secret } => request.header(name.as_str(), secret.as_str()),
        };

        tracing::debug!("upstream GET {}", url);
        request
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))
    }

    async fn decode_list(response: reqwest::Response) -> Result<Vec<Value>, UpstreamError> {
        response
            .json::<Vec<Value>>()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))
    }
}

/// Keep the JSON objects of an upstream listing; anything else is skipped.
fn objects(items: Vec<Value>) -> impl Iterator<Item = serde_json::Map<String, Value>> {
    items.into_iter().filter_map(|item| match item {
        Value::Object(map) => Some(map),
        _ => None,
    })
}

#[async_trait]
impl UpstreamMirror for TraefikApiClient {
    async fn list_entrypoints(&self) -> Result<Vec<Entrypoint>, UpstreamError> {
        let response = self.fetch("/api/entrypoints").await?;
        if response.status() != StatusCode::OK {
            return Err(UpstreamError::Status(response.status().as_u16()));
        }
        Ok(objects(Self::decode_list(response).await?).collect())
    }

    async fn get_entrypoint(&self, name: &str) -> Result<Entrypoint, UpstreamError> {
        self.list_entrypoints()
            .await?
            .into_iter()
            .find(|ep| ep.get("name").and_then(Value::as_str) == Some(name))
            .ok_or_else(|| UpstreamError::NotFound(format!("entrypoint {}", name)))
    }

    async fn list_resources(&self, kind: ResourceKind) -> Result<Vec<MirrorRecord>, UpstreamError> {
        let path = format!("/api/{}/{}", kind.protocol(), kind.resource_type());
        let response = self.fetch(&path).await?;
        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => return Ok(Vec::new()),
            other => return Err(UpstreamError::Status(other.as_u16())),
        }
        Ok(objects(Self::decode_list(response).await?)
            .map(MirrorRecord::from_upstream)
            .collect())
    }
}
