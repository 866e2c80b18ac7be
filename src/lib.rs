//! traefikr Library
//!
//! This module exposes the traefikr components for use in integration tests
//! and as a library.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;

// Re-export commonly used types
pub use application::{FragmentMaterializer, ListOptions, ResourceService, RestoreReport};
pub use config::{load_config, load_config_from, Config};
pub use domain::entities::{ConfigDocument, MirrorRecord, ResourceRecord, ResourceView};
pub use domain::error::ResourceError;
pub use domain::ports::{FragmentSink, ResourceRepository, UpstreamMirror};
pub use domain::services::{merge_list, SchemaKey, SchemaRegistry};
pub use domain::value_objects::{Protocol, ResourceKey, ResourceKind, ResourceType, Source};
