//! Application layer - use cases over the domain ports.

mod fragment_materializer;
mod resource_service;

pub use fragment_materializer::{FragmentMaterializer, RestoreReport};
pub use resource_service::{ListOptions, ResourceService};
