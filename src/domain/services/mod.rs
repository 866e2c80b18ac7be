pub mod reconciler;
mod schema_registry;

pub use reconciler::merge_list;
pub use schema_registry::{SchemaKey, SchemaRegistry};
