mod dashmap_resource_repo;
mod sqlite_resource_repo;
mod toml_fragment_writer;
mod traefik_api_client;

pub use dashmap_resource_repo::DashMapResourceRepository;
pub use sqlite_resource_repo::SqliteResourceRepository;
pub use toml_fragment_writer::{fragment_file_name, render_fragment, TomlFragmentWriter};
pub use traefik_api_client::{TraefikApiClient, TraefikClientConfig};
