mod fragment_sink;
mod resource_repository;
mod upstream_mirror;

pub use fragment_sink::FragmentSink;
pub use resource_repository::ResourceRepository;
pub use upstream_mirror::UpstreamMirror;
