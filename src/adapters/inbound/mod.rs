mod api_server;

pub use api_server::{build_router, ApiError, ApiServer, ApiState, API_KEY_HEADER};

// Re-export for external use (e.g., integration tests)
#[allow(unused_imports)]
pub use api_server::{CreateRequest, ErrorBody, HealthResponse, ListQuery, UpdateRequest};
