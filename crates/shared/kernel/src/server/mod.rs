//! Shared HTTP plumbing: application state and system routes.

mod health;
mod router;
mod state;

pub use health::HealthResponse;
pub use router::system_router;
pub use state::{ApiState, ApiStateBuilder, ApiStateError, ApiStateInner};

/// `OpenAPI` tag for operational endpoints.
pub const SYSTEM_TAG: &str = "System";
