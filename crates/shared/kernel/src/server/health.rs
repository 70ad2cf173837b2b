use super::{ApiState, SYSTEM_TAG};
use axum::extract::State;
use axum::http::header;
use axum::{Json, response::IntoResponse};
use fieldguard_database::RecordChanged;
use serde::Serialize;
use std::sync::LazyLock;
use std::time::Instant;
use utoipa::ToSchema;

static STARTED: LazyLock<Instant> = LazyLock::new(Instant::now);

/// Liveness report
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `up` while the write guard is listening, `degraded` otherwise
    status: &'static str,
    /// Server version
    version: &'static str,
    /// Seconds since the first health request
    uptime: u64,
    /// Protected collection
    collection: String,
    /// Subscribers to store change events; zero means new records stay plaintext
    guards: usize,
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = OK, description = "Server and write guard status", body = HealthResponse)),
    tag = SYSTEM_TAG,
)]
pub(super) async fn health_handler(State(state): State<ApiState>) -> impl IntoResponse {
    let guards = state.events.subscriber_count::<RecordChanged>();
    let body = HealthResponse {
        status: if guards > 0 { "up" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        uptime: STARTED.elapsed().as_secs(),
        collection: state.config.database.collection.clone(),
        guards,
    };

    ([(header::CACHE_CONTROL, "no-store")], Json(body))
}
