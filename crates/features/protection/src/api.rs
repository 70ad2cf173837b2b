//! HTTP surface: the decrypt RPC and the plaintext-shaped user write.

use crate::error::ProtectionError;
use crate::read::ReadService;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::Json;
use fieldguard_database::{DocumentStore, MemoryStore, Record};
use fieldguard_kernel::security::record_id::ResourceGuard;
use fieldguard_kernel::server::ApiState;
use fieldguard_vault::KeyProvider;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// `OpenAPI` tag for the protection endpoints.
pub const PROTECTION_TAG: &str = "Protection";

/// Decrypt RPC request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DecryptUserRequest {
    /// Id of the user record to decrypt
    #[serde(default)]
    pub user_id: String,
}

/// A user record as JSON object; sensitive fields are plain strings
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct UserRecord(pub Record);

/// Write acknowledgement
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StoredResponse {
    /// Record id
    pub id: String,
    /// Revision assigned by the store
    pub revision: u64,
}

/// Error envelope
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error code and caller-facing message
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// One of `invalid-argument`, `unauthenticated`, `not-found`, `failed-precondition`,
    /// `data-loss`, `internal`
    pub code: String,
    pub message: String,
}

pub fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new().routes(routes!(decrypt_user)).routes(routes!(put_user))
}

/// Builds the read service over the shared state.
#[must_use]
pub fn read_service(state: &ApiState) -> ReadService<MemoryStore, Arc<dyn KeyProvider>> {
    ReadService::new(
        state.store.clone(),
        Arc::clone(&state.keys),
        state.config.database.collection.clone(),
    )
}

#[utoipa::path(
    post,
    path = "/rpc/decrypt-user",
    request_body = DecryptUserRequest,
    responses(
        (status = OK, description = "Decrypted user record", body = UserRecord),
        (status = BAD_REQUEST, description = "Missing or malformed user id", body = ErrorResponse),
        (status = UNAUTHORIZED, description = "Missing or invalid bearer token", body = ErrorResponse),
        (status = NOT_FOUND, description = "No such user", body = ErrorResponse),
        (status = INTERNAL_SERVER_ERROR, description = "Key misconfigured or record failed integrity check", body = ErrorResponse),
    ),
    tag = PROTECTION_TAG,
)]
pub(crate) async fn decrypt_user(
    State(state): State<ApiState>,
    headers: HeaderMap,
    payload: Result<Json<DecryptUserRequest>, JsonRejection>,
) -> Result<Json<UserRecord>, ProtectionError> {
    authorize(&headers, state.config.security.api_token.as_deref())?;
    let Json(request) = payload.map_err(invalid_body)?;

    let record = read_service(&state).get_decrypted_record(&request.user_id).await?;
    Ok(Json(UserRecord(record)))
}

#[utoipa::path(
    put,
    path = "/users/{id}",
    params(("id" = String, Path, description = "User record id")),
    request_body = UserRecord,
    responses(
        (status = OK, description = "Record stored; encryption follows asynchronously", body = StoredResponse),
        (status = BAD_REQUEST, description = "Malformed id or body", body = ErrorResponse),
        (status = UNAUTHORIZED, description = "Missing or invalid bearer token", body = ErrorResponse),
    ),
    tag = PROTECTION_TAG,
)]
pub(crate) async fn put_user(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    payload: Result<Json<UserRecord>, JsonRejection>,
) -> Result<Json<StoredResponse>, ProtectionError> {
    authorize(&headers, state.config.security.api_token.as_deref())?;
    let id = ResourceGuard::verify(&id, "user")?;
    let Json(UserRecord(record)) = payload.map_err(invalid_body)?;

    let doc = state.store.put(&state.config.database.collection, &id, record).await?;
    info!(id = %id, revision = doc.revision, "User record stored");

    Ok(Json(StoredResponse { id, revision: doc.revision }))
}

/// Checks the bearer token when one is configured. An empty token counts as unset.
fn authorize(headers: &HeaderMap, expected: Option<&str>) -> Result<(), ProtectionError> {
    let Some(expected) = expected.filter(|t| !t.is_empty()) else {
        return Ok(());
    };

    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    match presented {
        Some(token) if tokens_match(token.as_bytes(), expected.as_bytes()) => Ok(()),
        _ => {
            warn!("Rejected request with missing or invalid API token");
            Err(ProtectionError::Unauthenticated {
                message: "missing or invalid API token".into(),
                context: None,
            })
        },
    }
}

/// Compares `presented` against `expected` in time that depends only on the expected length.
///
/// Every byte of `expected` is visited whatever `presented` holds, and a length mismatch is
/// folded into the result instead of returning early.
fn tokens_match(presented: &[u8], expected: &[u8]) -> bool {
    let length_differs = u8::from(presented.len() != expected.len());
    let diff = expected
        .iter()
        .enumerate()
        .fold(length_differs, |acc, (i, e)| acc | (e ^ presented.get(i).copied().unwrap_or(!e)));
    diff == 0
}

fn invalid_body(rejection: JsonRejection) -> ProtectionError {
    ProtectionError::InvalidInput { message: rejection.body_text().into(), context: None }
}

impl IntoResponse for ProtectionError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            Self::InvalidInput { message, .. } => {
                (StatusCode::BAD_REQUEST, "invalid-argument", message.to_string())
            },
            Self::Unauthenticated { message, .. } => {
                (StatusCode::UNAUTHORIZED, "unauthenticated", message.to_string())
            },
            Self::NotFound { message, .. } => (StatusCode::NOT_FOUND, "not-found", message.to_string()),
            Self::Config { message, .. } => {
                error!(error = %self, "Encryption key misconfigured");
                (StatusCode::INTERNAL_SERVER_ERROR, "failed-precondition", message.to_string())
            },
            Self::Integrity { .. } => {
                error!(error = %self, "Stored record failed integrity check");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "data-loss",
                    "record failed integrity check".to_owned(),
                )
            },
            Self::Store { .. } | Self::Internal { .. } => {
                error!(error = %self, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal", "internal error".to_owned())
            },
        };

        (status, Json(ErrorResponse { error: ErrorDetail { code: code.to_owned(), message } }))
            .into_response()
    }
}
