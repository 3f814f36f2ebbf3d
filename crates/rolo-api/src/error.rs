use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use rolo_db::{Database, StoreError};

use crate::auth::AppState;

/// HTTP surface for the typed store failures, plus the handful of errors
/// that originate in the API layer itself.
#[derive(Debug)]
pub enum ApiError {
    Store(StoreError),
    BadRequest(&'static str),
    Unauthorized,
    Internal,
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Store(err) => match err {
                StoreError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
                StoreError::ConstraintViolation(_) | StoreError::DuplicateEdge(_, _) => {
                    (StatusCode::CONFLICT, err.to_string())
                }
                StoreError::InvalidRange(_) | StoreError::ForeignKeyViolation(_) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
                }
                StoreError::Sqlite(_) | StoreError::LockPoisoned => {
                    error!("database error: {}", err);
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
                }
            },
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, (*msg).to_string()),
            ApiError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "invalid credentials".to_string())
            }
            ApiError::Internal => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Run blocking rusqlite work off the async runtime.
pub async fn run_db<T, F>(state: AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> rolo_db::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?
        .map_err(ApiError::from)
}
