use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use rolo_types::api::{ConnectionUpdate, NewConnection};
use rolo_types::models::Connection;

use crate::auth::AppState;
use crate::error::{ApiError, run_db};
use crate::users::Pagination;

pub async fn create_connection(
    State(state): State<AppState>,
    Json(req): Json<NewConnection>,
) -> Result<impl IntoResponse, ApiError> {
    let row = run_db(state, move |db| db.create_connection(&req)).await?;
    Ok((StatusCode::CREATED, Json(row.into_model())))
}

pub async fn get_connection(
    State(state): State<AppState>,
    Path(connection_id): Path<i64>,
) -> Result<Json<Connection>, ApiError> {
    let row = run_db(state, move |db| db.get_connection(connection_id)).await?;
    Ok(Json(row.into_model()))
}

pub async fn list_connections(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<Connection>>, ApiError> {
    let limit = page.limit.min(500);
    let rows = run_db(state, move |db| db.list_connections(limit, page.offset)).await?;
    Ok(Json(rows.into_iter().map(|r| r.into_model()).collect()))
}

/// Edges touching the given user, either endpoint.
pub async fn connections_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<Connection>>, ApiError> {
    let rows = run_db(state, move |db| db.connections_for_user(user_id)).await?;
    Ok(Json(rows.into_iter().map(|r| r.into_model()).collect()))
}

pub async fn update_connection(
    State(state): State<AppState>,
    Path(connection_id): Path<i64>,
    Json(patch): Json<ConnectionUpdate>,
) -> Result<Json<Connection>, ApiError> {
    let row = run_db(state, move |db| db.update_connection(connection_id, &patch)).await?;
    Ok(Json(row.into_model()))
}

pub async fn delete_connection(
    State(state): State<AppState>,
    Path(connection_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    run_db(state, move |db| db.delete_connection(connection_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
