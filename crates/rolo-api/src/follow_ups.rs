use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use rolo_types::api::{Claims, FollowUpUpdate, NewFollowUp};
use rolo_types::models::{FollowUp, FollowUpStatus};

use crate::auth::AppState;
use crate::error::{ApiError, run_db};

#[derive(Debug, Deserialize)]
pub struct FollowUpQuery {
    pub status: Option<FollowUpStatus>,
}

pub async fn create_follow_up(
    State(state): State<AppState>,
    Json(req): Json<NewFollowUp>,
) -> Result<impl IntoResponse, ApiError> {
    let row = run_db(state, move |db| db.create_follow_up(&req)).await?;
    Ok((StatusCode::CREATED, Json(row.into_model())))
}

pub async fn get_follow_up(
    State(state): State<AppState>,
    Path(follow_up_id): Path<i64>,
) -> Result<Json<FollowUp>, ApiError> {
    let row = run_db(state, move |db| db.get_follow_up(follow_up_id)).await?;
    Ok(Json(row.into_model()))
}

/// The authenticated operator's follow-ups, optionally filtered by status
/// (`?status=pending`).
pub async fn list_my_follow_ups(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<FollowUpQuery>,
) -> Result<Json<Vec<FollowUp>>, ApiError> {
    let rows =
        run_db(state, move |db| db.follow_ups_for_user(claims.sub, query.status)).await?;
    Ok(Json(rows.into_iter().map(|r| r.into_model()).collect()))
}

pub async fn follow_ups_for_connection(
    State(state): State<AppState>,
    Path(connection_id): Path<i64>,
) -> Result<Json<Vec<FollowUp>>, ApiError> {
    let rows = run_db(state, move |db| db.follow_ups_for_connection(connection_id)).await?;
    Ok(Json(rows.into_iter().map(|r| r.into_model()).collect()))
}

pub async fn update_follow_up(
    State(state): State<AppState>,
    Path(follow_up_id): Path<i64>,
    Json(patch): Json<FollowUpUpdate>,
) -> Result<Json<FollowUp>, ApiError> {
    let row = run_db(state, move |db| db.update_follow_up(follow_up_id, &patch)).await?;
    Ok(Json(row.into_model()))
}

pub async fn delete_follow_up(
    State(state): State<AppState>,
    Path(follow_up_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    run_db(state, move |db| db.delete_follow_up(follow_up_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
