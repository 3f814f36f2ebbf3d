use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use rolo_db::StoreError;
use rolo_types::api::{Claims, FilterOptions, NewUser, UserUpdate};
use rolo_types::models::User;

use crate::auth::AppState;
use crate::error::{ApiError, run_db};

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

fn default_limit() -> u32 {
    100
}

pub async fn create_contact(
    State(state): State<AppState>,
    Json(req): Json<NewUser>,
) -> Result<impl IntoResponse, ApiError> {
    if req.first_name.is_empty() || req.last_name.is_empty() {
        return Err(ApiError::BadRequest("first and last name are required"));
    }
    let row = run_db(state, move |db| db.create_contact(&req)).await?;
    Ok((StatusCode::CREATED, Json(row.into_model())))
}

pub async fn get_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<User>, ApiError> {
    let row = run_db(state, move |db| db.get_user(claims.sub)).await?;
    Ok(Json(row.into_model()))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<User>, ApiError> {
    let row = run_db(state, move |db| db.get_user(user_id)).await?;
    Ok(Json(row.into_model()))
}

pub async fn get_user_by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<User>, ApiError> {
    let row = run_db(state, move |db| db.get_user_by_username(&username))
        .await?
        .ok_or(ApiError::Store(StoreError::NotFound("user")))?;
    Ok(Json(row.into_model()))
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<User>>, ApiError> {
    let limit = page.limit.min(500);
    let rows = run_db(state, move |db| db.list_users(limit, page.offset)).await?;
    Ok(Json(rows.into_iter().map(|r| r.into_model()).collect()))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(patch): Json<UserUpdate>,
) -> Result<Json<User>, ApiError> {
    let row = run_db(state, move |db| db.update_user(user_id, &patch)).await?;
    Ok(Json(row.into_model()))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    run_db(state, move |db| db.delete_user(user_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Distinct companies/sectors for the contact table filter dropdowns.
pub async fn filter_options(
    State(state): State<AppState>,
) -> Result<Json<FilterOptions>, ApiError> {
    let (companies, sectors) = run_db(state, |db| db.filter_options()).await?;
    Ok(Json(FilterOptions { companies, sectors }))
}
