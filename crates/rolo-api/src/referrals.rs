use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use rolo_types::api::{NewReferral, ReferralUpdate};
use rolo_types::models::Referral;

use crate::auth::AppState;
use crate::error::{ApiError, run_db};
use crate::users::Pagination;

pub async fn create_referral(
    State(state): State<AppState>,
    Json(req): Json<NewReferral>,
) -> Result<impl IntoResponse, ApiError> {
    let row = run_db(state, move |db| db.create_referral(&req)).await?;
    Ok((StatusCode::CREATED, Json(row.into_model())))
}

pub async fn get_referral(
    State(state): State<AppState>,
    Path(referral_id): Path<i64>,
) -> Result<Json<Referral>, ApiError> {
    let row = run_db(state, move |db| db.get_referral(referral_id)).await?;
    Ok(Json(row.into_model()))
}

/// The operator's referral pipeline. Single-operator system, so this is
/// every referral, paginated.
pub async fn list_referrals(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<Referral>>, ApiError> {
    let limit = page.limit.min(500);
    let rows = run_db(state, move |db| db.list_referrals(limit, page.offset)).await?;
    Ok(Json(rows.into_iter().map(|r| r.into_model()).collect()))
}

/// Referrals attributed to one contact.
pub async fn referrals_by_referrer(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<Referral>>, ApiError> {
    let rows = run_db(state, move |db| db.referrals_for_user(user_id)).await?;
    Ok(Json(rows.into_iter().map(|r| r.into_model()).collect()))
}

pub async fn update_referral(
    State(state): State<AppState>,
    Path(referral_id): Path<i64>,
    Json(patch): Json<ReferralUpdate>,
) -> Result<Json<Referral>, ApiError> {
    let row = run_db(state, move |db| db.update_referral(referral_id, &patch)).await?;
    Ok(Json(row.into_model()))
}

pub async fn delete_referral(
    State(state): State<AppState>,
    Path(referral_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    run_db(state, move |db| db.delete_referral(referral_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
