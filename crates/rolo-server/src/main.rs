use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use rolo_api::auth::{self, AppState, AppStateInner};
use rolo_api::middleware::require_auth;
use rolo_api::{connections, follow_ups, referrals, users};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rolo=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("ROLO_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("ROLO_DB_PATH").unwrap_or_else(|_| "rolo.db".into());
    let host = std::env::var("ROLO_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("ROLO_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Init database
    let db = rolo_db::Database::open(&PathBuf::from(&db_path))?;

    let app_state: AppState = Arc::new(AppStateInner { db, jwt_secret });

    // Routes
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/health", get(health))
        .with_state(app_state.clone());

    let protected_routes = Router::new()
        .route("/users", post(users::create_contact).get(users::list_users))
        .route("/users/me", get(users::get_me))
        .route("/users/filters", get(users::filter_options))
        .route("/users/by-username/{username}", get(users::get_user_by_username))
        .route(
            "/users/{user_id}",
            get(users::get_user).put(users::update_user).delete(users::delete_user),
        )
        .route(
            "/connections",
            post(connections::create_connection).get(connections::list_connections),
        )
        .route("/connections/for-user/{user_id}", get(connections::connections_for_user))
        .route(
            "/connections/{connection_id}",
            get(connections::get_connection)
                .put(connections::update_connection)
                .delete(connections::delete_connection),
        )
        .route(
            "/referrals",
            post(referrals::create_referral).get(referrals::list_referrals),
        )
        .route("/referrals/me", get(referrals::list_referrals))
        .route("/referrals/by-referrer/{user_id}", get(referrals::referrals_by_referrer))
        .route(
            "/referrals/{referral_id}",
            get(referrals::get_referral)
                .put(referrals::update_referral)
                .delete(referrals::delete_referral),
        )
        .route(
            "/follow-ups",
            post(follow_ups::create_follow_up).get(follow_ups::list_my_follow_ups),
        )
        .route(
            "/follow-ups/for-connection/{connection_id}",
            get(follow_ups::follow_ups_for_connection),
        )
        .route(
            "/follow-ups/{follow_up_id}",
            get(follow_ups::get_follow_up)
                .put(follow_ups::update_follow_up)
                .delete(follow_ups::delete_follow_up),
        )
        .layer(middleware::from_fn_with_state(app_state.clone(), require_auth))
        .with_state(app_state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Rolo server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// DB connectivity probe.
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match tokio::task::spawn_blocking(move || state.db.count_users()).await {
        Ok(Ok(count)) => (
            StatusCode::OK,
            Json(json!({ "status": "healthy", "database": "connected", "users_count": count })),
        ),
        _ => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unhealthy" })),
        ),
    }
}
