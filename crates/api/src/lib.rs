pub mod error;
pub mod protocol;
pub mod room;
pub mod room_manager;
pub mod send_queue;
pub mod state;
pub mod ws;

use axum::{
    Json, Router,
    extract::State,
    http::Uri,
    routing::get,
};
use error::ApiError;
use serde_json::{Value, json};
use state::AppState;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Assembles the full axum router: the `/ws/client` endpoint (§6) plus the
/// `/health` operational endpoint (SPEC_FULL §C) the distilled spec doesn't
/// mention but a deployable service needs.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/ws/client", get(ws::handler::ws_upgrade))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "active_rooms": state.room_manager.room_count(),
        "available_pipeline_permits": state.room_manager.available_pipeline_permits(),
    }))
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("no route for {uri}"))
}
