pub mod rpc;

use axum::{
    Extension, Json, Router,
    routing::{get, post},
};

use crate::SharedState;

pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/rpc", post(rpc::dispatch))
        .layer(Extension(state))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "suzume",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
