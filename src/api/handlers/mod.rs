pub mod boards;
pub mod cards;
pub mod columns;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::api::state::AppState;

/// Always 200. `database` reports whether the store answered.
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let database = match &state.db {
        Some(pool) => match sqlx::query("SELECT 1").execute(pool).await {
            Ok(_) => "ok",
            Err(e) => {
                tracing::warn!(error = %e, "Health check query failed");
                "error"
            }
        },
        None => "unavailable",
    };

    Json(json!({
        "status": "ok",
        "database": database,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

pub async fn liveness() -> StatusCode {
    StatusCode::OK
}
