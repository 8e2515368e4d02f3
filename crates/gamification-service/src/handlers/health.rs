//! 健康检查

use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};

use crate::state::AppState;

const SERVICE_NAME: &str = "campus-gamification";

/// 存活探针
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME
    }))
}

/// 就绪探针：检查数据库连接是否可用
pub async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let db_ok = match &state.database {
        Some(database) => database.health_check().await.is_ok(),
        None => true,
    };

    let status = if db_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if db_ok { "ok" } else { "degraded" },
            "service": SERVICE_NAME,
            "checks": {
                "database": if db_ok { "ok" } else { "fail" }
            }
        })),
    )
}
