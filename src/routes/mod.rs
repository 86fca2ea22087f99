//! HTTP Routes
//!
//! API 라우터 조립. 모든 엔드포인트는 /api 아래에 둔다.

pub mod simulations;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::AppState;

/// 전체 API 라우터
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        // 생성 URL은 후행 슬래시 유무와 무관하게 받는다
        .route("/api/simulations", post(simulations::create_simulation_set))
        .route("/api/simulations/", post(simulations::create_simulation_set))
        .route(
            "/api/simulations/{case_id}",
            get(simulations::fetch_simulation_set),
        )
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    timestamp: String,
}

/// 헬스 체크
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
