//! Simulation Set Handlers
//!
//! 시뮬레이션 세트 생성/조회 핸들러. 생성은 검증 → case_id 발급 →
//! 단일 트랜잭션 저장 순서로 진행하고, 조회는 저장된 행들을 중첩
//! 문서 하나로 재조립해 돌려준다.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{CreateSimulationSetArgs, CreateSimulationSetResult, SimulationSetDto};
use crate::AppState;

/// 시뮬레이션 세트 생성
///
/// 요청 본문 전체(세트 + 시나리오 + 과제 + 스트레스 지표)가 한 번에
/// 저장된다. 저장이 끝나기 전에는 어떤 행도 보이지 않는다.
pub async fn create_simulation_set(
    State(state): State<Arc<AppState>>,
    Json(args): Json<CreateSimulationSetArgs>,
) -> ApiResult<(StatusCode, Json<CreateSimulationSetResult>)> {
    args.validate()?;

    let case_id = Uuid::new_v4().to_string();
    let created_at = Utc::now().timestamp_millis();

    {
        let db = state.db.0.lock().map_err(ApiError::lock)?;
        db.save_simulation_set(&case_id, created_at, &args)?;
    }

    tracing::info!(%case_id, scenarios = args.scenarios.len(), "simulation set created");

    let results_url = format!("{}/results/{}", state.public_base_url, case_id);
    Ok((
        StatusCode::CREATED,
        Json(CreateSimulationSetResult {
            case_id,
            results_url,
        }),
    ))
}

/// 시뮬레이션 세트 조회 (중첩 문서)
pub async fn fetch_simulation_set(
    State(state): State<Arc<AppState>>,
    Path(case_id): Path<String>,
) -> ApiResult<Json<SimulationSetDto>> {
    let set = {
        let db = state.db.0.lock().map_err(ApiError::lock)?;
        db.load_simulation_set(&case_id)?
    };
    Ok(Json(set))
}
