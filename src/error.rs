//! CourseSim Error Types
//!
//! 애플리케이션 전역 에러 타입 정의

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// CourseSim 애플리케이션 에러
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Simulation set not found: {0}")]
    SimulationSetNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// HTTP 응답용 에러 (상태 코드 + plain-text 메시지)
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    /// DB 잠금 획득 실패(Mutex poisoning 등)를 500 응답으로 변환
    pub fn lock<E: std::fmt::Display>(err: E) -> Self {
        tracing::error!("failed to acquire database lock: {}", err);
        ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Internal server error".to_string(),
        }
    }
}

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        let (status, message) = match &error {
            AppError::SimulationSetNotFound(_) => (
                StatusCode::NOT_FOUND,
                "Simulation set not found".to_string(),
            ),
            AppError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            // 저장 계층 에러는 상세를 로그로만 남기고 클라이언트에는 generic 메시지
            AppError::Database(_) | AppError::Io(_) | AppError::Serialization(_) => {
                tracing::error!("internal error: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        ApiError { status, message }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

/// HTTP 핸들러 결과 타입
pub type ApiResult<T> = Result<T, ApiError>;
