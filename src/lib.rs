//! CourseSim - What-If Simulation Backend
//!
//! Rust 백엔드 서버로, 시뮬레이션 세트 영속화(SQLite)와 중첩 문서 조회 API를 담당합니다.

pub mod db;
pub mod error;
pub mod models;
pub mod routes;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::db::{Database, DbState};
use crate::error::AppError;

/// 환경 변수 값, 없거나 공백이면 기본값
///
/// 일부 런처가 빈 문자열을 미리 주입하는 케이스가 있어 공백 값은 미설정으로 취급합니다.
fn env_or(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => default.to_string(),
    }
}

/// 서버 구성 (환경 변수 기반)
pub struct Config {
    pub bind_addr: String,
    pub db_path: PathBuf,
    /// resultsUrl 앞에 붙는 외부 노출 주소. 비우면 상대 경로를 돌려준다.
    pub public_base_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            bind_addr: env_or("COURSIM_BIND_ADDR", "127.0.0.1:8080"),
            db_path: PathBuf::from(env_or("COURSIM_DB_PATH", "data/coursim.db")),
            public_base_url: env_or("COURSIM_PUBLIC_BASE_URL", ""),
        }
    }
}

/// 라우터 전체가 공유하는 애플리케이션 상태
pub struct AppState {
    pub db: DbState,
    pub public_base_url: String,
}

impl AppState {
    /// 데이터베이스 연결과 스키마 준비까지 마친 상태 생성
    pub fn initialize(config: &Config) -> Result<Self, AppError> {
        // DB 디렉토리 생성
        if let Some(parent) = config.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Database::new(&config.db_path)?;
        db.initialize()?;

        Ok(Self {
            db: DbState(Mutex::new(db)),
            public_base_url: config.public_base_url.clone(),
        })
    }
}

/// 서버 실행
pub async fn run() -> Result<(), AppError> {
    // production에서는 .env 파일이 없을 수 있으므로 실패해도 무시합니다.
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coursim=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let state = Arc::new(AppState::initialize(&config)?);
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "coursim listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Ctrl+C 수신 시 진행 중인 요청을 마무리하고 종료
async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutdown signal received");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_or_falls_back_to_default() {
        assert_eq!(env_or("COURSIM_TEST_UNSET_KEY", "fallback"), "fallback");
    }

    #[test]
    fn test_env_or_ignores_blank_value() {
        std::env::set_var("COURSIM_TEST_BLANK_KEY", "   ");
        assert_eq!(env_or("COURSIM_TEST_BLANK_KEY", "fallback"), "fallback");
    }
}
