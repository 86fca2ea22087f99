//! API Integration Tests
//!
//! 라우터를 실제 서버 없이 tower 서비스로 직접 호출한다.
//! 테스트마다 임시 디렉토리의 독립된 SQLite 파일을 쓴다.

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use coursim::db::{Database, DbState};
use coursim::{routes, AppState};

fn test_app() -> (Router, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(&dir.path().join("api-test.db")).unwrap();
    db.initialize().unwrap();

    let state = Arc::new(AppState {
        db: DbState(Mutex::new(db)),
        public_base_url: String::new(),
    });
    (routes::router(state), dir)
}

async fn send_json(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(payload) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, value)
}

/// 단일 시나리오 생성 요청 본문 (stressMetrics 없음)
fn single_scenario_payload() -> Value {
    json!({
        "name": "S1",
        "scenarios": [{
            "scenarioId": 1,
            "input": {
                "courseName": "CS101",
                "teachingTotalHours": 40,
                "teachingDays": ["Monday"],
                "teachingTime": "9-11",
                "labTotalHours": 20,
                "labDays": ["Tuesday"],
                "labTime": "14-16",
                "ects": 5,
                "topicDifficulty": 3,
                "prerequisites": false,
                "weeklyHomeworkHours": 3,
                "totalWeeks": 10,
                "attendanceMethod": "Online",
                "successRatePercent": 80.0,
                "averageGrade": 3.5,
                "studentCount": 30,
                "currentWeek": 1
            },
            "assignments": [
                { "assignmentNumber": 1, "endWeek": 3, "hoursPerWeek": 2 }
            ]
        }]
    })
}

#[tokio::test]
async fn test_create_returns_201_with_case_id_and_results_url() {
    let (app, _dir) = test_app();

    let (status, body) =
        send_json(&app, "POST", "/api/simulations", Some(single_scenario_payload())).await;

    assert_eq!(status, StatusCode::CREATED);
    let case_id = body["caseId"].as_str().unwrap();
    assert!(uuid::Uuid::parse_str(case_id).is_ok());
    assert_eq!(
        body["resultsUrl"].as_str().unwrap(),
        format!("/results/{}", case_id)
    );
}

#[tokio::test]
async fn test_create_accepts_trailing_slash() {
    let (app, _dir) = test_app();

    let (status, body) =
        send_json(&app, "POST", "/api/simulations/", Some(single_scenario_payload())).await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["caseId"].is_string());
}

#[tokio::test]
async fn test_create_then_fetch_round_trips_nested_document() {
    let (app, _dir) = test_app();

    let (status, created) =
        send_json(&app, "POST", "/api/simulations", Some(single_scenario_payload())).await;
    assert_eq!(status, StatusCode::CREATED);
    let case_id = created["caseId"].as_str().unwrap();

    let (status, body) =
        send_json(&app, "GET", &format!("/api/simulations/{}", case_id), None).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(body["caseId"].as_str().unwrap(), case_id);
    assert_eq!(body["name"], "S1");
    assert!(body["kind"].is_null());
    assert!(body["createdAt"].as_str().unwrap().contains('T'));
    assert!(body["updatedAt"].as_str().unwrap().contains('T'));

    let scenarios = body["scenarios"].as_array().unwrap();
    assert_eq!(scenarios.len(), 1);

    let scenario = &scenarios[0];
    assert_eq!(scenario["scenarioId"], 1);
    assert_eq!(scenario["input"]["courseName"], "CS101");
    assert_eq!(scenario["input"]["teachingDays"], json!(["Monday"]));
    assert_eq!(scenario["input"]["teachingTime"], "9-11");
    assert_eq!(scenario["input"]["labDays"], json!(["Tuesday"]));
    assert_eq!(scenario["input"]["prerequisites"], false);
    assert_eq!(scenario["input"]["attendanceMethod"], "Online");
    assert_eq!(scenario["input"]["successRatePercent"], json!(80.0));
    assert_eq!(scenario["input"]["averageGrade"], json!(3.5));
    assert_eq!(scenario["input"]["studentCount"], 30);

    let assignments = scenario["assignments"].as_array().unwrap();
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0]["assignmentNumber"], 1);
    assert!(assignments[0]["startWeek"].is_null());
    assert_eq!(assignments[0]["endWeek"], 3);
    assert_eq!(assignments[0]["hoursPerWeek"], 2);
    // 과제 id는 서버가 발급한다
    assert!(assignments[0]["assignmentId"].is_number());
    assert!(assignments[0]["createdAt"].as_str().unwrap().contains('T'));

    // stressMetrics 없이 만든 시나리오는 null
    assert!(scenario["stressMetrics"].is_null());
}

#[tokio::test]
async fn test_stress_metrics_round_trip() {
    let (app, _dir) = test_app();

    let mut payload = single_scenario_payload();
    payload["scenarios"][0]["stressMetrics"] = json!({
        "currentWeekAverage": 12.5,
        "currentWeekMaximum": 20.0,
        "predictedNextWeekAverage": 14.25,
        "predictedNextWeekMaximum": 22.75
    });

    let (status, created) = send_json(&app, "POST", "/api/simulations", Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED);
    let case_id = created["caseId"].as_str().unwrap();

    let (status, body) =
        send_json(&app, "GET", &format!("/api/simulations/{}", case_id), None).await;
    assert_eq!(status, StatusCode::OK);

    let metrics = &body["scenarios"][0]["stressMetrics"];
    assert!(metrics.is_object());
    assert_eq!(metrics["currentWeekAverage"], json!(12.5));
    assert_eq!(metrics["currentWeekMaximum"], json!(20.0));
    assert_eq!(metrics["predictedNextWeekAverage"], json!(14.25));
    assert_eq!(metrics["predictedNextWeekMaximum"], json!(22.75));
    assert!(metrics["stressMetricId"].is_number());
    assert!(metrics["calculatedAt"].as_str().unwrap().contains('T'));
}

#[tokio::test]
async fn test_create_with_no_scenarios_succeeds() {
    let (app, _dir) = test_app();

    let (status, created) = send_json(
        &app,
        "POST",
        "/api/simulations",
        Some(json!({ "name": "빈 세트", "scenarios": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let case_id = created["caseId"].as_str().unwrap();
    let (status, body) =
        send_json(&app, "GET", &format!("/api/simulations/{}", case_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "빈 세트");
    assert_eq!(body["scenarios"], json!([]));
}

#[tokio::test]
async fn test_fetch_unknown_case_id_returns_404() {
    let (app, _dir) = test_app();

    let (status, body) = send_json(
        &app,
        "GET",
        "/api/simulations/3f0c9f5e-0000-0000-0000-000000000000",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, Value::String("Simulation set not found".to_string()));
}

#[tokio::test]
async fn test_create_with_missing_required_field_is_rejected() {
    let (app, _dir) = test_app();

    let mut payload = single_scenario_payload();
    payload["scenarios"][0]["input"]
        .as_object_mut()
        .unwrap()
        .remove("courseName");

    let (status, _body) = send_json(&app, "POST", "/api/simulations", Some(payload)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // 검증 실패 요청은 아무것도 저장하지 않는다
    let (_, list_check) = send_json(
        &app,
        "GET",
        "/api/simulations/3f0c9f5e-0000-0000-0000-000000000000",
        None,
    )
    .await;
    assert_eq!(
        list_check,
        Value::String("Simulation set not found".to_string())
    );
}

#[tokio::test]
async fn test_create_with_duplicate_scenario_id_is_rejected() {
    let (app, _dir) = test_app();

    let mut payload = single_scenario_payload();
    let scenario = payload["scenarios"][0].clone();
    payload["scenarios"].as_array_mut().unwrap().push(scenario);

    let (status, body) = send_json(&app, "POST", "/api/simulations", Some(payload)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body.as_str().unwrap().contains("duplicate scenarioId"));
}

#[tokio::test]
async fn test_two_creates_yield_distinct_case_ids() {
    let (app, _dir) = test_app();

    let mut first = single_scenario_payload();
    first["name"] = json!("플랜 A");
    let mut second = single_scenario_payload();
    second["name"] = json!("플랜 B");

    let (_, created_a) = send_json(&app, "POST", "/api/simulations", Some(first)).await;
    let (_, created_b) = send_json(&app, "POST", "/api/simulations", Some(second)).await;

    let id_a = created_a["caseId"].as_str().unwrap();
    let id_b = created_b["caseId"].as_str().unwrap();
    assert_ne!(id_a, id_b);

    let (_, body_a) = send_json(&app, "GET", &format!("/api/simulations/{}", id_a), None).await;
    let (_, body_b) = send_json(&app, "GET", &format!("/api/simulations/{}", id_b), None).await;
    assert_eq!(body_a["name"], "플랜 A");
    assert_eq!(body_b["name"], "플랜 B");
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _dir) = test_app();

    let (status, body) = send_json(&app, "GET", "/api/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}
