//! CourseSim Data Models
//!
//! React 프론트엔드의 JSON 계약과 매핑되는 Rust 데이터 모델.
//! Args 계열은 요청(쓰기) 방향, Dto 계열은 응답(읽기) 방향이며
//! caseId/assignmentId/stressMetricId는 서버 생성, scenarioId/assignmentNumber는
//! 호출자 지정이라는 구분을 그대로 유지한다.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// 시뮬레이션 세트 생성 요청
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSimulationSetArgs {
    pub name: String,
    pub kind: Option<String>,
    pub description: Option<String>,
    pub scenarios: Vec<ScenarioArgs>,
}

/// 세트에 속한 시나리오 하나 (수업 정보 + 과제 + 스트레스 지표)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioArgs {
    pub scenario_id: i64,
    pub input: ScenarioInput,
    #[serde(default)]
    pub assignments: Vec<AssignmentArgs>,
    pub stress_metrics: Option<StressMetricsArgs>,
}

/// 시나리오의 수업 정보 입력 (요청/응답 공용)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioInput {
    pub description: Option<String>,
    pub course_name: String,
    pub course_id: Option<String>,
    pub teaching_total_hours: i64,
    pub teaching_days: Option<Vec<String>>,
    pub teaching_time: Option<String>,
    pub lab_total_hours: i64,
    pub lab_days: Option<Vec<String>>,
    pub lab_time: Option<String>,
    pub ects: i64,
    pub topic_difficulty: i64,
    pub prerequisites: bool,
    pub weekly_homework_hours: i64,
    pub total_weeks: i64,
    pub attendance_method: String,
    pub success_rate_percent: Decimal,
    pub average_grade: Decimal,
    pub student_count: i64,
    pub current_week: i64,
}

/// 과제(homework/project) 블록 입력
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentArgs {
    pub assignment_number: i64,
    pub start_week: Option<i64>,
    pub end_week: i64,
    pub hours_per_week: Option<i64>,
}

/// 외부에서 계산된 스트레스 지표 스냅샷 입력
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StressMetricsArgs {
    pub current_week_average: Decimal,
    pub current_week_maximum: Decimal,
    pub predicted_next_week_average: Decimal,
    pub predicted_next_week_maximum: Decimal,
}

/// 생성 성공 응답
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSimulationSetResult {
    pub case_id: String,
    pub results_url: String,
}

/// 조회 응답: 세트 전체 (camelCase, 타임스탬프는 ISO-8601)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationSetDto {
    pub case_id: String,
    pub name: String,
    pub kind: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub scenarios: Vec<ScenarioDto>,
}

/// 조회 응답: 시나리오 하나
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioDto {
    pub scenario_id: i64,
    pub input: ScenarioInput,
    pub assignments: Vec<AssignmentDto>,
    pub stress_metrics: Option<StressMetricsDto>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 조회 응답: 과제 (서버 생성 assignmentId 포함)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentDto {
    pub assignment_id: i64,
    pub assignment_number: i64,
    pub start_week: Option<i64>,
    pub end_week: i64,
    pub hours_per_week: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// 조회 응답: 스트레스 지표 (서버 생성 stressMetricId 포함)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StressMetricsDto {
    pub stress_metric_id: i64,
    pub current_week_average: Decimal,
    pub current_week_maximum: Decimal,
    pub predicted_next_week_average: Decimal,
    pub predicted_next_week_maximum: Decimal,
    pub calculated_at: DateTime<Utc>,
}

impl CreateSimulationSetArgs {
    /// 쓰기 시작 전에 페이로드 전체를 검증한다.
    /// 실패하면 단 한 행도 저장되지 않는다.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("name must not be empty".to_string()));
        }

        let mut scenario_ids = HashSet::new();
        for scenario in &self.scenarios {
            // (caseId, scenarioId) 복합 키가 유일해야 하므로 중복을 사전에 거른다
            if !scenario_ids.insert(scenario.scenario_id) {
                return Err(AppError::Validation(format!(
                    "duplicate scenarioId {} in simulation set",
                    scenario.scenario_id
                )));
            }

            if scenario.input.course_name.trim().is_empty() {
                return Err(AppError::Validation(format!(
                    "courseName must not be empty (scenarioId {})",
                    scenario.scenario_id
                )));
            }

            let mut assignment_numbers = HashSet::new();
            for assignment in &scenario.assignments {
                if !assignment_numbers.insert(assignment.assignment_number) {
                    return Err(AppError::Validation(format!(
                        "duplicate assignmentNumber {} in scenario {}",
                        assignment.assignment_number, scenario.scenario_id
                    )));
                }
            }

            if let Some(metrics) = &scenario.stress_metrics {
                metrics.validate(scenario.scenario_id)?;
            }
        }

        Ok(())
    }
}

impl StressMetricsArgs {
    /// 스트레스 지표 컬럼은 DECIMAL(4,2), 절대값이 100 미만이어야 한다
    fn validate(&self, scenario_id: i64) -> Result<(), AppError> {
        let max = Decimal::new(99_99, 2);
        for (field, value) in [
            ("currentWeekAverage", self.current_week_average),
            ("currentWeekMaximum", self.current_week_maximum),
            ("predictedNextWeekAverage", self.predicted_next_week_average),
            ("predictedNextWeekMaximum", self.predicted_next_week_maximum),
        ] {
            if value.round_dp(2).abs() > max {
                return Err(AppError::Validation(format!(
                    "{} out of range in scenario {}: {}",
                    field, scenario_id, value
                )));
            }
        }
        Ok(())
    }
}
