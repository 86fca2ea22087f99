//! Database Module
//!
//! SQLite 데이터베이스 관리. 시뮬레이션 세트의 다중 행 INSERT는 전부
//! 하나의 트랜잭션으로 처리한다. 부모 없는 시나리오나 시나리오 없는
//! 과제 행이 남으면 이후 조회가 참조 무결성을 잃는다.

mod schema;

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;

use crate::error::AppError;
use crate::models::{
    AssignmentDto, CreateSimulationSetArgs, ScenarioDto, ScenarioInput, SimulationSetDto,
    StressMetricsDto,
};

/// 데이터베이스 상태 (라우터 상태로 관리)
pub struct DbState(pub Mutex<Database>);

/// 데이터베이스 래퍼
pub struct Database {
    conn: Connection,
}

impl Database {
    /// 새 데이터베이스 연결 생성
    pub fn new(path: &Path) -> Result<Self, AppError> {
        let conn = Connection::open(path)?;
        // ON DELETE CASCADE는 이 pragma 없이는 동작하지 않는다
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn })
    }

    /// 데이터베이스 스키마 초기화
    pub fn initialize(&self) -> Result<(), AppError> {
        self.conn.execute_batch(schema::CREATE_SCHEMA)?;
        Ok(())
    }

    /// 시뮬레이션 세트 저장 (세트 + 시나리오 + 과제 + 스트레스 지표)
    ///
    /// 전체가 하나의 트랜잭션이다: 도중에 하나라도 실패하면 아무 행도
    /// 남지 않는다. case_id와 타임스탬프는 호출 측에서 생성해 넘긴다.
    pub fn save_simulation_set(
        &self,
        case_id: &str,
        created_at: i64,
        args: &CreateSimulationSetArgs,
    ) -> Result<(), AppError> {
        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO simulation_sets (case_id, name, kind, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                case_id,
                args.name,
                args.kind,
                args.description,
                created_at,
                created_at,
            ],
        )?;

        for scenario in &args.scenarios {
            let input = &scenario.input;
            tx.execute(
                "INSERT INTO scenarios (
                     case_id, scenario_id, description, course_name, course_id,
                     teaching_total_hours, teaching_days, teaching_time,
                     lab_total_hours, lab_days, lab_time,
                     ects, topic_difficulty, prerequisites, weekly_homework_hours,
                     total_weeks, attendance_method, success_rate_percent, average_grade,
                     student_count, current_week, created_at, updated_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                           ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23)",
                params![
                    case_id,
                    scenario.scenario_id,
                    input.description,
                    input.course_name,
                    input.course_id,
                    input.teaching_total_hours,
                    input.teaching_days.as_ref().map(serde_json::to_string).transpose()?,
                    input.teaching_time,
                    input.lab_total_hours,
                    input.lab_days.as_ref().map(serde_json::to_string).transpose()?,
                    input.lab_time,
                    input.ects,
                    input.topic_difficulty,
                    input.prerequisites,
                    input.weekly_homework_hours,
                    input.total_weeks,
                    input.attendance_method,
                    // DECIMAL(p,2) 컬럼 규약: 소수 둘째 자리로 반올림해 문자열로 저장
                    input.success_rate_percent.round_dp(2).to_string(),
                    input.average_grade.round_dp(2).to_string(),
                    input.student_count,
                    input.current_week,
                    created_at,
                    created_at,
                ],
            )?;

            for assignment in &scenario.assignments {
                tx.execute(
                    "INSERT INTO assignments (
                         case_id, scenario_id, assignment_number,
                         start_week, end_week, hours_per_week, created_at
                     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        case_id,
                        scenario.scenario_id,
                        assignment.assignment_number,
                        assignment.start_week,
                        assignment.end_week,
                        assignment.hours_per_week,
                        created_at,
                    ],
                )?;
            }

            if let Some(metrics) = &scenario.stress_metrics {
                tx.execute(
                    "INSERT INTO stress_metrics (
                         case_id, scenario_id,
                         current_week_average, current_week_maximum,
                         predicted_next_week_average, predicted_next_week_maximum,
                         calculated_at
                     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        case_id,
                        scenario.scenario_id,
                        metrics.current_week_average.round_dp(2).to_string(),
                        metrics.current_week_maximum.round_dp(2).to_string(),
                        metrics.predicted_next_week_average.round_dp(2).to_string(),
                        metrics.predicted_next_week_maximum.round_dp(2).to_string(),
                        created_at,
                    ],
                )?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// 시뮬레이션 세트 조회 (중첩 문서로 재조립)
    ///
    /// 시나리오 수와 무관하게 테이블당 한 번, 총 네 번의 쿼리로 읽는다.
    pub fn load_simulation_set(&self, case_id: &str) -> Result<SimulationSetDto, AppError> {
        // 세트 메타데이터
        let mut stmt = self.conn.prepare(
            "SELECT name, kind, description, created_at, updated_at
             FROM simulation_sets WHERE case_id = ?1",
        )?;

        let (name, kind, description, created_at, updated_at) = stmt
            .query_row([case_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            })
            .map_err(|err| match err {
                rusqlite::Error::QueryReturnedNoRows => {
                    AppError::SimulationSetNotFound(case_id.to_string())
                }
                other => AppError::Database(other),
            })?;

        // 시나리오
        let mut scenarios = Vec::new();
        let mut scenario_stmt = self.conn.prepare(
            "SELECT scenario_id, description, course_name, course_id,
                    teaching_total_hours, teaching_days, teaching_time,
                    lab_total_hours, lab_days, lab_time,
                    ects, topic_difficulty, prerequisites, weekly_homework_hours,
                    total_weeks, attendance_method, success_rate_percent, average_grade,
                    student_count, current_week, created_at, updated_at
             FROM scenarios WHERE case_id = ?1 ORDER BY scenario_id",
        )?;

        let scenario_iter = scenario_stmt.query_map([case_id], |row| {
            let teaching_days: Option<String> = row.get(5)?;
            let lab_days: Option<String> = row.get(8)?;
            Ok(ScenarioDto {
                scenario_id: row.get(0)?,
                input: ScenarioInput {
                    description: row.get(1)?,
                    course_name: row.get(2)?,
                    course_id: row.get(3)?,
                    teaching_total_hours: row.get(4)?,
                    teaching_days: teaching_days.and_then(|t| serde_json::from_str(&t).ok()),
                    teaching_time: row.get(6)?,
                    lab_total_hours: row.get(7)?,
                    lab_days: lab_days.and_then(|t| serde_json::from_str(&t).ok()),
                    lab_time: row.get(9)?,
                    ects: row.get(10)?,
                    topic_difficulty: row.get(11)?,
                    prerequisites: row.get(12)?,
                    weekly_homework_hours: row.get(13)?,
                    total_weeks: row.get(14)?,
                    attendance_method: row.get(15)?,
                    success_rate_percent: decimal_column(row, 16)?,
                    average_grade: decimal_column(row, 17)?,
                    student_count: row.get(18)?,
                    current_week: row.get(19)?,
                },
                assignments: Vec::new(),
                stress_metrics: None,
                created_at: timestamp_ms(row.get(20)?),
                updated_at: timestamp_ms(row.get(21)?),
            })
        })?;

        for scenario in scenario_iter {
            scenarios.push(scenario?);
        }

        // 과제 (시나리오별 그룹핑)
        let mut assignments_by_scenario: HashMap<i64, Vec<AssignmentDto>> = HashMap::new();
        let mut assignment_stmt = self.conn.prepare(
            "SELECT scenario_id, assignment_id, assignment_number,
                    start_week, end_week, hours_per_week, created_at
             FROM assignments WHERE case_id = ?1
             ORDER BY scenario_id, assignment_number",
        )?;

        let assignment_iter = assignment_stmt.query_map([case_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                AssignmentDto {
                    assignment_id: row.get(1)?,
                    assignment_number: row.get(2)?,
                    start_week: row.get(3)?,
                    end_week: row.get(4)?,
                    hours_per_week: row.get(5)?,
                    created_at: timestamp_ms(row.get(6)?),
                },
            ))
        })?;

        for assignment in assignment_iter {
            let (scenario_id, dto) = assignment?;
            assignments_by_scenario.entry(scenario_id).or_default().push(dto);
        }

        // 스트레스 지표: 시나리오당 첫 행만 노출.
        // "첫 행"은 저장소 반환 순서가 아니라 calculated_at 기준으로 고정한다.
        let mut metrics_by_scenario: HashMap<i64, StressMetricsDto> = HashMap::new();
        let mut metrics_stmt = self.conn.prepare(
            "SELECT scenario_id, stress_metric_id,
                    current_week_average, current_week_maximum,
                    predicted_next_week_average, predicted_next_week_maximum,
                    calculated_at
             FROM stress_metrics WHERE case_id = ?1
             ORDER BY calculated_at ASC, stress_metric_id ASC",
        )?;

        let metrics_iter = metrics_stmt.query_map([case_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                StressMetricsDto {
                    stress_metric_id: row.get(1)?,
                    current_week_average: decimal_column(row, 2)?,
                    current_week_maximum: decimal_column(row, 3)?,
                    predicted_next_week_average: decimal_column(row, 4)?,
                    predicted_next_week_maximum: decimal_column(row, 5)?,
                    calculated_at: timestamp_ms(row.get(6)?),
                },
            ))
        })?;

        for metrics in metrics_iter {
            let (scenario_id, dto) = metrics?;
            metrics_by_scenario.entry(scenario_id).or_insert(dto);
        }

        for scenario in &mut scenarios {
            if let Some(list) = assignments_by_scenario.remove(&scenario.scenario_id) {
                scenario.assignments = list;
            }
            scenario.stress_metrics = metrics_by_scenario.remove(&scenario.scenario_id);
        }

        Ok(SimulationSetDto {
            case_id: case_id.to_string(),
            name,
            kind,
            description,
            created_at: timestamp_ms(created_at),
            updated_at: timestamp_ms(updated_at),
            scenarios,
        })
    }

    /// 시뮬레이션 세트 삭제 (시나리오/과제/지표까지 연쇄 삭제)
    pub fn delete_simulation_set(&self, case_id: &str) -> Result<(), AppError> {
        let affected = self
            .conn
            .execute("DELETE FROM simulation_sets WHERE case_id = ?1", [case_id])?;
        if affected == 0 {
            return Err(AppError::SimulationSetNotFound(case_id.to_string()));
        }
        Ok(())
    }
}

/// epoch millis → UTC 타임스탬프
fn timestamp_ms(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}

/// TEXT로 저장된 고정소수점 컬럼 읽기
fn decimal_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let text: String = row.get(idx)?;
    Decimal::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
