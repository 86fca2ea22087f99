//! Database Schema
//!
//! SQLite 테이블 스키마 정의

/// 데이터베이스 스키마 생성 SQL
pub const CREATE_SCHEMA: &str = r#"
-- 시뮬레이션 세트 테이블
CREATE TABLE IF NOT EXISTS simulation_sets (
    case_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    kind TEXT,
    description TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

-- 시나리오 테이블 ((case_id, scenario_id) 복합 키)
CREATE TABLE IF NOT EXISTS scenarios (
    case_id TEXT NOT NULL,
    scenario_id INTEGER NOT NULL,
    description TEXT,
    course_name TEXT NOT NULL,
    course_id TEXT,
    teaching_total_hours INTEGER NOT NULL,
    teaching_days TEXT,  -- JSON Array (요일 이름)
    teaching_time TEXT,
    lab_total_hours INTEGER NOT NULL,
    lab_days TEXT,  -- JSON Array
    lab_time TEXT,
    ects INTEGER NOT NULL,
    topic_difficulty INTEGER NOT NULL,
    prerequisites INTEGER NOT NULL,
    weekly_homework_hours INTEGER NOT NULL,
    total_weeks INTEGER NOT NULL,
    attendance_method TEXT NOT NULL,
    success_rate_percent TEXT NOT NULL,  -- DECIMAL(5,2) 고정소수점 문자열
    average_grade TEXT NOT NULL,  -- DECIMAL(5,2) 고정소수점 문자열
    student_count INTEGER NOT NULL,
    current_week INTEGER NOT NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    PRIMARY KEY (case_id, scenario_id),
    FOREIGN KEY (case_id) REFERENCES simulation_sets(case_id) ON DELETE CASCADE
);

-- 과제 테이블 (assignment_number는 시나리오 범위에서 유일)
CREATE TABLE IF NOT EXISTS assignments (
    assignment_id INTEGER PRIMARY KEY AUTOINCREMENT,
    case_id TEXT NOT NULL,
    scenario_id INTEGER NOT NULL,
    assignment_number INTEGER NOT NULL,
    start_week INTEGER,
    end_week INTEGER NOT NULL,
    hours_per_week INTEGER,
    created_at INTEGER NOT NULL,
    UNIQUE (case_id, scenario_id, assignment_number),
    FOREIGN KEY (case_id, scenario_id) REFERENCES scenarios(case_id, scenario_id) ON DELETE CASCADE
);

-- 스트레스 지표 테이블 (시나리오당 구조상 0..N행, 조회는 1행만 노출)
CREATE TABLE IF NOT EXISTS stress_metrics (
    stress_metric_id INTEGER PRIMARY KEY AUTOINCREMENT,
    case_id TEXT NOT NULL,
    scenario_id INTEGER NOT NULL,
    current_week_average TEXT NOT NULL,  -- DECIMAL(4,2)
    current_week_maximum TEXT NOT NULL,  -- DECIMAL(4,2)
    predicted_next_week_average TEXT NOT NULL,  -- DECIMAL(4,2)
    predicted_next_week_maximum TEXT NOT NULL,  -- DECIMAL(4,2)
    calculated_at INTEGER NOT NULL,
    FOREIGN KEY (case_id, scenario_id) REFERENCES scenarios(case_id, scenario_id) ON DELETE CASCADE
);

-- 스트레스 지표 인덱스
CREATE INDEX IF NOT EXISTS idx_stress_metrics_scenario ON stress_metrics(case_id, scenario_id);
"#;
