//! Test Helper Utilities
//!
//! In-memory primary, ODS and live databases plus small seeding helpers.

#![allow(dead_code)]

use chrono::NaiveDate;
use mathops_common::db::{create_schema, terms, RawStmathplan, RawStudent, TermRec};
use mathops_common::mathplan::INTENTIONS_PROFILE;
use mathops_common::TermKey;
use mathops_dbjobs::JobContext;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

async fn memory_pool() -> SqlitePool {
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap()
}

pub async fn primary_pool() -> SqlitePool {
    let pool = memory_pool().await;
    create_schema(&pool).await.unwrap();
    pool
}

pub async fn ods_pool() -> SqlitePool {
    let pool = memory_pool().await;
    mathops_dbjobs::ods::create_tables(&pool).await.unwrap();
    pool
}

pub async fn live_pool() -> SqlitePool {
    let pool = memory_pool().await;
    mathops_dbjobs::live::create_tables(&pool).await.unwrap();
    pool
}

/// Context with all three databases
pub async fn full_context(dry_run: bool) -> JobContext {
    JobContext::new(primary_pool().await, dry_run)
        .with_ods(ods_pool().await)
        .with_live(live_pool().await)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub async fn set_active_term(pool: &SqlitePool, term: &str) {
    let term: TermKey = term.parse().unwrap();
    terms::insert(
        pool,
        &TermRec {
            term,
            start_dt: date(term.year, 1, 1),
            end_dt: date(term.year, 12, 31),
            active_index: 0,
        },
    )
    .await
    .unwrap();
}

pub fn student(stu_id: &str, pidm: i32) -> RawStudent {
    RawStudent {
        stu_id: stu_id.to_string(),
        pidm: Some(pidm),
        ..RawStudent::default()
    }
}

/// Intentions-page answer submitted on 2025-05-02 at `minute` past midnight
pub fn intention(stu_id: &str, pidm: i32, question: i32, minute: i32, answer: &str) -> RawStmathplan {
    RawStmathplan {
        stu_id: stu_id.to_string(),
        pidm: Some(pidm),
        apln_term: None,
        version: INTENTIONS_PROFILE.to_string(),
        exam_dt: date(2025, 5, 2),
        survey_nbr: question,
        stu_answer: Some(answer.to_string()),
        finish_time: Some(minute),
        session: None,
    }
}

/// One admissions row plus a matching priority application
pub async fn seed_ods_applicant(pool: &SqlitePool, csu_id: &str, pidm: i32, term: &str, apln_date: &str) {
    sqlx::query(
        "INSERT INTO csug_gp_admissions (csu_id, pidm, first_name, last_name, email, hs_gpa, multi_source) \
         VALUES (?, ?, 'Priya', 'Raman', 'priya@example.edu', '3.90', 'CSU')",
    )
    .bind(csu_id)
    .bind(pidm)
    .execute(pool)
    .await
    .unwrap();

    seed_ods_application(pool, pidm, term, apln_date).await;
}

/// Additional application for an existing admissions row
pub async fn seed_ods_application(pool: &SqlitePool, pidm: i32, term: &str, apln_date: &str) {
    sqlx::query(
        "INSERT INTO csus_applicant (pidm, term, apln_status, admitted_flag, apln_count_priority_flag, \
         adm_type, adm_program_of_study, adm_campus, apln_date, student_level, student_type) \
         VALUES (?, ?, 'C', 'Y', 'Y', 'N', 'MATH-BS', 'FC', ?, 'UG', 'N')",
    )
    .bind(pidm)
    .bind(term)
    .bind(apln_date)
    .execute(pool)
    .await
    .unwrap();
}
