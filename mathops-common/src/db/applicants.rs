//! Applicant table operations

use crate::db::models::{term_from_sql, term_to_sql, RawApplicant};
use crate::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

const COLUMNS: &str = "stu_id, first_name, last_name, birthdate, ethnicity, gender, college, \
    prog_study, hs_code, tr_credits, resident, resident_state, resident_county, hs_gpa, \
    hs_class_rank, hs_size_class, act_score, sat_score, pidm, apln_term";

fn applicant_from_row(row: &SqliteRow) -> Result<RawApplicant> {
    Ok(RawApplicant {
        stu_id: row.try_get("stu_id")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        birthdate: row.try_get("birthdate")?,
        ethnicity: row.try_get("ethnicity")?,
        gender: row.try_get("gender")?,
        college: row.try_get("college")?,
        prog_study: row.try_get("prog_study")?,
        hs_code: row.try_get("hs_code")?,
        tr_credits: row.try_get("tr_credits")?,
        resident: row.try_get("resident")?,
        resident_state: row.try_get("resident_state")?,
        resident_county: row.try_get("resident_county")?,
        hs_gpa: row.try_get("hs_gpa")?,
        hs_class_rank: row.try_get("hs_class_rank")?,
        hs_size_class: row.try_get("hs_size_class")?,
        act_score: row.try_get("act_score")?,
        sat_score: row.try_get("sat_score")?,
        pidm: row.try_get("pidm")?,
        apln_term: term_from_sql(row.try_get("apln_term")?),
    })
}

pub async fn query_all(pool: &SqlitePool) -> Result<Vec<RawApplicant>> {
    let rows = sqlx::query(&format!("SELECT {} FROM applicant", COLUMNS))
        .fetch_all(pool)
        .await?;

    rows.iter().map(applicant_from_row).collect()
}

pub async fn query_by_id(pool: &SqlitePool, stu_id: &str) -> Result<Option<RawApplicant>> {
    let row = sqlx::query(&format!("SELECT {} FROM applicant WHERE stu_id = ?", COLUMNS))
        .bind(stu_id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(applicant_from_row).transpose()
}

pub async fn insert(pool: &SqlitePool, applicant: &RawApplicant) -> Result<()> {
    sqlx::query(&format!(
        "INSERT INTO applicant ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        COLUMNS
    ))
    .bind(&applicant.stu_id)
    .bind(&applicant.first_name)
    .bind(&applicant.last_name)
    .bind(applicant.birthdate)
    .bind(&applicant.ethnicity)
    .bind(&applicant.gender)
    .bind(&applicant.college)
    .bind(&applicant.prog_study)
    .bind(&applicant.hs_code)
    .bind(&applicant.tr_credits)
    .bind(&applicant.resident)
    .bind(&applicant.resident_state)
    .bind(&applicant.resident_county)
    .bind(&applicant.hs_gpa)
    .bind(applicant.hs_class_rank)
    .bind(applicant.hs_size_class)
    .bind(applicant.act_score)
    .bind(applicant.sat_score)
    .bind(applicant.pidm)
    .bind(term_to_sql(applicant.apln_term))
    .execute(pool)
    .await?;

    Ok(())
}

/// Returns true if a row was deleted
pub async fn delete(pool: &SqlitePool, stu_id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM applicant WHERE stu_id = ?")
        .bind(stu_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn count(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM applicant")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
