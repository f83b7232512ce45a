//! Queries against the Banner live context
//!
//! Test scores go through `mathops_common::db::test_scores`; this module
//! covers the program catalog, student programs and person names.

use anyhow::{Context, Result};
use mathops_common::db::test_scores;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

/// Valid entry of the program catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub prog_code: String,
    pub description: Option<String>,
}

/// Program assignment effective from a Banner term code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentProgram {
    pub pidm: i32,
    pub eff_term: String,
    pub prog_code: String,
}

/// Current name row from `spriden`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveName {
    pub pidm: i32,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub middle_name: Option<String>,
}

pub async fn query_valid_programs(pool: &SqlitePool) -> Result<Vec<CatalogEntry>> {
    let rows = sqlx::query(
        "SELECT prog_code, description FROM program_catalog WHERE valid_ind = 'Y' ORDER BY prog_code",
    )
    .fetch_all(pool)
    .await
    .context("Failed to query program catalog")?;

    rows.iter()
        .map(|row: &SqliteRow| -> Result<CatalogEntry> {
            Ok(CatalogEntry {
                prog_code: row.try_get("prog_code")?,
                description: row.try_get("description")?,
            })
        })
        .collect()
}

pub async fn query_student_programs(pool: &SqlitePool) -> Result<Vec<StudentProgram>> {
    let rows = sqlx::query("SELECT pidm, eff_term, prog_code FROM student_program")
        .fetch_all(pool)
        .await
        .context("Failed to query student programs")?;

    rows.iter()
        .map(|row: &SqliteRow| -> Result<StudentProgram> {
            Ok(StudentProgram {
                pidm: row.try_get("pidm")?,
                eff_term: row.try_get("eff_term")?,
                prog_code: row.try_get("prog_code")?,
            })
        })
        .collect()
}

/// Current name for `pidm` (the row with no change indicator)
pub async fn query_current_name(pool: &SqlitePool, pidm: i32) -> Result<Option<LiveName>> {
    let row = sqlx::query(
        "SELECT pidm, first_name, last_name, mi FROM spriden WHERE pidm = ? AND change_ind IS NULL LIMIT 1",
    )
    .bind(pidm)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("Failed to query name for PIDM {}", pidm))?;

    row.map(|row| -> Result<LiveName> {
        Ok(LiveName {
            pidm: row.try_get("pidm")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            middle_name: row.try_get("mi")?,
        })
    })
    .transpose()
}

/// Create empty mirrors of the Banner tables the jobs touch
pub async fn create_tables(pool: &SqlitePool) -> Result<()> {
    test_scores::create_table(pool)
        .await
        .context("Failed to create sortest")?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS program_catalog (
            prog_code TEXT PRIMARY KEY,
            description TEXT,
            valid_ind TEXT
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create program_catalog")?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS student_program (
            pidm INTEGER NOT NULL,
            eff_term TEXT NOT NULL,
            prog_code TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create student_program")?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS spriden (
            pidm INTEGER NOT NULL,
            first_name TEXT,
            last_name TEXT,
            mi TEXT,
            change_ind TEXT
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create spriden")?;

    Ok(())
}
