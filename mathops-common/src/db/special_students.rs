//! Special student category (`special_stus`) operations

use crate::db::models::RawSpecialStus;
use crate::Result;
use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

/// Tutors, granted access to all course material
pub const TUTOR: &str = "TUTOR";
/// Administrative staff accounts
pub const ADMIN: &str = "ADMIN";
/// Students in the M 384 course
pub const M384: &str = "M384";
/// Eligible for the winter Precalculus Tutorial
pub const WINTER_PRECALC: &str = "WINPCT";

fn special_from_row(row: &SqliteRow) -> Result<RawSpecialStus> {
    Ok(RawSpecialStus {
        stu_id: row.try_get("stu_id")?,
        stu_type: row.try_get("stu_type")?,
        start_dt: row.try_get("start_dt")?,
        end_dt: row.try_get("end_dt")?,
    })
}

pub async fn query_all(pool: &SqlitePool) -> Result<Vec<RawSpecialStus>> {
    let rows = sqlx::query("SELECT stu_id, stu_type, start_dt, end_dt FROM special_stus")
        .fetch_all(pool)
        .await?;

    rows.iter().map(special_from_row).collect()
}

pub async fn query_by_category(pool: &SqlitePool, stu_type: &str) -> Result<Vec<RawSpecialStus>> {
    let rows = sqlx::query(
        "SELECT stu_id, stu_type, start_dt, end_dt FROM special_stus WHERE stu_type = ? ORDER BY stu_id",
    )
    .bind(stu_type)
    .fetch_all(pool)
    .await?;

    rows.iter().map(special_from_row).collect()
}

pub async fn query_by_student(pool: &SqlitePool, stu_id: &str) -> Result<Vec<RawSpecialStus>> {
    let rows = sqlx::query("SELECT stu_id, stu_type, start_dt, end_dt FROM special_stus WHERE stu_id = ?")
        .bind(stu_id)
        .fetch_all(pool)
        .await?;

    rows.iter().map(special_from_row).collect()
}

/// True if the student holds any of `categories` on `date`
pub async fn is_special_type(
    pool: &SqlitePool,
    stu_id: &str,
    date: NaiveDate,
    categories: &[&str],
) -> Result<bool> {
    let held = query_by_student(pool, stu_id).await?;

    Ok(held
        .iter()
        .any(|rec| categories.contains(&rec.stu_type.as_str()) && rec.is_active_on(date)))
}

pub async fn insert(pool: &SqlitePool, rec: &RawSpecialStus) -> Result<()> {
    sqlx::query("INSERT INTO special_stus (stu_id, stu_type, start_dt, end_dt) VALUES (?, ?, ?, ?)")
        .bind(&rec.stu_id)
        .bind(&rec.stu_type)
        .bind(rec.start_dt)
        .bind(rec.end_dt)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn delete(pool: &SqlitePool, stu_id: &str, stu_type: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM special_stus WHERE stu_id = ? AND stu_type = ?")
        .bind(stu_id)
        .bind(stu_type)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
