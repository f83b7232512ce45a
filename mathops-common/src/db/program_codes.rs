//! Local program catalog (`program_code`) operations

use crate::db::models::ProgramCode;
use crate::Result;
use sqlx::{Row, SqlitePool};

pub async fn query_all(pool: &SqlitePool) -> Result<Vec<ProgramCode>> {
    let rows = sqlx::query("SELECT prog_code, description FROM program_code ORDER BY prog_code")
        .fetch_all(pool)
        .await?;

    rows.iter()
        .map(|row| -> Result<ProgramCode> {
            Ok(ProgramCode {
                prog_code: row.try_get("prog_code")?,
                description: row.try_get("description")?,
            })
        })
        .collect()
}

pub async fn insert(pool: &SqlitePool, code: &ProgramCode) -> Result<()> {
    sqlx::query("INSERT INTO program_code (prog_code, description) VALUES (?, ?)")
        .bind(&code.prog_code)
        .bind(&code.description)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn update_description(pool: &SqlitePool, prog_code: &str, description: Option<&str>) -> Result<bool> {
    let result = sqlx::query("UPDATE program_code SET description = ? WHERE prog_code = ?")
        .bind(description)
        .bind(prog_code)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete(pool: &SqlitePool, prog_code: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM program_code WHERE prog_code = ?")
        .bind(prog_code)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
