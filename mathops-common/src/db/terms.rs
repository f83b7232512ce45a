//! Term table operations

use crate::db::models::TermRec;
use crate::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

fn term_from_row(row: &SqliteRow) -> Result<TermRec> {
    let term: String = row.try_get("term")?;
    Ok(TermRec {
        term: term
            .parse()
            .map_err(|_| Error::InvalidTerm(format!("'{}' in term table", term)))?,
        start_dt: row.try_get("start_dt")?,
        end_dt: row.try_get("end_dt")?,
        active_index: row.try_get("active_index")?,
    })
}

/// All terms, oldest first
pub async fn query_all(pool: &SqlitePool) -> Result<Vec<TermRec>> {
    let rows = sqlx::query("SELECT term, start_dt, end_dt, active_index FROM term ORDER BY start_dt")
        .fetch_all(pool)
        .await?;

    rows.iter().map(term_from_row).collect()
}

/// The term with `active_index = 0`, if one is configured
pub async fn active_term(pool: &SqlitePool) -> Result<Option<TermRec>> {
    let row = sqlx::query("SELECT term, start_dt, end_dt, active_index FROM term WHERE active_index = 0")
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(term_from_row).transpose()
}

pub async fn insert(pool: &SqlitePool, rec: &TermRec) -> Result<()> {
    sqlx::query("INSERT INTO term (term, start_dt, end_dt, active_index) VALUES (?, ?, ?, ?)")
        .bind(rec.term.short_string())
        .bind(rec.start_dt)
        .bind(rec.end_dt)
        .bind(rec.active_index)
        .execute(pool)
        .await?;

    Ok(())
}
