//! Test score (`sortest`) operations on the live context
//!
//! The live table belongs to Banner; `create_table` exists only for scratch
//! copies used in testing and local development.

use crate::db::models::RawMpscorequeue;
use crate::resolve::{content_digest, RecencyChain};
use crate::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

/// Test code under which math placement results are recorded
pub const MPL_TEST_CODE: &str = "MPL";

fn score_from_row(row: &SqliteRow) -> Result<RawMpscorequeue> {
    Ok(RawMpscorequeue {
        pidm: row.try_get("pidm")?,
        test_code: row.try_get("test_code")?,
        test_date: row.try_get("test_date")?,
        test_score: row.try_get("test_score")?,
    })
}

/// Later test date wins; same-instant rows are ordered by content
pub fn score_recency() -> RecencyChain<RawMpscorequeue> {
    RecencyChain::new()
        .then_by_key(|s: &RawMpscorequeue| s.test_date)
        .then_by_key(|s: &RawMpscorequeue| content_digest([Some(s.test_score.as_str())]))
}

pub async fn create_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sortest (
            pidm INTEGER NOT NULL,
            test_code TEXT NOT NULL,
            test_date TIMESTAMP NOT NULL,
            test_score TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn query_by_student(pool: &SqlitePool, pidm: i32) -> Result<Vec<RawMpscorequeue>> {
    let rows = sqlx::query(
        "SELECT pidm, test_code, test_date, test_score FROM sortest WHERE pidm = ? ORDER BY test_date",
    )
    .bind(pidm)
    .fetch_all(pool)
    .await?;

    rows.iter().map(score_from_row).collect()
}

pub async fn query_by_test_code(pool: &SqlitePool, pidm: i32, test_code: &str) -> Result<Vec<RawMpscorequeue>> {
    let rows = sqlx::query(
        r#"
        SELECT pidm, test_code, test_date, test_score FROM sortest
        WHERE pidm = ? AND test_code = ?
        ORDER BY test_date
        "#,
    )
    .bind(pidm)
    .bind(test_code)
    .fetch_all(pool)
    .await?;

    rows.iter().map(score_from_row).collect()
}

/// Most recent score for a student under one test code
pub async fn most_recent(pool: &SqlitePool, pidm: i32, test_code: &str) -> Result<Option<RawMpscorequeue>> {
    let chain = score_recency();
    let scores = query_by_test_code(pool, pidm, test_code).await?;

    Ok(scores.into_iter().reduce(|best, next| {
        if chain.is_more_recent(&next, &best) {
            next
        } else {
            best
        }
    }))
}

pub async fn insert(pool: &SqlitePool, score: &RawMpscorequeue) -> Result<()> {
    sqlx::query("INSERT INTO sortest (pidm, test_code, test_date, test_score) VALUES (?, ?, ?, ?)")
        .bind(score.pidm)
        .bind(&score.test_code)
        .bind(score.test_date)
        .bind(&score.test_score)
        .execute(pool)
        .await?;

    Ok(())
}
