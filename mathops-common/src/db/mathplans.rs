//! Math plan response (`stmathplan`) operations
//!
//! A student may answer the same page more than once; the latest answer to
//! each question is the one that counts. "Latest" is decided by exam date,
//! then finish time, then session.

use crate::db::models::{term_from_sql, term_to_sql, RawStmathplan};
use crate::resolve::{resolve_latest, RecencyChain};
use crate::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;

const COLUMNS: &str =
    "stu_id, pidm, apln_term, version, exam_dt, survey_nbr, stu_answer, finish_time, session";

fn response_from_row(row: &SqliteRow) -> Result<RawStmathplan> {
    Ok(RawStmathplan {
        stu_id: row.try_get("stu_id")?,
        pidm: row.try_get("pidm")?,
        apln_term: term_from_sql(row.try_get("apln_term")?),
        version: row.try_get("version")?,
        exam_dt: row.try_get("exam_dt")?,
        survey_nbr: row.try_get("survey_nbr")?,
        stu_answer: row.try_get("stu_answer")?,
        finish_time: row.try_get("finish_time")?,
        session: row.try_get("session")?,
    })
}

/// Recency order for responses to the same question
pub fn response_recency() -> RecencyChain<RawStmathplan> {
    RecencyChain::new()
        .then_by_key(|r: &RawStmathplan| r.exam_dt)
        .then_by_optional(|r: &RawStmathplan| r.finish_time)
        .then_by_optional(|r: &RawStmathplan| r.session)
}

/// Latest response per question number
pub fn latest_by_question<I>(responses: I) -> HashMap<i32, RawStmathplan>
where
    I: IntoIterator<Item = RawStmathplan>,
{
    resolve_latest(responses, |r| r.survey_nbr, &response_recency())
}

pub async fn query_all(pool: &SqlitePool) -> Result<Vec<RawStmathplan>> {
    let rows = sqlx::query(&format!("SELECT {} FROM stmathplan", COLUMNS))
        .fetch_all(pool)
        .await?;

    rows.iter().map(response_from_row).collect()
}

pub async fn query_by_student(pool: &SqlitePool, stu_id: &str) -> Result<Vec<RawStmathplan>> {
    let rows = sqlx::query(&format!("SELECT {} FROM stmathplan WHERE stu_id = ?", COLUMNS))
        .bind(stu_id)
        .fetch_all(pool)
        .await?;

    rows.iter().map(response_from_row).collect()
}

/// Every response to one profile page, across all students
pub async fn query_by_version(pool: &SqlitePool, version: &str) -> Result<Vec<RawStmathplan>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM stmathplan WHERE version = ? ORDER BY stu_id",
        COLUMNS
    ))
    .bind(version)
    .fetch_all(pool)
    .await?;

    rows.iter().map(response_from_row).collect()
}

/// Latest response per question for one student on one page
pub async fn query_latest_by_student_page(
    pool: &SqlitePool,
    stu_id: &str,
    version: &str,
) -> Result<HashMap<i32, RawStmathplan>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM stmathplan WHERE stu_id = ? AND version = ?",
        COLUMNS
    ))
    .bind(stu_id)
    .bind(version)
    .fetch_all(pool)
    .await?;

    let responses = rows.iter().map(response_from_row).collect::<Result<Vec<_>>>()?;
    Ok(latest_by_question(responses))
}

pub async fn insert(pool: &SqlitePool, rec: &RawStmathplan) -> Result<()> {
    sqlx::query(&format!(
        "INSERT INTO stmathplan ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        COLUMNS
    ))
    .bind(&rec.stu_id)
    .bind(rec.pidm)
    .bind(term_to_sql(rec.apln_term))
    .bind(&rec.version)
    .bind(rec.exam_dt)
    .bind(rec.survey_nbr)
    .bind(&rec.stu_answer)
    .bind(rec.finish_time)
    .bind(rec.session)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete the row matching the response's identifying columns
pub async fn delete(pool: &SqlitePool, rec: &RawStmathplan) -> Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM stmathplan
        WHERE stu_id = ? AND version = ? AND exam_dt = ? AND survey_nbr = ?
          AND finish_time IS ? AND session IS ?
        "#,
    )
    .bind(&rec.stu_id)
    .bind(&rec.version)
    .bind(rec.exam_dt)
    .bind(rec.survey_nbr)
    .bind(rec.finish_time)
    .bind(rec.session)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::create_schema;
    use chrono::NaiveDate;
    use sqlx::sqlite::SqlitePoolOptions;

    fn answer(survey_nbr: i32, day: u32, finish: Option<i32>, value: &str) -> RawStmathplan {
        RawStmathplan {
            stu_id: "834567890".to_string(),
            pidm: Some(99),
            apln_term: None,
            version: "WLCM5".to_string(),
            exam_dt: NaiveDate::from_ymd_opt(2025, 6, day).unwrap(),
            survey_nbr,
            stu_answer: Some(value.to_string()),
            finish_time: finish,
            session: None,
        }
    }

    #[test]
    fn test_latest_by_question() {
        let latest = latest_by_question(vec![
            answer(1, 1, Some(600), "N"),
            answer(1, 2, Some(10), "Y"),
            answer(2, 2, Some(10), "N"),
            answer(2, 2, Some(11), "Y"),
            answer(2, 2, None, "N"),
        ]);

        assert_eq!(latest[&1].stu_answer.as_deref(), Some("Y"));
        assert_eq!(latest[&2].stu_answer.as_deref(), Some("Y"));
        assert_eq!(latest[&2].finish_time, Some(11));
    }

    #[tokio::test]
    async fn test_queries() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        create_schema(&pool).await.unwrap();

        let older = answer(1, 1, Some(600), "N");
        let newer = answer(1, 3, None, "Y");
        let mut other_page = answer(1, 5, Some(1), "N");
        other_page.version = "WLCM6".to_string();

        for rec in [&older, &newer, &other_page] {
            insert(&pool, rec).await.unwrap();
        }

        assert_eq!(query_all(&pool).await.unwrap().len(), 3);
        assert_eq!(query_by_student(&pool, "834567890").await.unwrap().len(), 3);
        assert_eq!(query_by_version(&pool, "WLCM5").await.unwrap().len(), 2);

        let latest = query_latest_by_student_page(&pool, "834567890", "WLCM5").await.unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[&1], newer);

        assert!(delete(&pool, &newer).await.unwrap());
        let latest = query_latest_by_student_page(&pool, "834567890", "WLCM5").await.unwrap();
        assert_eq!(latest[&1], older);
    }
}
