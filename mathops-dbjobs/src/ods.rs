//! Read-only queries against the ODS warehouse context
//!
//! Table and column names follow the warehouse views (lower-cased for the
//! SQLite mirror). `create_tables` builds empty mirrors for local testing.

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use mathops_common::{TermKey, TermName};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

/// One row of the admissions/applicant/term-info join
#[derive(Debug, Clone, Default)]
pub struct OdsApplicantRow {
    pub csu_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub pref_name: Option<String>,
    pub middle_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub residency_state: Option<String>,
    pub residency_county: Option<String>,
    pub hs_code: Option<String>,
    pub hs_gpa: Option<String>,
    pub hs_class_rank: Option<i32>,
    pub hs_class_size: Option<i32>,
    pub act_math: Option<i32>,
    pub sat_math: Option<i32>,
    pub satr_math: Option<i32>,
    pub email: Option<String>,
    pub pidm: Option<i32>,
    pub app_term: Option<String>,
    pub decision: Option<String>,
    pub admitted: Option<String>,
    pub adm_type: Option<String>,
    pub adm_college: Option<String>,
    pub adm_dept: Option<String>,
    pub adm_program: Option<String>,
    pub adm_campus: Option<String>,
    pub adm_residency: Option<String>,
    pub apln_date: Option<NaiveDate>,
    pub student_class: Option<String>,
    pub college: Option<String>,
    pub department: Option<String>,
    pub program: Option<String>,
    pub grad_term: Option<String>,
    pub residency: Option<String>,
    pub campus: Option<String>,
}

/// Person data from `csug_gp_admissions`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OdsPerson {
    pub csu_id: String,
    pub pidm: Option<i32>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub pref_name: Option<String>,
    pub email: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

/// One enrollment term summary from `csus_enroll_term_summary_ah`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OdsTermSummary {
    pub csu_id: String,
    pub term: Option<String>,
    pub college: Option<String>,
    pub department: Option<String>,
    pub program: Option<String>,
    pub student_class: Option<String>,
    pub grad_term: Option<String>,
    pub residency: Option<String>,
    pub campus: Option<String>,
}

/// Rows that decoded, plus one message per row that could not be decoded
#[derive(Debug)]
pub struct Decoded<T> {
    pub rows: Vec<T>,
    pub rejected: Vec<String>,
}

/// Inclusive range of Banner application term codes considered current
///
/// Spring four years back through Fall two years ahead.
pub fn application_term_window(year: i32) -> (String, String) {
    (
        TermKey::new(TermName::Spring, year - 4).banner_code(),
        TermKey::new(TermName::Fall, year + 2).banner_code(),
    )
}

/// Date column holding `YYYY-MM-DD`, possibly followed by a time of day
fn date_column(row: &SqliteRow, column: &str) -> Result<Option<NaiveDate>> {
    let text: Option<String> = row.try_get(column)?;
    let Some(text) = text.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };

    let day = text.get(..10).unwrap_or(text);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map(Some)
        .with_context(|| format!("Bad date '{}' in column {}", text, column))
}

/// Whole-number column; the warehouse sometimes hands back REAL or TEXT values
fn int_column(row: &SqliteRow, column: &str) -> Result<Option<i32>> {
    let number = match row.try_get::<Option<i64>, _>(column) {
        Ok(value) => value.map(|v| v as f64),
        Err(_) => match row.try_get::<Option<f64>, _>(column) {
            Ok(value) => value,
            Err(_) => {
                let text: Option<String> = row.try_get(column)?;
                text.as_deref()
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::parse::<f64>)
                    .transpose()
                    .with_context(|| format!("Non-numeric value in column {}", column))?
            }
        },
    };

    number
        .map(|n| {
            let n = n.trunc();
            if n.is_finite() && n >= f64::from(i32::MIN) && n <= f64::from(i32::MAX) {
                Ok(n as i32)
            } else {
                Err(anyhow!("Value {} in column {} is out of range", n, column))
            }
        })
        .transpose()
}

/// Decode each row on its own so one bad value costs only that row
fn decode_each<T>(rows: &[SqliteRow], id_column: &str, decode: fn(&SqliteRow) -> Result<T>) -> Decoded<T> {
    let mut decoded = Decoded {
        rows: Vec::with_capacity(rows.len()),
        rejected: Vec::new(),
    };

    for row in rows {
        match decode(row) {
            Ok(value) => decoded.rows.push(value),
            Err(e) => {
                let id: Option<String> = row.try_get(id_column).ok().flatten();
                decoded.rejected.push(format!(
                    "Skipping ODS row for {}: {:#}",
                    id.as_deref().unwrap_or("unknown student"),
                    e
                ));
            }
        }
    }

    decoded
}

fn applicant_from_row(row: &SqliteRow) -> Result<OdsApplicantRow> {
    Ok(OdsApplicantRow {
        csu_id: row.try_get("csuid")?,
        first_name: row.try_get("first")?,
        last_name: row.try_get("last")?,
        pref_name: row.try_get("pref")?,
        middle_name: row.try_get("middle")?,
        birth_date: date_column(row, "bday")?,
        gender: row.try_get("gender")?,
        residency_state: row.try_get("resstate")?,
        residency_county: row.try_get("rescounty")?,
        hs_code: row.try_get("hscode")?,
        hs_gpa: row.try_get("hsgpa")?,
        hs_class_rank: int_column(row, "hsrank")?,
        hs_class_size: int_column(row, "hssize")?,
        act_math: int_column(row, "act")?,
        sat_math: int_column(row, "sat")?,
        satr_math: int_column(row, "satr")?,
        email: row.try_get("email")?,
        pidm: int_column(row, "pidm")?,
        app_term: row.try_get("appterm")?,
        decision: row.try_get("decision")?,
        admitted: row.try_get("admitted")?,
        adm_type: row.try_get("adm_type")?,
        adm_college: row.try_get("adm_college")?,
        adm_dept: row.try_get("adm_dept")?,
        adm_program: row.try_get("adm_program")?,
        adm_campus: row.try_get("adm_campus")?,
        adm_residency: row.try_get("adm_residency")?,
        apln_date: date_column(row, "apln_date")?,
        student_class: row.try_get("cls")?,
        college: row.try_get("college")?,
        department: row.try_get("dept")?,
        program: row.try_get("program")?,
        grad_term: row.try_get("gradterm")?,
        residency: row.try_get("res")?,
        campus: row.try_get("campus")?,
    })
}

fn person_from_row(row: &SqliteRow) -> Result<OdsPerson> {
    Ok(OdsPerson {
        csu_id: row.try_get("csu_id")?,
        pidm: int_column(row, "pidm")?,
        first_name: row.try_get("first_name")?,
        middle_name: row.try_get("middle_name")?,
        last_name: row.try_get("last_name")?,
        pref_name: row.try_get("preferred_first_name")?,
        email: row.try_get("email")?,
        birth_date: date_column(row, "birth_date")?,
    })
}

fn term_summary_from_row(row: &SqliteRow) -> Result<OdsTermSummary> {
    Ok(OdsTermSummary {
        csu_id: row.try_get("csu_id")?,
        term: row.try_get("term")?,
        college: row.try_get("primary_college")?,
        department: row.try_get("primary_department")?,
        program: row.try_get("program_of_study")?,
        student_class: row.try_get("student_class")?,
        grad_term: row.try_get("anticipated_grad_term")?,
        residency: row.try_get("residency")?,
        campus: row.try_get("campus")?,
    })
}

/// Applicants for terms in `[start, end]`, joined with the term-info table of `season`
pub async fn query_applicants(
    pool: &SqlitePool,
    season: TermName,
    start: &str,
    end: &str,
) -> Result<Decoded<OdsApplicantRow>> {
    let term_info = format!("csus_term_info_{}", season.ods_table_suffix().to_lowercase());

    let sql = format!(
        r#"
        SELECT
            A.csu_id AS csuid, A.first_name AS first, A.last_name AS last,
            A.preferred_first_name AS pref, A.middle_name AS middle, A.birth_date AS bday,
            A.gender AS gender, A.residency_state AS resstate, A.residency_county AS rescounty,
            A.hs_code AS hscode, CAST(A.hs_gpa AS TEXT) AS hsgpa, A.hs_class_rank AS hsrank,
            A.hs_class_size AS hssize, A.act_math AS act, A.sat_math AS sat, A.satr_math AS satr,
            A.email AS email,
            B.pidm AS pidm, B.term AS appterm, B.aplct_latest_decn AS decision,
            B.admitted_flag AS admitted, B.adm_type AS adm_type, B.adm_college AS adm_college,
            B.adm_dept AS adm_dept, B.adm_program_of_study AS adm_program,
            B.adm_campus AS adm_campus, B.adm_residency AS adm_residency, B.apln_date AS apln_date,
            C.student_class AS cls, C.primary_college AS college, C.primary_department AS dept,
            C.program_of_study AS program, C.anticipated_grad_term AS gradterm,
            C.residency AS res, C.campus AS campus
        FROM csug_gp_admissions A
            INNER JOIN csus_applicant B ON A.pidm = B.pidm
            LEFT JOIN {term_info} C ON C.pidm = A.pidm
        WHERE (B.apln_status <> 'U')
          AND (B.aplct_latest_decn IS NULL OR B.aplct_latest_decn <> 'RA')
          AND (B.apln_count_priority_flag = 'Y')
          AND (B.term BETWEEN ? AND ?)
          AND (A.last_name NOT LIKE '-Purge%')
          AND (A.multi_source = 'CSU')
          AND (   (B.adm_campus = 'MC')
               OR (B.student_level = 'GR' AND B.student_type = 'N')
               OR (B.student_level = 'UG' AND B.student_type IN ('N', 'T', 'R'))
               OR (B.student_level IN ('UG', 'GR') AND B.student_type = 'E'
                   AND SUBSTR(B.adm_program_of_study, 1, 2) = 'N2'))
        "#
    );

    let rows = sqlx::query(&sql)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await
        .with_context(|| format!("Failed to query ODS applicants joined with {}", term_info))?;

    Ok(decode_each(&rows, "csuid", applicant_from_row))
}

pub async fn query_all_persons(pool: &SqlitePool) -> Result<Decoded<OdsPerson>> {
    let rows = sqlx::query(
        r#"
        SELECT csu_id, pidm, first_name, middle_name, last_name, preferred_first_name, email, birth_date
        FROM csug_gp_admissions
        WHERE csu_id IS NOT NULL
        "#,
    )
    .fetch_all(pool)
    .await
    .context("Failed to query ODS person data")?;

    Ok(decode_each(&rows, "csu_id", person_from_row))
}

pub async fn query_all_term_summaries(pool: &SqlitePool) -> Result<Decoded<OdsTermSummary>> {
    let rows = sqlx::query(
        r#"
        SELECT csu_id, term, primary_college, primary_department, program_of_study,
               student_class, anticipated_grad_term, residency, campus
        FROM csus_enroll_term_summary_ah
        WHERE csu_id IS NOT NULL
        "#,
    )
    .fetch_all(pool)
    .await
    .context("Failed to query ODS enrollment term summaries")?;

    Ok(decode_each(&rows, "csu_id", term_summary_from_row))
}

/// Create empty mirrors of the warehouse tables the jobs read
pub async fn create_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS csug_gp_admissions (
            csu_id TEXT,
            pidm INTEGER,
            first_name TEXT,
            middle_name TEXT,
            last_name TEXT,
            preferred_first_name TEXT,
            email TEXT,
            birth_date DATE,
            gender TEXT,
            residency_state TEXT,
            residency_county TEXT,
            hs_code TEXT,
            hs_gpa TEXT,
            hs_class_rank INTEGER,
            hs_class_size INTEGER,
            act_math INTEGER,
            sat_math INTEGER,
            satr_math INTEGER,
            multi_source TEXT
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create csug_gp_admissions")?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS csus_applicant (
            pidm INTEGER,
            term TEXT,
            apln_status TEXT,
            aplct_latest_decn TEXT,
            admitted_flag TEXT,
            apln_count_priority_flag TEXT,
            adm_type TEXT,
            adm_college TEXT,
            adm_dept TEXT,
            adm_program_of_study TEXT,
            adm_campus TEXT,
            adm_residency TEXT,
            apln_date DATE,
            student_level TEXT,
            student_type TEXT
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create csus_applicant")?;

    for season in [TermName::Spring, TermName::Summer, TermName::Fall] {
        let table = format!("csus_term_info_{}", season.ods_table_suffix().to_lowercase());
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                pidm INTEGER,
                student_class TEXT,
                primary_college TEXT,
                primary_department TEXT,
                program_of_study TEXT,
                anticipated_grad_term TEXT,
                residency TEXT,
                campus TEXT
            )
            "#
        ))
        .execute(pool)
        .await
        .with_context(|| format!("Failed to create {}", table))?;
    }

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS csus_enroll_term_summary_ah (
            pidm INTEGER,
            csu_id TEXT,
            term TEXT,
            primary_college TEXT,
            primary_department TEXT,
            program_of_study TEXT,
            student_class TEXT,
            anticipated_grad_term TEXT,
            residency TEXT,
            campus TEXT
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create csus_enroll_term_summary_ah")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        create_tables(&pool).await.unwrap();
        pool
    }

    #[test]
    fn test_application_term_window() {
        assert_eq!(
            application_term_window(2025),
            ("202110".to_string(), "202790".to_string())
        );
    }

    #[tokio::test]
    async fn test_query_applicants_applies_population_filter() {
        let pool = setup().await;

        for (csu_id, pidm, level, stype) in [
            ("811111111", 1, "UG", "N"),
            ("822222222", 2, "UG", "X"),
        ] {
            sqlx::query(
                "INSERT INTO csug_gp_admissions (csu_id, pidm, last_name, hs_gpa, multi_source) \
                 VALUES (?, ?, 'Okafor', 3.5, 'CSU')",
            )
            .bind(csu_id)
            .bind(pidm)
            .execute(&pool)
            .await
            .unwrap();

            sqlx::query(
                "INSERT INTO csus_applicant (pidm, term, apln_status, admitted_flag, apln_count_priority_flag, \
                 adm_campus, student_level, student_type) VALUES (?, '202590', 'C', 'Y', 'Y', 'FC', ?, ?)",
            )
            .bind(pidm)
            .bind(level)
            .bind(stype)
            .execute(&pool)
            .await
            .unwrap();
        }

        let rows = query_applicants(&pool, TermName::Fall, "202110", "202790")
            .await
            .unwrap()
            .rows;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].csu_id.as_deref(), Some("811111111"));
        assert_eq!(rows[0].hs_gpa.as_deref(), Some("3.5"));
        assert_eq!(rows[0].college, None);

        let none = query_applicants(&pool, TermName::Fall, "202610", "202790").await.unwrap();
        assert!(none.rows.is_empty());
    }

    #[tokio::test]
    async fn test_person_rows_decode_independently() {
        let pool = setup().await;

        sqlx::query(
            "INSERT INTO csug_gp_admissions (csu_id, pidm, last_name, birth_date) VALUES \
             ('811111111', 1, 'Okafor', '2006-06-29 00:00:00'), \
             ('822222222', 2.0, 'Lindqvist', '2007-01-02'), \
             ('833333333', 3, 'Ferreira', 'June 5')",
        )
        .execute(&pool)
        .await
        .unwrap();

        let decoded = query_all_persons(&pool).await.unwrap();
        assert_eq!(decoded.rows.len(), 2);

        let okafor = decoded.rows.iter().find(|p| p.csu_id == "811111111").unwrap();
        assert_eq!(okafor.birth_date, NaiveDate::from_ymd_opt(2006, 6, 29));
        let lindqvist = decoded.rows.iter().find(|p| p.csu_id == "822222222").unwrap();
        assert_eq!(lindqvist.pidm, Some(2));

        assert_eq!(decoded.rejected.len(), 1);
        assert!(decoded.rejected[0].contains("833333333"));
        assert!(decoded.rejected[0].contains("June 5"));
    }

    #[tokio::test]
    async fn test_real_valued_scores_are_read_as_whole_numbers() {
        let pool = setup().await;

        sqlx::query(
            "INSERT INTO csug_gp_admissions (csu_id, pidm, last_name, hs_class_rank, act_math, multi_source) \
             VALUES ('811111111', 1, 'Okafor', 12.5, '27', 'CSU')",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO csus_applicant (pidm, term, apln_status, admitted_flag, apln_count_priority_flag, \
             adm_campus, student_level, student_type) VALUES (1, '202590', 'C', 'Y', 'Y', 'FC', 'UG', 'N')",
        )
        .execute(&pool)
        .await
        .unwrap();

        let decoded = query_applicants(&pool, TermName::Fall, "202110", "202790").await.unwrap();
        assert!(decoded.rejected.is_empty());
        assert_eq!(decoded.rows[0].hs_class_rank, Some(12));
        assert_eq!(decoded.rows[0].act_math, Some(27));
    }
}
