//! Student table operations

use crate::db::models::{term_from_sql, term_to_sql, RawStudent};
use crate::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

const COLUMNS: &str = "stu_id, pidm, last_name, first_name, pref_name, middle_initial, apln_term, \
    class, college, dept, program_code, est_graduation, hs_code, hs_gpa, hs_class_rank, \
    hs_size_class, act_score, sat_score, resident, birthdate, gender, campus, stu_email, \
    adviser_email, admit_type, create_dt";

fn student_from_row(row: &SqliteRow) -> Result<RawStudent> {
    Ok(RawStudent {
        stu_id: row.try_get("stu_id")?,
        pidm: row.try_get("pidm")?,
        last_name: row.try_get("last_name")?,
        first_name: row.try_get("first_name")?,
        pref_name: row.try_get("pref_name")?,
        middle_initial: row.try_get("middle_initial")?,
        apln_term: term_from_sql(row.try_get("apln_term")?),
        class: row.try_get("class")?,
        college: row.try_get("college")?,
        dept: row.try_get("dept")?,
        program_code: row.try_get("program_code")?,
        est_graduation: term_from_sql(row.try_get("est_graduation")?),
        hs_code: row.try_get("hs_code")?,
        hs_gpa: row.try_get("hs_gpa")?,
        hs_class_rank: row.try_get("hs_class_rank")?,
        hs_size_class: row.try_get("hs_size_class")?,
        act_score: row.try_get("act_score")?,
        sat_score: row.try_get("sat_score")?,
        resident: row.try_get("resident")?,
        birthdate: row.try_get("birthdate")?,
        gender: row.try_get("gender")?,
        campus: row.try_get("campus")?,
        stu_email: row.try_get("stu_email")?,
        adviser_email: row.try_get("adviser_email")?,
        admit_type: row.try_get("admit_type")?,
        create_dt: row.try_get("create_dt")?,
    })
}

pub async fn query_all(pool: &SqlitePool) -> Result<Vec<RawStudent>> {
    let rows = sqlx::query(&format!("SELECT {} FROM student ORDER BY stu_id", COLUMNS))
        .fetch_all(pool)
        .await?;

    rows.iter().map(student_from_row).collect()
}

pub async fn query_by_id(pool: &SqlitePool, stu_id: &str) -> Result<Option<RawStudent>> {
    let row = sqlx::query(&format!("SELECT {} FROM student WHERE stu_id = ?", COLUMNS))
        .bind(stu_id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(student_from_row).transpose()
}

pub async fn insert(pool: &SqlitePool, student: &RawStudent) -> Result<()> {
    sqlx::query(&format!(
        "INSERT INTO student ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        COLUMNS
    ))
    .bind(&student.stu_id)
    .bind(student.pidm)
    .bind(&student.last_name)
    .bind(&student.first_name)
    .bind(&student.pref_name)
    .bind(&student.middle_initial)
    .bind(term_to_sql(student.apln_term))
    .bind(&student.class)
    .bind(&student.college)
    .bind(&student.dept)
    .bind(&student.program_code)
    .bind(term_to_sql(student.est_graduation))
    .bind(&student.hs_code)
    .bind(&student.hs_gpa)
    .bind(student.hs_class_rank)
    .bind(student.hs_size_class)
    .bind(student.act_score)
    .bind(student.sat_score)
    .bind(&student.resident)
    .bind(student.birthdate)
    .bind(&student.gender)
    .bind(&student.campus)
    .bind(&student.stu_email)
    .bind(&student.adviser_email)
    .bind(&student.admit_type)
    .bind(student.create_dt)
    .execute(pool)
    .await?;

    Ok(())
}

/// Returns true if a row was deleted
pub async fn delete(pool: &SqlitePool, stu_id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM student WHERE stu_id = ?")
        .bind(stu_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Replace first and last name
pub async fn update_name(
    pool: &SqlitePool,
    stu_id: &str,
    first_name: Option<&str>,
    last_name: Option<&str>,
) -> Result<bool> {
    let result = sqlx::query("UPDATE student SET first_name = ?, last_name = ? WHERE stu_id = ?")
        .bind(first_name)
        .bind(last_name)
        .bind(stu_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn update_program(pool: &SqlitePool, stu_id: &str, program_code: Option<&str>) -> Result<bool> {
    let result = sqlx::query("UPDATE student SET program_code = ? WHERE stu_id = ?")
        .bind(program_code)
        .bind(stu_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Fields refreshed from the ODS person and term summary tables
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OdsFields {
    pub pidm: Option<i32>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub middle_initial: Option<String>,
    pub pref_name: Option<String>,
    pub stu_email: Option<String>,
    pub college: Option<String>,
    pub dept: Option<String>,
    pub program_code: Option<String>,
}

impl OdsFields {
    /// The same fields as currently stored on `student`
    pub fn of(student: &RawStudent) -> Self {
        Self {
            pidm: student.pidm,
            first_name: student.first_name.clone(),
            last_name: student.last_name.clone(),
            middle_initial: student.middle_initial.clone(),
            pref_name: student.pref_name.clone(),
            stu_email: student.stu_email.clone(),
            college: student.college.clone(),
            dept: student.dept.clone(),
            program_code: student.program_code.clone(),
        }
    }
}

pub async fn update_ods_fields(pool: &SqlitePool, stu_id: &str, fields: &OdsFields) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE student SET
            pidm = ?, first_name = ?, last_name = ?, middle_initial = ?, pref_name = ?,
            stu_email = ?, college = ?, dept = ?, program_code = ?
        WHERE stu_id = ?
        "#,
    )
    .bind(fields.pidm)
    .bind(&fields.first_name)
    .bind(&fields.last_name)
    .bind(&fields.middle_initial)
    .bind(&fields.pref_name)
    .bind(&fields.stu_email)
    .bind(&fields.college)
    .bind(&fields.dept)
    .bind(&fields.program_code)
    .bind(stu_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
