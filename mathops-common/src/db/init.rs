//! Database initialization
//!
//! The primary schema is created on first use and upgraded in place on every
//! open:
//! 1. `CREATE TABLE IF NOT EXISTS` for every table
//! 2. Automatic column sync (see `schema_sync`)
//! 3. Versioned migrations (see `migrations`)
//!
//! The ODS and live contexts belong to other systems and are only ever opened.

use crate::{Error, Result};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::{debug, info};

/// Open (creating if needed) the primary database and bring its schema up to date
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Open an existing external database (ODS or live)
///
/// # Errors
///
/// Returns `Error::MissingSource` if the file does not exist; the file is
/// never created.
pub async fn open_source(db_path: &Path) -> Result<SqlitePool> {
    if !db_path.exists() {
        return Err(Error::MissingSource(db_path.to_path_buf()));
    }

    let db_url = format!("sqlite://{}?mode=rw", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;
    debug!("Opened source database: {}", db_path.display());

    Ok(pool)
}

/// Create every primary table, then run schema sync and migrations
///
/// Idempotent. Exposed separately so in-memory pools can be prepared the same
/// way as on-disk files.
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    create_schema_version_table(pool).await?;
    create_term_table(pool).await?;
    create_student_table(pool).await?;
    create_applicant_table(pool).await?;
    create_stmathplan_table(pool).await?;
    create_special_stus_table(pool).await?;
    create_program_code_table(pool).await?;

    crate::db::table_schemas::sync_all_table_schemas(pool).await?;
    crate::db::migrations::run_migrations(pool).await?;

    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_term_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS term (
            term TEXT PRIMARY KEY,
            start_dt DATE NOT NULL,
            end_dt DATE NOT NULL,
            active_index INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_student_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS student (
            stu_id TEXT PRIMARY KEY,
            pidm INTEGER,
            last_name TEXT,
            first_name TEXT,
            pref_name TEXT,
            middle_initial TEXT,
            apln_term TEXT,
            class TEXT,
            college TEXT,
            dept TEXT,
            program_code TEXT,
            est_graduation TEXT,
            hs_code TEXT,
            hs_gpa TEXT,
            hs_class_rank INTEGER,
            hs_size_class INTEGER,
            act_score INTEGER,
            sat_score INTEGER,
            resident TEXT,
            birthdate DATE,
            gender TEXT,
            campus TEXT,
            stu_email TEXT,
            adviser_email TEXT,
            admit_type TEXT,
            create_dt DATE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_applicant_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS applicant (
            stu_id TEXT PRIMARY KEY,
            first_name TEXT,
            last_name TEXT,
            birthdate DATE,
            ethnicity TEXT,
            gender TEXT,
            college TEXT,
            prog_study TEXT,
            hs_code TEXT,
            tr_credits TEXT,
            resident TEXT,
            resident_state TEXT,
            resident_county TEXT,
            hs_gpa TEXT,
            hs_class_rank INTEGER,
            hs_size_class INTEGER,
            act_score INTEGER,
            sat_score INTEGER,
            pidm INTEGER,
            apln_term TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_stmathplan_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS stmathplan (
            stu_id TEXT NOT NULL,
            pidm INTEGER,
            apln_term TEXT,
            version TEXT NOT NULL,
            exam_dt DATE NOT NULL,
            survey_nbr INTEGER NOT NULL,
            stu_answer TEXT,
            finish_time INTEGER,
            session INTEGER
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_special_stus_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS special_stus (
            stu_id TEXT NOT NULL,
            stu_type TEXT NOT NULL,
            start_dt DATE,
            end_dt DATE,
            PRIMARY KEY (stu_id, stu_type)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_program_code_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS program_code (
            prog_code TEXT PRIMARY KEY,
            description TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
