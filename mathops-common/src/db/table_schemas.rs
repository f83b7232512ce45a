//! Declared column sets for the primary schema
//!
//! Adding a nullable column (or one with a default) to a table here is enough
//! to upgrade existing database files; it is added on the next open.

use crate::db::schema_sync::{ColumnDefinition, SchemaSync, TableSchema};
use crate::Result;
use sqlx::SqlitePool;
use tracing::info;

pub struct TermTableSchema;

impl TableSchema for TermTableSchema {
    fn table_name() -> &'static str {
        "term"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("term", "TEXT").primary_key(),
            ColumnDefinition::new("start_dt", "DATE").not_null(),
            ColumnDefinition::new("end_dt", "DATE").not_null(),
            ColumnDefinition::new("active_index", "INTEGER").not_null(),
        ]
    }
}

pub struct StudentTableSchema;

impl TableSchema for StudentTableSchema {
    fn table_name() -> &'static str {
        "student"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        let mut cols = vec![ColumnDefinition::new("stu_id", "TEXT").primary_key()];
        cols.extend(
            [
                ("pidm", "INTEGER"),
                ("last_name", "TEXT"),
                ("first_name", "TEXT"),
                ("pref_name", "TEXT"),
                ("middle_initial", "TEXT"),
                ("apln_term", "TEXT"),
                ("class", "TEXT"),
                ("college", "TEXT"),
                ("dept", "TEXT"),
                ("program_code", "TEXT"),
                ("est_graduation", "TEXT"),
                ("hs_code", "TEXT"),
                ("hs_gpa", "TEXT"),
                ("hs_class_rank", "INTEGER"),
                ("hs_size_class", "INTEGER"),
                ("act_score", "INTEGER"),
                ("sat_score", "INTEGER"),
                ("resident", "TEXT"),
                ("birthdate", "DATE"),
                ("gender", "TEXT"),
                ("campus", "TEXT"),
                ("stu_email", "TEXT"),
                // Added after the first release; older files gain it on open
                ("adviser_email", "TEXT"),
                ("admit_type", "TEXT"),
                ("create_dt", "DATE"),
            ]
            .into_iter()
            .map(|(name, ty)| ColumnDefinition::new(name, ty)),
        );
        cols
    }
}

pub struct ApplicantTableSchema;

impl TableSchema for ApplicantTableSchema {
    fn table_name() -> &'static str {
        "applicant"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        let mut cols = vec![ColumnDefinition::new("stu_id", "TEXT").primary_key()];
        cols.extend(
            [
                ("first_name", "TEXT"),
                ("last_name", "TEXT"),
                ("birthdate", "DATE"),
                ("ethnicity", "TEXT"),
                ("gender", "TEXT"),
                ("college", "TEXT"),
                ("prog_study", "TEXT"),
                ("hs_code", "TEXT"),
                ("tr_credits", "TEXT"),
                ("resident", "TEXT"),
                ("resident_state", "TEXT"),
                ("resident_county", "TEXT"),
                ("hs_gpa", "TEXT"),
                ("hs_class_rank", "INTEGER"),
                ("hs_size_class", "INTEGER"),
                ("act_score", "INTEGER"),
                ("sat_score", "INTEGER"),
                ("pidm", "INTEGER"),
                ("apln_term", "TEXT"),
            ]
            .into_iter()
            .map(|(name, ty)| ColumnDefinition::new(name, ty)),
        );
        cols
    }
}

pub struct StmathplanTableSchema;

impl TableSchema for StmathplanTableSchema {
    fn table_name() -> &'static str {
        "stmathplan"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("stu_id", "TEXT").not_null(),
            ColumnDefinition::new("pidm", "INTEGER"),
            ColumnDefinition::new("apln_term", "TEXT"),
            ColumnDefinition::new("version", "TEXT").not_null(),
            ColumnDefinition::new("exam_dt", "DATE").not_null(),
            ColumnDefinition::new("survey_nbr", "INTEGER").not_null(),
            ColumnDefinition::new("stu_answer", "TEXT"),
            ColumnDefinition::new("finish_time", "INTEGER"),
            ColumnDefinition::new("session", "INTEGER"),
        ]
    }
}

pub struct SpecialStusTableSchema;

impl TableSchema for SpecialStusTableSchema {
    fn table_name() -> &'static str {
        "special_stus"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("stu_id", "TEXT").not_null(),
            ColumnDefinition::new("stu_type", "TEXT").not_null(),
            ColumnDefinition::new("start_dt", "DATE"),
            ColumnDefinition::new("end_dt", "DATE"),
        ]
    }
}

pub struct ProgramCodeTableSchema;

impl TableSchema for ProgramCodeTableSchema {
    fn table_name() -> &'static str {
        "program_code"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("prog_code", "TEXT").primary_key(),
            ColumnDefinition::new("description", "TEXT"),
        ]
    }
}

/// Add missing columns to every primary table
///
/// Runs after `CREATE TABLE IF NOT EXISTS` and before versioned migrations.
pub async fn sync_all_table_schemas(pool: &SqlitePool) -> Result<()> {
    let added = SchemaSync::sync_table::<TermTableSchema>(pool).await?
        + SchemaSync::sync_table::<StudentTableSchema>(pool).await?
        + SchemaSync::sync_table::<ApplicantTableSchema>(pool).await?
        + SchemaSync::sync_table::<StmathplanTableSchema>(pool).await?
        + SchemaSync::sync_table::<SpecialStusTableSchema>(pool).await?
        + SchemaSync::sync_table::<ProgramCodeTableSchema>(pool).await?;

    if added > 0 {
        info!("Schema sync added {} column(s)", added);
    }

    Ok(())
}
