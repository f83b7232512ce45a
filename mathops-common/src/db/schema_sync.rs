//! Automatic column synchronization
//!
//! Each table declares the columns it expects; on open, any column missing
//! from an existing database file is added with `ALTER TABLE ... ADD COLUMN`.
//! Type or constraint differences are reported but never altered here; those
//! need a versioned migration.
//!
//! # Usage
//!
//! ```rust,ignore
//! pub struct ProgramCodeTableSchema;
//!
//! impl TableSchema for ProgramCodeTableSchema {
//!     fn table_name() -> &'static str { "program_code" }
//!
//!     fn expected_columns() -> Vec<ColumnDefinition> {
//!         vec![
//!             ColumnDefinition::new("prog_code", "TEXT").primary_key(),
//!             ColumnDefinition::new("description", "TEXT"),
//!         ]
//!     }
//! }
//!
//! SchemaSync::sync_table::<ProgramCodeTableSchema>(&pool).await?;
//! ```

use crate::Result;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info, warn};

/// Expected column, with the constraints that matter for drift detection
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    /// Declared SQL type (`TEXT`, `INTEGER`, `DATE`, ...)
    pub sql_type: String,
    pub not_null: bool,
    pub primary_key: bool,
    /// SQL literal used as the column default
    pub default_value: Option<String>,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            not_null: false,
            primary_key: false,
            default_value: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }
}

/// Column as reported by `PRAGMA table_info`
#[derive(Debug, Clone)]
pub struct ActualColumn {
    pub cid: i32,
    pub name: String,
    pub type_name: String,
    pub not_null: bool,
    pub default_value: Option<String>,
    pub pk: bool,
}

/// One difference between a declared and an actual table
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaDrift {
    /// Fixable: the column is added
    MissingColumn { table: String, column: ColumnDefinition },
    /// Reported only
    TypeMismatch {
        table: String,
        column: String,
        expected: String,
        actual: String,
    },
    /// Reported only
    ConstraintMismatch {
        table: String,
        column: String,
        constraint: &'static str,
    },
}

/// Declared shape of one table
pub trait TableSchema {
    fn table_name() -> &'static str;

    /// Columns in creation order
    fn expected_columns() -> Vec<ColumnDefinition>;
}

/// SQLite type affinity of a declared type name
///
/// Follows the rules of section 3.1 of the SQLite datatype documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affinity {
    Integer,
    Text,
    Blob,
    Real,
    Numeric,
}

impl Affinity {
    pub fn of(declared: &str) -> Self {
        let t = declared.to_ascii_uppercase();
        if t.contains("INT") {
            Affinity::Integer
        } else if t.contains("CHAR") || t.contains("CLOB") || t.contains("TEXT") {
            Affinity::Text
        } else if t.is_empty() || t.contains("BLOB") {
            Affinity::Blob
        } else if t.contains("REAL") || t.contains("FLOA") || t.contains("DOUB") {
            Affinity::Real
        } else {
            Affinity::Numeric
        }
    }
}

/// Reads the actual shape of tables
pub struct SchemaIntrospector;

impl SchemaIntrospector {
    /// Columns of `table_name`, ordered by position
    pub async fn introspect_table(pool: &SqlitePool, table_name: &str) -> Result<Vec<ActualColumn>> {
        let rows = sqlx::query("SELECT cid, name, type, \"notnull\", dflt_value, pk FROM pragma_table_info(?)")
            .bind(table_name)
            .fetch_all(pool)
            .await?;

        let mut columns = rows
            .iter()
            .map(|row| {
                Ok(ActualColumn {
                    cid: row.try_get("cid")?,
                    name: row.try_get("name")?,
                    type_name: row.try_get("type")?,
                    not_null: row.try_get::<i32, _>("notnull")? != 0,
                    default_value: row.try_get("dflt_value")?,
                    pk: row.try_get::<i32, _>("pk")? != 0,
                })
            })
            .collect::<std::result::Result<Vec<_>, sqlx::Error>>()?;

        columns.sort_by_key(|c| c.cid);
        Ok(columns)
    }

    pub async fn table_exists(pool: &SqlitePool, table_name: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?)",
        )
        .bind(table_name)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }
}

/// Compares declared columns with actual ones
pub struct SchemaDiff;

impl SchemaDiff {
    pub fn compare(table: &str, expected: &[ColumnDefinition], actual: &[ActualColumn]) -> Vec<SchemaDrift> {
        let mut drift = Vec::new();

        for want in expected {
            let Some(have) = actual.iter().find(|c| c.name.eq_ignore_ascii_case(&want.name)) else {
                drift.push(SchemaDrift::MissingColumn {
                    table: table.to_string(),
                    column: want.clone(),
                });
                continue;
            };

            if Affinity::of(&want.sql_type) != Affinity::of(&have.type_name) {
                drift.push(SchemaDrift::TypeMismatch {
                    table: table.to_string(),
                    column: want.name.clone(),
                    expected: want.sql_type.clone(),
                    actual: have.type_name.clone(),
                });
            }
            if want.not_null && !have.not_null && !have.pk {
                drift.push(SchemaDrift::ConstraintMismatch {
                    table: table.to_string(),
                    column: want.name.clone(),
                    constraint: "NOT NULL",
                });
            }
            if want.primary_key && !have.pk {
                drift.push(SchemaDrift::ConstraintMismatch {
                    table: table.to_string(),
                    column: want.name.clone(),
                    constraint: "PRIMARY KEY",
                });
            }
        }

        drift
    }
}

/// Applies fixable drift
pub struct SchemaSync;

impl SchemaSync {
    /// Add any columns `T` declares that the table lacks
    ///
    /// Returns the number of columns added.
    pub async fn sync_table<T: TableSchema>(pool: &SqlitePool) -> Result<usize> {
        let table = T::table_name();

        if !SchemaIntrospector::table_exists(pool, table).await? {
            warn!("Schema sync: table '{}' does not exist, skipping", table);
            return Ok(0);
        }

        let actual = SchemaIntrospector::introspect_table(pool, table).await?;
        let drift = SchemaDiff::compare(table, &T::expected_columns(), &actual);

        if drift.is_empty() {
            debug!("Schema sync: '{}' up to date", table);
            return Ok(0);
        }

        let mut added = 0;
        for change in drift {
            match change {
                SchemaDrift::MissingColumn { table, column } => {
                    Self::add_column(pool, &table, &column).await?;
                    added += 1;
                }
                SchemaDrift::TypeMismatch { table, column, expected, actual } => {
                    warn!(
                        "Schema sync: {}.{} declared {} but found {}; needs a migration",
                        table, column, expected, actual
                    );
                }
                SchemaDrift::ConstraintMismatch { table, column, constraint } => {
                    warn!(
                        "Schema sync: {}.{} lacks {}; needs a migration",
                        table, column, constraint
                    );
                }
            }
        }

        Ok(added)
    }

    /// `ALTER TABLE ADD COLUMN`
    ///
    /// SQLite cannot add a key column, nor a NOT NULL column without a
    /// default; such columns are added nullable with a warning.
    pub async fn add_column(pool: &SqlitePool, table: &str, column: &ColumnDefinition) -> Result<()> {
        let mut sql = format!("ALTER TABLE {} ADD COLUMN {} {}", table, column.name, column.sql_type);

        if column.primary_key {
            warn!("Adding {}.{} without its PRIMARY KEY constraint", table, column.name);
        }

        match (&column.default_value, column.not_null) {
            (Some(default), true) => sql.push_str(&format!(" NOT NULL DEFAULT {}", default)),
            (Some(default), false) => sql.push_str(&format!(" DEFAULT {}", default)),
            (None, true) => {
                warn!("Adding {}.{} as nullable (no default given)", table, column.name);
            }
            (None, false) => {}
        }

        match sqlx::query(&sql).execute(pool).await {
            Ok(_) => {
                info!("Schema sync: added column {}.{} ({})", table, column.name, column.sql_type);
                Ok(())
            }
            Err(sqlx::Error::Database(e)) if e.message().contains("duplicate column") => {
                debug!("Column {}.{} already present", table, column.name);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
