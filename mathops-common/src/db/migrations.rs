//! Versioned schema migrations
//!
//! Column additions are handled by `schema_sync`; migrations cover everything
//! else (indexes, data fixes). Each migration is idempotent and the applied
//! version is recorded in `schema_version`.
//!
//! Never edit a released migration; add a new one and bump
//! `CURRENT_SCHEMA_VERSION`.

use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Highest migration this build knows about
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Latest applied version, or 0 for a fresh database
pub async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let table_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_version')",
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i32> = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
        .fetch_one(pool)
        .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Apply every migration newer than the recorded version
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current = get_schema_version(pool).await?;

    if current == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current);
        return Ok(());
    }

    if current > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than this build ({}); leaving it as is",
            current, CURRENT_SCHEMA_VERSION
        );
        return Ok(());
    }

    info!("Running database migrations: v{} -> v{}", current, CURRENT_SCHEMA_VERSION);

    if current < 1 {
        migrate_v1(pool).await?;
        set_schema_version(pool, 1).await?;
        info!("✓ Migration v1 completed");
    }

    if current < 2 {
        migrate_v2(pool).await?;
        set_schema_version(pool, 2).await?;
        info!("✓ Migration v2 completed");
    }

    Ok(())
}

/// v1: index math plan responses by student and profile
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_stmathplan_stu_version ON stmathplan (stu_id, version)")
        .execute(pool)
        .await?;

    Ok(())
}

/// v2: index special student categories and normalize their case
///
/// Category codes were once entered by hand in mixed case; lookups compare
/// upper-case codes.
async fn migrate_v2(pool: &SqlitePool) -> Result<()> {
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_special_stus_type ON special_stus (stu_type)")
        .execute(pool)
        .await?;

    let fixed = sqlx::query(
        r#"
        UPDATE OR IGNORE special_stus
        SET stu_type = UPPER(TRIM(stu_type))
        WHERE stu_type <> UPPER(TRIM(stu_type))
        "#,
    )
    .execute(pool)
    .await?
    .rows_affected();

    if fixed > 0 {
        info!("Migration v2: normalized {} special student category code(s)", fixed);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::create_schema;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_version_zero_without_table() {
        let pool = memory_pool().await;
        assert_eq!(get_schema_version(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_migrations_reach_current_version() {
        let pool = memory_pool().await;
        create_schema(&pool).await.unwrap();
        assert_eq!(get_schema_version(&pool).await.unwrap(), CURRENT_SCHEMA_VERSION);

        let index_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name LIKE 'idx_%'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(index_count, 2);
    }

    #[tokio::test]
    async fn test_v2_normalizes_category_case() {
        let pool = memory_pool().await;
        create_schema(&pool).await.unwrap();

        sqlx::query("INSERT INTO special_stus (stu_id, stu_type) VALUES ('812345678', ' tutor')")
            .execute(&pool)
            .await
            .unwrap();
        migrate_v2(&pool).await.unwrap();

        let stu_type: String = sqlx::query_scalar("SELECT stu_type FROM special_stus")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(stu_type, "TUTOR");
    }
}
