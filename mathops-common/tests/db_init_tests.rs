//! Primary database creation and upgrade on disk

use mathops_common::db::schema_sync::SchemaIntrospector;
use mathops_common::db::{init_database, open_source, students, RawStudent};
use mathops_common::Error;
use sqlx::sqlite::SqlitePoolOptions;
use tempfile::TempDir;

#[tokio::test]
async fn test_database_created_when_missing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("nested").join("primary.db");

    let pool = init_database(&db_path).await.unwrap();
    assert!(db_path.exists());
    assert!(SchemaIntrospector::table_exists(&pool, "student").await.unwrap());
}

#[tokio::test]
async fn test_reopen_preserves_data() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("primary.db");

    let pool = init_database(&db_path).await.unwrap();
    students::insert(
        &pool,
        &RawStudent {
            stu_id: "867890123".to_string(),
            first_name: Some("Ravi".to_string()),
            ..RawStudent::default()
        },
    )
    .await
    .unwrap();
    pool.close().await;

    let pool = init_database(&db_path).await.unwrap();
    let loaded = students::query_by_id(&pool, "867890123").await.unwrap().unwrap();
    assert_eq!(loaded.first_name.as_deref(), Some("Ravi"));
}

#[tokio::test]
async fn test_legacy_file_is_upgraded() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("legacy.db");

    // A file written before adviser email and create date were tracked
    let legacy = SqlitePoolOptions::new()
        .connect(&format!("sqlite://{}?mode=rwc", db_path.display()))
        .await
        .unwrap();
    sqlx::query("CREATE TABLE student (stu_id TEXT PRIMARY KEY, pidm INTEGER, first_name TEXT)")
        .execute(&legacy)
        .await
        .unwrap();
    sqlx::query("INSERT INTO student (stu_id, pidm, first_name) VALUES ('878901234', 5, 'Mei')")
        .execute(&legacy)
        .await
        .unwrap();
    legacy.close().await;

    let pool = init_database(&db_path).await.unwrap();
    let columns = SchemaIntrospector::introspect_table(&pool, "student").await.unwrap();
    assert!(columns.iter().any(|c| c.name == "adviser_email"));
    assert!(columns.iter().any(|c| c.name == "create_dt"));

    let loaded = students::query_by_id(&pool, "878901234").await.unwrap().unwrap();
    assert_eq!(loaded.pidm, Some(5));
    assert_eq!(loaded.adviser_email, None);
}

#[tokio::test]
async fn test_open_source_never_creates() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("ods.db");

    let result = open_source(&db_path).await;
    assert!(matches!(result, Err(Error::MissingSource(_))));
    assert!(!db_path.exists());

    init_database(&db_path).await.unwrap().close().await;
    assert!(open_source(&db_path).await.is_ok());
}
