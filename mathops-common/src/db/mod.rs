//! Database bootstrap, models and per-table operations

pub mod applicants;
pub mod init;
pub mod mathplans;
pub mod migrations;
pub mod models;
pub mod program_codes;
pub mod schema_sync;
pub mod special_students;
pub mod students;
pub mod table_schemas;
pub mod terms;
pub mod test_scores;

pub use init::{create_schema, init_database, open_source};
pub use models::*;
