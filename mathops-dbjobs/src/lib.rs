//! mathops-dbjobs library - batch data-synchronization jobs
//!
//! Each job reads one or more of three database contexts and reconciles the
//! local application schema (or, for test scores, Banner) against them:
//!
//! - **primary**: the local math schema (students, applicants, math plans)
//! - **ods**: the reporting warehouse mirror (admissions, term info)
//! - **live**: the Banner mirror (test scores, program catalog, names)

use sqlx::SqlitePool;

pub mod error;
pub mod jobs;
pub mod live;
pub mod ods;
pub mod report;

pub use error::JobError;
pub use report::{JobReport, ReconcileCounts};

/// Database pools plus the dry-run switch, shared by every job
#[derive(Clone)]
pub struct JobContext {
    /// Local application schema
    pub primary: SqlitePool,
    ods: Option<SqlitePool>,
    live: Option<SqlitePool>,
    /// When set, jobs report intended changes without writing them
    pub dry_run: bool,
}

impl JobContext {
    pub fn new(primary: SqlitePool, dry_run: bool) -> Self {
        Self {
            primary,
            ods: None,
            live: None,
            dry_run,
        }
    }

    pub fn with_ods(mut self, ods: SqlitePool) -> Self {
        self.ods = Some(ods);
        self
    }

    pub fn with_live(mut self, live: SqlitePool) -> Self {
        self.live = Some(live);
        self
    }

    /// ODS warehouse pool
    pub fn ods(&self) -> Result<&SqlitePool, JobError> {
        self.ods.as_ref().ok_or(JobError::MissingContext("ODS"))
    }

    /// Banner live pool
    pub fn live(&self) -> Result<&SqlitePool, JobError> {
        self.live.as_ref().ok_or(JobError::MissingContext("LIVE"))
    }
}
