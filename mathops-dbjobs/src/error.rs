//! Job-level error types

use thiserror::Error;

/// Failures that stop a job before it starts processing records
#[derive(Error, Debug)]
pub enum JobError {
    /// The job needs a database context that was not opened
    #[error("The {0} database context is not configured")]
    MissingContext(&'static str),
}
