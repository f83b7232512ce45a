//! Errors from the shared data layer

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Bad or unreadable bootstrap configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// An ODS or live database file that must already exist does not
    #[error("Source database {} does not exist", .0.display())]
    MissingSource(PathBuf),

    /// Term code that is neither a Banner code nor a short term string
    #[error("Invalid term: {0}")]
    InvalidTerm(String),
}
