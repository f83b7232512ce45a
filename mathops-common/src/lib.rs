//! # MathOps Common Library
//!
//! Shared code for the Math Placement batch jobs including:
//! - Database bootstrap, record models and per-entity queries
//! - Configuration loading
//! - Term keys and text utilities
//! - Last-writer-wins resolution shared by every reconciliation job
//! - Math plan logic (MPL score derivation, next-step advice table)

pub mod config;
pub mod db;
pub mod error;
pub mod mathplan;
pub mod resolve;
pub mod term;
pub mod text;

pub use error::{Error, Result};
pub use term::{TermKey, TermName};
