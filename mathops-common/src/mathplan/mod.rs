//! Math plan logic shared by the batch jobs

pub mod mpl;
pub mod next_step;

pub use mpl::{desired_mpl_score, needs_new_score, MplScore, INTENTIONS_PROFILE};
pub use next_step::{advice, needs_placement, Advice, Emphasis, NextStep, StepContext};
