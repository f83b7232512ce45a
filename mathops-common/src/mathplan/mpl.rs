//! Math Placement (MPL) test score derivation
//!
//! The intentions page (profile `WLCM5`) asks two questions:
//! 1. "I have completed my math plan" (affirmation)
//! 2. "I plan to complete Math Placement" (placement needed)
//!
//! Banner records the outcome as an `MPL` test score: `1` when placement is
//! not needed, `2` when it is.

use crate::db::models::{RawMpscorequeue, RawStmathplan};
use crate::db::mathplans::response_recency;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// Profile id of the intentions page
pub const INTENTIONS_PROFILE: &str = "WLCM5";

/// Question number of the plan-completed affirmation
pub const AFFIRM_COMPLETED: i32 = 1;

/// Question number of the placement-needed affirmation
pub const AFFIRM_PLACEMENT: i32 = 2;

/// Value of an `MPL` test score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MplScore {
    PlacementNotNeeded,
    PlacementNeeded,
}

impl MplScore {
    pub fn as_str(self) -> &'static str {
        match self {
            MplScore::PlacementNotNeeded => "1",
            MplScore::PlacementNeeded => "2",
        }
    }

    pub fn from_score(score: &str) -> Option<Self> {
        match score.trim() {
            "1" => Some(MplScore::PlacementNotNeeded),
            "2" => Some(MplScore::PlacementNeeded),
            _ => None,
        }
    }
}

impl fmt::Display for MplScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_yes(rec: &RawStmathplan) -> bool {
    rec.stu_answer.as_deref().map(str::trim) == Some("Y")
}

/// Score implied by the latest intentions-page answers, keyed by question
///
/// `None` unless the latest answer to question 1 is `Y`. Question 2 only
/// counts when its latest answer is `Y` and it is not older than the
/// question 1 answer.
pub fn desired_mpl_score(latest: &HashMap<i32, RawStmathplan>) -> Option<MplScore> {
    let completed = latest.get(&AFFIRM_COMPLETED).filter(|r| is_yes(r))?;

    let placement = latest
        .get(&AFFIRM_PLACEMENT)
        .filter(|r| is_yes(r))
        .filter(|r| response_recency().compare(r, completed) != Ordering::Less);

    Some(if placement.is_some() {
        MplScore::PlacementNeeded
    } else {
        MplScore::PlacementNotNeeded
    })
}

/// True when Banner's latest `MPL` score is missing or differs from `desired`
pub fn needs_new_score(desired: MplScore, current: Option<&RawMpscorequeue>) -> bool {
    current.map_or(true, |score| score.test_score.trim() != desired.as_str())
}
