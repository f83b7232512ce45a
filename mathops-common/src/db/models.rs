//! Database models
//!
//! One struct per table. Terms are stored as their short string (`FA24`);
//! dates use SQLite's ISO-8601 text form through the `chrono` integration.

use crate::TermKey;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Row of the `term` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermRec {
    pub term: TermKey,
    pub start_dt: NaiveDate,
    pub end_dt: NaiveDate,
    /// 0 for the active term, negative for past terms, positive for future
    pub active_index: i32,
}

/// Row of the `student` table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawStudent {
    pub stu_id: String,
    pub pidm: Option<i32>,
    pub last_name: Option<String>,
    pub first_name: Option<String>,
    pub pref_name: Option<String>,
    pub middle_initial: Option<String>,
    pub apln_term: Option<TermKey>,
    pub class: Option<String>,
    pub college: Option<String>,
    pub dept: Option<String>,
    pub program_code: Option<String>,
    pub est_graduation: Option<TermKey>,
    pub hs_code: Option<String>,
    pub hs_gpa: Option<String>,
    pub hs_class_rank: Option<i32>,
    pub hs_size_class: Option<i32>,
    pub act_score: Option<i32>,
    pub sat_score: Option<i32>,
    pub resident: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub gender: Option<String>,
    pub campus: Option<String>,
    pub stu_email: Option<String>,
    pub adviser_email: Option<String>,
    pub admit_type: Option<String>,
    pub create_dt: Option<NaiveDate>,
}

/// Row of the `applicant` table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawApplicant {
    pub stu_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub ethnicity: Option<String>,
    pub gender: Option<String>,
    pub college: Option<String>,
    pub prog_study: Option<String>,
    pub hs_code: Option<String>,
    pub tr_credits: Option<String>,
    pub resident: Option<String>,
    pub resident_state: Option<String>,
    pub resident_county: Option<String>,
    pub hs_gpa: Option<String>,
    pub hs_class_rank: Option<i32>,
    pub hs_size_class: Option<i32>,
    pub act_score: Option<i32>,
    pub sat_score: Option<i32>,
    pub pidm: Option<i32>,
    pub apln_term: Option<TermKey>,
}

/// One answer to one math plan question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawStmathplan {
    pub stu_id: String,
    pub pidm: Option<i32>,
    pub apln_term: Option<TermKey>,
    /// Profile (page) identifier, such as `WLCM5`
    pub version: String,
    pub exam_dt: NaiveDate,
    pub survey_nbr: i32,
    pub stu_answer: Option<String>,
    /// Minute of the day the page was submitted
    pub finish_time: Option<i32>,
    pub session: Option<i64>,
}

/// Row of the live `sortest` test score table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMpscorequeue {
    pub pidm: i32,
    pub test_code: String,
    pub test_date: NaiveDateTime,
    pub test_score: String,
}

/// Special student category assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSpecialStus {
    pub stu_id: String,
    pub stu_type: String,
    pub start_dt: Option<NaiveDate>,
    pub end_dt: Option<NaiveDate>,
}

impl RawSpecialStus {
    /// True if the assignment covers `date` (open ends are unbounded)
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.start_dt.map_or(true, |start| start <= date)
            && self.end_dt.map_or(true, |end| end >= date)
    }
}

/// Local copy of one Banner program catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramCode {
    pub prog_code: String,
    pub description: Option<String>,
}

/// Column value for an optional term
pub(crate) fn term_to_sql(term: Option<TermKey>) -> Option<String> {
    term.map(|t| t.short_string())
}

/// Parse a stored term, logging values that do not parse
pub(crate) fn term_from_sql(value: Option<String>) -> Option<TermKey> {
    let value = value?;
    match value.parse() {
        Ok(term) => Some(term),
        Err(_) => {
            warn!("Ignoring unparseable stored term '{}'", value);
            None
        }
    }
}
