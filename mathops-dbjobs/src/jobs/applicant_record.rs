//! Admitted applicant as assembled from the ODS

use chrono::NaiveDate;
use mathops_common::db::{RawApplicant, RawStudent};
use mathops_common::resolve::{content_digest, RecencyChain};
use mathops_common::text::{clean_gpa, prune};
use mathops_common::TermKey;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::warn;

/// One admitted applicant, field lengths fitted to the local schema
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplicantRecord {
    pub csu_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub pref_name: Option<String>,
    pub middle_initial: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub email: Option<String>,
    pub adm_type: Option<String>,
    pub student_class: Option<String>,
    pub college: Option<String>,
    pub department: Option<String>,
    pub program_of_study: Option<String>,
    pub hs_code: Option<String>,
    pub residency: Option<String>,
    pub residency_state: Option<String>,
    pub residency_county: Option<String>,
    pub hs_gpa: Option<String>,
    pub hs_class_rank: Option<i32>,
    pub hs_class_size: Option<i32>,
    pub act_math: Option<i32>,
    pub sat_math: Option<i32>,
    pub pidm: Option<i32>,
    pub application_term: Option<TermKey>,
    pub application_date: Option<NaiveDate>,
    /// Anticipated graduation term as the ODS reports it (usually a Banner code)
    pub grad_term: Option<String>,
    pub campus: Option<String>,
}

fn chain() -> &'static RecencyChain<ApplicantRecord> {
    static CHAIN: OnceLock<RecencyChain<ApplicantRecord>> = OnceLock::new();
    CHAIN.get_or_init(|| {
        RecencyChain::new()
            .then_by_optional(|r: &ApplicantRecord| r.application_term)
            .then_by_optional(|r: &ApplicantRecord| r.application_date)
            .then_by_key(|r: &ApplicantRecord| r.score())
            .then_by_optional(|r: &ApplicantRecord| r.grad_term.clone())
            .then_by_key(|r: &ApplicantRecord| r.digest())
    })
}

/// One record per CSU ID, keeping whichever `is_more_recent_than` prefers
pub fn latest_per_student<I>(records: I) -> HashMap<String, ApplicantRecord>
where
    I: IntoIterator<Item = ApplicantRecord>,
{
    let mut latest: HashMap<String, ApplicantRecord> = HashMap::new();

    for record in records {
        let replace = latest
            .get(&record.csu_id)
            .map_or(true, |existing| record.is_more_recent_than(existing));
        if replace {
            latest.insert(record.csu_id.clone(), record);
        }
    }

    latest
}

impl ApplicantRecord {
    /// Trim every text field and cut it to its column width
    pub fn pruned(self) -> Self {
        Self {
            first_name: prune(self.first_name.as_deref(), 30),
            last_name: prune(self.last_name.as_deref(), 30),
            pref_name: prune(self.pref_name.as_deref(), 30),
            middle_initial: prune(self.middle_initial.as_deref(), 1),
            gender: prune(self.gender.as_deref(), 1),
            email: prune(self.email.as_deref(), 60),
            adm_type: prune(self.adm_type.as_deref(), 2),
            student_class: prune(self.student_class.as_deref(), 2),
            hs_code: prune(self.hs_code.as_deref(), 6),
            residency: prune(self.residency.as_deref(), 4),
            residency_state: prune(self.residency_state.as_deref(), 4),
            residency_county: prune(self.residency_county.as_deref(), 6),
            hs_gpa: prune(self.hs_gpa.as_deref(), 4),
            campus: prune(self.campus.as_deref(), 20),
            ..self
        }
    }

    /// Number of populated optional academic fields
    pub fn score(&self) -> usize {
        [
            self.college.is_some(),
            self.department.is_some(),
            self.program_of_study.is_some(),
            self.student_class.is_some(),
            self.hs_code.is_some(),
            self.hs_gpa.is_some(),
            self.hs_class_rank.is_some(),
            self.hs_class_size.is_some(),
            self.act_math.is_some(),
            self.sat_math.is_some(),
            self.grad_term.is_some(),
            self.campus.is_some(),
        ]
        .iter()
        .filter(|present| **present)
        .count()
    }

    fn digest(&self) -> [u8; 32] {
        let text = |v: Option<i32>| v.map(|n| n.to_string());
        let fields = [
            Some(self.csu_id.clone()),
            self.first_name.clone(),
            self.last_name.clone(),
            self.pref_name.clone(),
            self.middle_initial.clone(),
            self.birth_date.map(|d| d.to_string()),
            self.gender.clone(),
            self.email.clone(),
            self.adm_type.clone(),
            self.student_class.clone(),
            self.college.clone(),
            self.department.clone(),
            self.program_of_study.clone(),
            self.hs_code.clone(),
            self.residency.clone(),
            self.residency_state.clone(),
            self.residency_county.clone(),
            self.hs_gpa.clone(),
            text(self.hs_class_rank),
            text(self.hs_class_size),
            text(self.act_math),
            text(self.sat_math),
            text(self.pidm),
            self.application_term.map(|t| t.banner_code()),
            self.application_date.map(|d| d.to_string()),
            self.grad_term.clone(),
            self.campus.clone(),
        ];
        content_digest(fields.iter().map(|f| f.as_deref()))
    }

    /// True if this record should replace `other` for the same student
    ///
    /// Later application term wins, then later application date, then the
    /// more complete record, then the later graduation term. Records equal
    /// on all of those are ordered by content so the result is repeatable.
    pub fn is_more_recent_than(&self, other: &ApplicantRecord) -> bool {
        let chain = chain();
        if chain.deciding_tier(self, other).map_or(true, |tier| tier >= 2) {
            warn!(
                "Multiple applicant records for {} for {:?}",
                other.csu_id,
                self.application_term.map(|t| t.short_string())
            );
        }
        chain.is_more_recent(self, other)
    }

    /// Row for the local `applicant` table
    pub fn to_applicant(&self) -> RawApplicant {
        RawApplicant {
            stu_id: self.csu_id.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            birthdate: self.birth_date,
            ethnicity: None,
            gender: self.gender.clone(),
            college: self.college.clone(),
            prog_study: self.program_of_study.clone(),
            hs_code: self.hs_code.clone(),
            tr_credits: None,
            resident: self.residency.clone(),
            resident_state: self.residency_state.clone(),
            resident_county: self.residency_county.clone(),
            hs_gpa: self.hs_gpa.clone(),
            hs_class_rank: self.hs_class_rank,
            hs_size_class: self.hs_class_size,
            act_score: self.act_math,
            sat_score: self.sat_math,
            pidm: self.pidm,
            apln_term: self.application_term,
        }
    }

    /// True if `local` already holds every field this record would write
    ///
    /// Ethnicity and transfer credits are not sourced from the ODS and are
    /// ignored.
    pub fn same_as(&self, local: &RawApplicant) -> bool {
        let comparable = RawApplicant {
            ethnicity: None,
            tr_credits: None,
            ..local.clone()
        };
        self.to_applicant() == comparable
    }

    /// Longer of residency and residency state (state wins ties)
    fn merged_residency(&self) -> Option<String> {
        match (&self.residency, &self.residency_state) {
            (res, None) => res.clone(),
            (None, state) => state.clone(),
            (Some(res), Some(state)) => {
                if state.chars().count() >= res.chars().count() {
                    Some(state.clone())
                } else {
                    Some(res.clone())
                }
            }
        }
    }

    fn parsed_grad_term(&self) -> Option<TermKey> {
        let grad = self.grad_term.as_deref()?.trim();

        let parsed = if grad.len() == 6 {
            TermKey::from_banner_code(grad).filter(|t| (2000..2100).contains(&t.year))
        } else {
            TermKey::parse_short(grad).ok()
        };

        if parsed.is_none() {
            warn!("Invalid graduation term '{}' for {}", grad, self.csu_id);
        }
        parsed
    }

    /// Row for the local `student` table, stamped as created on `today`
    pub fn to_student(&self, today: NaiveDate) -> RawStudent {
        RawStudent {
            stu_id: self.csu_id.clone(),
            pidm: self.pidm,
            last_name: self.last_name.clone(),
            first_name: self.first_name.clone(),
            pref_name: self.pref_name.clone(),
            middle_initial: self.middle_initial.clone(),
            apln_term: self.application_term,
            class: self.student_class.clone(),
            college: self.college.clone(),
            dept: self.department.clone(),
            program_code: self.program_of_study.clone(),
            est_graduation: self.parsed_grad_term(),
            hs_code: self.hs_code.clone(),
            hs_gpa: self.hs_gpa.as_deref().map(clean_gpa),
            hs_class_rank: self.hs_class_rank,
            hs_size_class: self.hs_class_size,
            act_score: self.act_math,
            sat_score: self.sat_math,
            resident: self.merged_residency(),
            birthdate: self.birth_date,
            gender: self.gender.clone(),
            campus: self.campus.clone(),
            stu_email: self.email.clone(),
            adviser_email: None,
            admit_type: self.adm_type.clone(),
            create_dt: Some(today),
        }
    }
}
