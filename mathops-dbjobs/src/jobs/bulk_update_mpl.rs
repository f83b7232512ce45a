//! MPL test score synchronization
//!
//! Derives each student's placement-needed score from their latest
//! intentions-page answers and makes sure Banner's most recent `MPL` row
//! agrees.

use crate::{JobContext, JobReport};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use mathops_common::db::test_scores::{self, MPL_TEST_CODE};
use mathops_common::db::{mathplans, students, RawMpscorequeue, RawStmathplan};
use mathops_common::mathplan::{desired_mpl_score, needs_new_score, MplScore, INTENTIONS_PROFILE};
use std::collections::{BTreeMap, HashMap};

/// Score a student's intentions answers call for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StudentIntent {
    pub pidm: Option<i32>,
    pub score: MplScore,
}

/// Desired score per student, for students whose answers imply one
pub fn desired_scores_by_student(responses: Vec<RawStmathplan>) -> BTreeMap<String, StudentIntent> {
    let mut by_student: BTreeMap<String, Vec<RawStmathplan>> = BTreeMap::new();
    for rec in responses {
        by_student.entry(rec.stu_id.clone()).or_default().push(rec);
    }

    by_student
        .into_iter()
        .filter_map(|(stu_id, rows)| {
            let pidm = rows.iter().find_map(|r| r.pidm);
            let latest = mathplans::latest_by_question(rows);
            desired_mpl_score(&latest).map(|score| (stu_id, StudentIntent { pidm, score }))
        })
        .collect()
}

pub struct BulkUpdateMplScores {
    ctx: JobContext,
    now: NaiveDateTime,
}

impl BulkUpdateMplScores {
    pub const NAME: &'static str = "bulk-update-mpl-scores";

    pub fn new(ctx: JobContext) -> Self {
        Self {
            ctx,
            now: Local::now().naive_local(),
        }
    }

    /// Override the timestamp written on new score rows
    pub fn with_now(mut self, now: NaiveDateTime) -> Self {
        self.now = now;
        self
    }

    pub async fn run(&self) -> Result<JobReport> {
        let mut report = JobReport::new(Self::NAME, self.ctx.dry_run);
        let live = self.ctx.live()?;

        let responses = mathplans::query_by_version(&self.ctx.primary, INTENTIONS_PROFILE)
            .await
            .context("Failed to query intentions responses")?;
        let num_responses = responses.len();

        let intents = desired_scores_by_student(responses);
        report.note(format!(
            "Loaded {} {} responses; {} students have a placement intention",
            num_responses,
            INTENTIONS_PROFILE,
            intents.len()
        ));

        let student_pidms: HashMap<String, i32> = match students::query_all(&self.ctx.primary).await {
            Ok(all) => all
                .into_iter()
                .filter_map(|s| s.pidm.map(|pidm| (s.stu_id, pidm)))
                .collect(),
            Err(e) => {
                report.warn(format!("Unable to query local students: {}", e));
                HashMap::new()
            }
        };

        let mut corrections = 0usize;

        for (stu_id, intent) in &intents {
            // The student row is kept current from the ODS; older responses may lack a PIDM
            let Some(pidm) = student_pidms.get(stu_id).copied().or(intent.pidm) else {
                report.warn(format!("Student {} has no PIDM; skipping", stu_id));
                continue;
            };

            let current = match test_scores::most_recent(live, pidm, MPL_TEST_CODE).await {
                Ok(current) => current,
                Err(e) => {
                    report.warn(format!("Unable to query MPL scores for {}: {}", stu_id, e));
                    continue;
                }
            };

            if !needs_new_score(intent.score, current.as_ref()) {
                continue;
            }

            let existing = current
                .as_ref()
                .map_or_else(|| "none".to_string(), |s| s.test_score.clone());
            report.add(format!(
                "Student {} (PIDM {}) has MPL score {}, should be {}",
                stu_id, pidm, existing, intent.score
            ));

            if !self.ctx.dry_run {
                let score = RawMpscorequeue {
                    pidm,
                    test_code: MPL_TEST_CODE.to_string(),
                    test_date: self.now,
                    test_score: intent.score.as_str().to_string(),
                };
                if let Err(e) = test_scores::insert(live, &score).await {
                    report.warn(format!("Failed to insert MPL score for {}: {}", stu_id, e));
                    continue;
                }
            }
            corrections += 1;
        }

        report.note(format!(
            "{} of {} students needed an MPL score correction",
            corrections,
            intents.len()
        ));
        Ok(report)
    }
}
