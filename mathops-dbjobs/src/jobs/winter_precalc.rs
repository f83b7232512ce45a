//! Winter Precalculus Tutorial eligibility
//!
//! During a Fall term, students admitted for the following Spring whose math
//! plan calls for placement are granted the `WINPCT` special category for
//! the winter break.

use super::bulk_update_mpl::desired_scores_by_student;
use crate::{JobContext, JobReport, ReconcileCounts};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use mathops_common::db::special_students::{self, WINTER_PRECALC};
use mathops_common::db::{mathplans, students, terms, RawSpecialStus};
use mathops_common::mathplan::{MplScore, INTENTIONS_PROFILE};
use mathops_common::{TermKey, TermName};
use std::collections::{BTreeMap, BTreeSet};

/// First and last day of the winter window following Fall `term`
pub fn winter_window(term: TermKey) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(term.year, 12, 1)?;
    let end = NaiveDate::from_ymd_opt(term.year + 1, 1, 31)?;
    Some((start, end))
}

pub struct DetermineWinterPrecalcElig {
    ctx: JobContext,
}

impl DetermineWinterPrecalcElig {
    pub const NAME: &'static str = "determine-winter-precalc-elig";

    pub fn new(ctx: JobContext) -> Self {
        Self { ctx }
    }

    pub async fn run(&self) -> Result<JobReport> {
        let mut report = JobReport::new(Self::NAME, self.ctx.dry_run);
        let pool = &self.ctx.primary;

        let Some(active) = terms::active_term(pool).await.context("Failed to query active term")? else {
            report.warn("Unable to query the active term");
            return Ok(report);
        };

        if active.term.name != TermName::Fall {
            report.note(format!(
                "Active term is {}; eligibility is only determined during a Fall term",
                active.term
            ));
            return Ok(report);
        }

        let target = active.term.next();
        let (start, end) = winter_window(active.term).context("Invalid winter window")?;
        report.note(format!(
            "Determining eligibility for {} applicants ({} to {})",
            target, start, end
        ));

        let intents = desired_scores_by_student(
            mathplans::query_by_version(pool, INTENTIONS_PROFILE)
                .await
                .context("Failed to query intentions responses")?,
        );

        let eligible: BTreeSet<String> = students::query_all(pool)
            .await
            .context("Failed to query local students")?
            .into_iter()
            .filter(|s| s.apln_term == Some(target))
            .filter(|s| {
                intents
                    .get(&s.stu_id)
                    .is_some_and(|intent| intent.score == MplScore::PlacementNeeded)
            })
            .map(|s| s.stu_id)
            .collect();
        report.note(format!("{} students are eligible", eligible.len()));

        let mut existing: BTreeMap<String, RawSpecialStus> =
            special_students::query_by_category(pool, WINTER_PRECALC)
                .await
                .context("Failed to query special student categories")?
                .into_iter()
                .map(|rec| (rec.stu_id.clone(), rec))
                .collect();

        let mut counts = ReconcileCounts::new(existing.len());

        for stu_id in &eligible {
            if existing.remove(stu_id).is_some() {
                continue;
            }

            report.add(format!("Granting {} to {}", WINTER_PRECALC, stu_id));
            if !self.ctx.dry_run {
                let rec = RawSpecialStus {
                    stu_id: stu_id.clone(),
                    stu_type: WINTER_PRECALC.to_string(),
                    start_dt: Some(start),
                    end_dt: Some(end),
                };
                if let Err(e) = special_students::insert(pool, &rec).await {
                    report.warn(format!("Failed to grant {} to {}: {}", WINTER_PRECALC, stu_id, e));
                    continue;
                }
            }
            counts.record_insert();
        }

        for stu_id in existing.keys() {
            report.add(format!("Removing {} from {}", WINTER_PRECALC, stu_id));
            if !self.ctx.dry_run {
                if let Err(e) = special_students::delete(pool, stu_id, WINTER_PRECALC).await {
                    report.warn(format!("Failed to remove {} from {}: {}", WINTER_PRECALC, stu_id, e));
                    continue;
                }
            }
            counts.record_delete();
        }

        report.record_counts("SPECIAL_STUS", counts);
        Ok(report)
    }
}
