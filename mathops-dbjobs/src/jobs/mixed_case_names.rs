//! Mixed-case student names
//!
//! Older student rows carry names in all capitals. Where Banner holds the
//! same name with proper capitalization, the local copy is replaced.

use crate::live;
use crate::{JobContext, JobReport, ReconcileCounts};
use anyhow::{Context, Result};
use mathops_common::db::students;
use mathops_common::text::is_all_upper;

/// Banner's spelling of `local`, when it differs only in case from an all-caps local value
pub fn mixed_case(local: Option<&str>, banner: Option<&str>) -> Option<String> {
    let (local, banner) = (local?, banner?.trim());
    (is_all_upper(local) && banner != local && banner.to_lowercase() == local.to_lowercase())
        .then(|| banner.to_string())
}

pub struct StudentNamesToMixedCase {
    ctx: JobContext,
}

impl StudentNamesToMixedCase {
    pub const NAME: &'static str = "student-names-to-mixed-case";

    pub fn new(ctx: JobContext) -> Self {
        Self { ctx }
    }

    pub async fn run(&self) -> Result<JobReport> {
        let mut report = JobReport::new(Self::NAME, self.ctx.dry_run);
        let live_pool = self.ctx.live()?;

        let all_students = students::query_all(&self.ctx.primary)
            .await
            .context("Failed to query local students")?;

        let upper: Vec<_> = all_students
            .iter()
            .filter(|s| {
                s.first_name.as_deref().is_some_and(is_all_upper)
                    || s.last_name.as_deref().is_some_and(is_all_upper)
            })
            .collect();
        report.note(format!("{} students have upper-case names", upper.len()));

        let mut counts = ReconcileCounts::new(all_students.len());
        let mut not_found = 0usize;

        for student in upper {
            let name = match student.pidm {
                Some(pidm) => match live::query_current_name(live_pool, pidm).await {
                    Ok(name) => name,
                    Err(e) => {
                        report.warn(format!("{:#}", e));
                        continue;
                    }
                },
                None => None,
            };
            let Some(name) = name else {
                not_found += 1;
                continue;
            };

            let first = mixed_case(student.first_name.as_deref(), name.first_name.as_deref());
            let last = mixed_case(student.last_name.as_deref(), name.last_name.as_deref());
            if first.is_none() && last.is_none() {
                continue;
            }

            let first = first.or_else(|| student.first_name.clone());
            let last = last.or_else(|| student.last_name.clone());

            report.add(format!(
                "Changing name of {} to {} {}",
                student.stu_id,
                first.as_deref().unwrap_or_default(),
                last.as_deref().unwrap_or_default()
            ));
            if !self.ctx.dry_run {
                if let Err(e) =
                    students::update_name(&self.ctx.primary, &student.stu_id, first.as_deref(), last.as_deref())
                        .await
                {
                    report.warn(format!("Failed to update name of {}: {}", student.stu_id, e));
                    continue;
                }
            }
            counts.record_update();
        }

        report.note(format!("{} students were not found in Banner", not_found));
        report.record_counts("STUDENT", counts);
        Ok(report)
    }
}
