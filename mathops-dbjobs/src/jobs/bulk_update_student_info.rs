//! Student information refresh from the ODS
//!
//! Compares each local student's identity and program fields with the ODS
//! person record and latest enrollment term summary.

use crate::ods::{self, OdsPerson, OdsTermSummary};
use crate::{JobContext, JobReport, ReconcileCounts};
use anyhow::{Context, Result};
use mathops_common::db::students::{self, OdsFields};
use mathops_common::resolve::{resolve_latest, RecencyChain};
use mathops_common::text::middle_initial;
use sqlx::SqlitePool;
use std::collections::HashMap;
use tracing::{info, warn};

/// Shared test account, never refreshed
pub const TEST_STUDENT_ID: &str = "888888888";

pub struct BulkUpdateStudentInfo {
    ctx: JobContext,
}

impl BulkUpdateStudentInfo {
    pub const NAME: &'static str = "bulk-update-student-info";

    pub fn new(ctx: JobContext) -> Self {
        Self { ctx }
    }

    pub async fn run(&self) -> Result<JobReport> {
        let mut report = JobReport::new(Self::NAME, self.ctx.dry_run);
        let ods_pool = self.ctx.ods()?;

        let all_students = students::query_all(&self.ctx.primary)
            .await
            .context("Failed to query local students")?;
        if all_students.is_empty() {
            report.note("No local students to refresh");
            return Ok(report);
        }
        report.note(format!("Loaded {} students", all_students.len()));

        let persons = match load_persons(ods_pool, &mut report).await {
            Ok(persons) => persons,
            Err(e) => {
                report.warn(format!("Unable to query ODS students: {:#}", e));
                return Ok(report);
            }
        };
        report.note(format!("Loaded {} ODS students", persons.len()));

        let summaries = match load_latest_summaries(ods_pool, &mut report).await {
            Ok(summaries) => summaries,
            Err(e) => {
                report.warn(format!("Unable to query ODS term summaries: {:#}", e));
                return Ok(report);
            }
        };

        let mut counts = ReconcileCounts::new(all_students.len());

        for student in &all_students {
            if student.stu_id == TEST_STUDENT_ID {
                continue;
            }

            let (Some(person), Some(summary)) =
                (persons.get(&student.stu_id), summaries.get(&student.stu_id))
            else {
                continue;
            };

            let fields = match ods_fields(person, summary) {
                Ok(fields) => fields,
                Err(problem) => {
                    report.warn(format!("{} for student {}", problem, student.stu_id));
                    continue;
                }
            };

            if fields == OdsFields::of(student) {
                continue;
            }

            report.note(format!("Need to update {}", student.stu_id));
            if !self.ctx.dry_run {
                if let Err(e) = students::update_ods_fields(&self.ctx.primary, &student.stu_id, &fields).await {
                    report.warn(format!("Failed to update student {}: {}", student.stu_id, e));
                    continue;
                }
            }
            counts.record_update();
        }

        report.record_counts("STUDENT", counts);
        Ok(report)
    }
}

/// Fields the local row should hold, or why the ODS data cannot be used
fn ods_fields(person: &OdsPerson, summary: &OdsTermSummary) -> std::result::Result<OdsFields, &'static str> {
    if person.pidm.is_none() {
        return Err("PIDM from ODS was null");
    }
    if person.first_name.is_none() {
        return Err("First name from ODS was null");
    }
    if person.last_name.is_none() {
        return Err("Last name from ODS was null");
    }

    Ok(OdsFields {
        pidm: person.pidm,
        first_name: person.first_name.clone(),
        last_name: person.last_name.clone(),
        middle_initial: middle_initial(person.middle_name.as_deref()),
        pref_name: person.pref_name.clone(),
        stu_email: person.email.clone(),
        college: summary.college.clone(),
        dept: summary.department.clone(),
        program_code: summary.program.clone(),
    })
}

/// ODS persons by CSU ID; on duplicates the last row wins
async fn load_persons(pool: &SqlitePool, report: &mut JobReport) -> Result<HashMap<String, OdsPerson>> {
    let decoded = ods::query_all_persons(pool).await?;
    for problem in decoded.rejected {
        report.warn(problem);
    }

    let mut result = HashMap::new();
    for person in decoded.rows {
        if result.contains_key(&person.csu_id) {
            warn!(" *** Duplicate ODS record for student {}", person.csu_id);
        }
        result.insert(person.csu_id.clone(), person);
    }

    Ok(result)
}

/// Highest-numbered enrollment term summary per CSU ID
async fn load_latest_summaries(
    pool: &SqlitePool,
    report: &mut JobReport,
) -> Result<HashMap<String, OdsTermSummary>> {
    let decoded = ods::query_all_term_summaries(pool).await?;
    for problem in decoded.rejected {
        report.warn(problem);
    }

    let rows = decoded.rows;
    let num_rows = rows.len();

    let numbered = rows.into_iter().filter_map(|summary| {
        let parsed = summary.term.as_deref()?.trim().parse::<i64>();
        match parsed {
            Ok(value) => Some((value, summary)),
            Err(_) => {
                warn!(
                    "Unable to parse term string [{}] for {}",
                    summary.term.as_deref().unwrap_or_default(),
                    summary.csu_id
                );
                None
            }
        }
    });

    let chain = RecencyChain::new().then_by_key(|(term, _): &(i64, OdsTermSummary)| *term);
    let latest = resolve_latest(numbered, |(_, s)| s.csu_id.clone(), &chain);

    info!("Loaded {} term summaries for {} students", num_rows, latest.len());
    Ok(latest.into_iter().map(|(id, (_, summary))| (id, summary)).collect())
}
