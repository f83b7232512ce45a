//! Banner program codes
//!
//! Mirrors the valid entries of the Banner program catalog into the local
//! `program_code` table, then brings each student's program code up to date
//! from their latest Banner program assignment.

use crate::live::{self, StudentProgram};
use crate::{JobContext, JobReport, ReconcileCounts};
use anyhow::{Context, Result};
use mathops_common::db::{program_codes, students, ProgramCode};
use mathops_common::resolve::{resolve_latest, RecencyChain};
use sqlx::SqlitePool;
use std::collections::{BTreeMap, HashMap};

/// Latest program assignment per PIDM (highest effective term)
pub fn latest_programs(rows: Vec<StudentProgram>) -> HashMap<i32, StudentProgram> {
    let chain = RecencyChain::new()
        .then_by_key(|p: &StudentProgram| p.eff_term.clone())
        .then_by_key(|p: &StudentProgram| p.prog_code.clone());
    resolve_latest(rows, |p| p.pidm, &chain)
}

pub struct DownloadBannerProgramCodes {
    ctx: JobContext,
}

impl DownloadBannerProgramCodes {
    pub const NAME: &'static str = "download-banner-program-codes";

    pub fn new(ctx: JobContext) -> Self {
        Self { ctx }
    }

    pub async fn run(&self) -> Result<JobReport> {
        let mut report = JobReport::new(Self::NAME, self.ctx.dry_run);
        let live_pool = self.ctx.live()?;

        if let Err(e) = self.sync_catalog(live_pool, &mut report).await {
            report.warn(format!("Program catalog not synchronized: {:#}", e));
        }

        if let Err(e) = self.sync_student_programs(live_pool, &mut report).await {
            report.warn(format!("Student programs not synchronized: {:#}", e));
        }

        Ok(report)
    }

    async fn sync_catalog(&self, live_pool: &SqlitePool, report: &mut JobReport) -> Result<()> {
        let pool = &self.ctx.primary;

        let catalog = live::query_valid_programs(live_pool).await?;
        report.note(format!("Banner lists {} valid program codes", catalog.len()));

        let mut local: BTreeMap<String, ProgramCode> = program_codes::query_all(pool)
            .await
            .context("Failed to query local program codes")?
            .into_iter()
            .map(|c| (c.prog_code.clone(), c))
            .collect();

        let mut counts = ReconcileCounts::new(local.len());

        for entry in &catalog {
            let code = &entry.prog_code;

            match local.remove(code) {
                None => {
                    report.add(format!("Adding program code {}", code));
                    if !self.ctx.dry_run {
                        let row = ProgramCode {
                            prog_code: code.clone(),
                            description: entry.description.clone(),
                        };
                        if let Err(e) = program_codes::insert(pool, &row).await {
                            report.warn(format!("Failed to add program code {}: {}", code, e));
                            continue;
                        }
                    }
                    counts.record_insert();
                }
                Some(existing) if existing.description != entry.description => {
                    report.add(format!("Updating description of program code {}", code));
                    if !self.ctx.dry_run {
                        let description = entry.description.as_deref();
                        if let Err(e) = program_codes::update_description(pool, code, description).await {
                            report.warn(format!("Failed to update program code {}: {}", code, e));
                            continue;
                        }
                    }
                    counts.record_update();
                }
                Some(_) => {}
            }
        }

        for code in local.keys() {
            report.add(format!("Deleting program code {} (no longer valid)", code));
            if !self.ctx.dry_run {
                if let Err(e) = program_codes::delete(pool, code).await {
                    report.warn(format!("Failed to delete program code {}: {}", code, e));
                    continue;
                }
            }
            counts.record_delete();
        }

        report.record_counts("PROGRAM_CODE", counts);
        Ok(())
    }

    async fn sync_student_programs(&self, live_pool: &SqlitePool, report: &mut JobReport) -> Result<()> {
        let pool = &self.ctx.primary;

        let latest = latest_programs(live::query_student_programs(live_pool).await?);
        report.note(format!("Banner has program assignments for {} students", latest.len()));

        let all_students = students::query_all(pool)
            .await
            .context("Failed to query local students")?;
        let mut counts = ReconcileCounts::new(all_students.len());

        for student in &all_students {
            let Some(program) = student.pidm.and_then(|pidm| latest.get(&pidm)) else {
                continue;
            };
            if student.program_code.as_deref() == Some(program.prog_code.as_str()) {
                continue;
            }

            report.add(format!(
                "Changing program of {} from {} to {}",
                student.stu_id,
                student.program_code.as_deref().unwrap_or("none"),
                program.prog_code
            ));
            if !self.ctx.dry_run {
                if let Err(e) =
                    students::update_program(pool, &student.stu_id, Some(program.prog_code.as_str())).await
                {
                    report.warn(format!("Failed to update program of {}: {}", student.stu_id, e));
                    continue;
                }
            }
            counts.record_update();
        }

        report.record_counts("STUDENT", counts);
        Ok(())
    }
}
