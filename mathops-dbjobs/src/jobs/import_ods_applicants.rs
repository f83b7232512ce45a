//! Applicant reconciliation from the ODS
//!
//! Queries admitted applicants for a window of application terms, keeps one
//! record per CSU ID, and brings the local `applicant` table in line with
//! the result. Optionally creates `student` rows for applicants not yet
//! known locally.

use super::applicant_record::{latest_per_student, ApplicantRecord};
use crate::ods::{self, OdsApplicantRow};
use crate::{JobContext, JobReport, ReconcileCounts};
use anyhow::{Context, Result};
use chrono::{Datelike, Local, NaiveDate};
use mathops_common::db::{applicants, students, terms};
use mathops_common::text::normalize_apostrophes;
use mathops_common::TermKey;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

pub struct ImportOdsApplicants {
    ctx: JobContext,
    today: NaiveDate,
    create_students: bool,
}

impl ImportOdsApplicants {
    pub const NAME: &'static str = "import-ods-applicants";

    pub fn new(ctx: JobContext) -> Self {
        Self {
            ctx,
            today: Local::now().date_naive(),
            create_students: false,
        }
    }

    /// Override the current date (sets the term window and student create date)
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Also insert `student` rows for applicants missing from that table
    pub fn create_students(mut self, create: bool) -> Self {
        self.create_students = create;
        self
    }

    pub async fn run(&self) -> Result<JobReport> {
        let mut report = JobReport::new(Self::NAME, self.ctx.dry_run);

        let active = terms::active_term(&self.ctx.primary)
            .await
            .context("Failed to query active term")?;
        let Some(active) = active else {
            report.warn("Unable to query the active term");
            return Ok(report);
        };

        let ods_pool = self.ctx.ods()?;
        report.note(format!(
            "Processing under the {} term",
            active.term.name.full_name().to_uppercase()
        ));

        let (start, end) = ods::application_term_window(self.today.year());
        let decoded = match ods::query_applicants(ods_pool, active.term.name, &start, &end).await {
            Ok(decoded) => decoded,
            Err(e) => {
                report.warn(format!("Unable to perform query: {:#}", e));
                return Ok(report);
            }
        };
        for problem in decoded.rejected {
            report.warn(problem);
        }
        let rows = decoded.rows;
        debug!("ODS returned {} applicant rows for {}..{}", rows.len(), start, end);

        let records: Vec<ApplicantRecord> = rows
            .iter()
            .filter_map(|row| admitted_record(row, &mut report))
            .collect();
        let num_rows = records.len();

        let applicants = latest_per_student(records);
        if num_rows > applicants.len() {
            info!("Resolved {} duplicate applicant rows", num_rows - applicants.len());
        }
        report.note(format!("Found {} applicants.", applicants.len()));

        if let Err(e) = self.reconcile(&applicants, &mut report).await {
            report.warn(format!("Database exception: {:#}", e));
        }

        if self.create_students {
            if let Err(e) = self.insert_missing_students(&applicants, &mut report).await {
                report.warn(format!("Database exception: {:#}", e));
            }
        }

        report.add("Job completed");
        Ok(report)
    }

    async fn reconcile(
        &self,
        ods_records: &HashMap<String, ApplicantRecord>,
        report: &mut JobReport,
    ) -> Result<()> {
        let pool = &self.ctx.primary;

        let mut local: HashMap<String, _> = applicants::query_all(pool)
            .await
            .context("Failed to query local applicants")?
            .into_iter()
            .map(|a| (a.stu_id.clone(), a))
            .collect();

        report.add(format!("There are {} admitted records from ODS", ods_records.len()));
        report.add(format!("There are {} records in local APPLICANT table", local.len()));

        let mut counts = ReconcileCounts::new(local.len());

        let mut ids: Vec<&String> = ods_records.keys().collect();
        ids.sort();

        for id in ids {
            let record = &ods_records[id];

            match local.remove(id) {
                None => {
                    report.add(format!("Inserting applicant record for {}", id));
                    if !self.ctx.dry_run {
                        if let Err(e) = applicants::insert(pool, &record.to_applicant()).await {
                            report.warn(format!("Failed to insert applicant {}: {}", id, e));
                            continue;
                        }
                    }
                    counts.record_insert();
                }
                Some(existing) if !record.same_as(&existing) => {
                    report.add(format!("Updating applicant record for {}", id));
                    if !self.ctx.dry_run {
                        if let Err(e) = replace_applicant(pool, record).await {
                            report.warn(format!("Failed to update applicant {}: {:#}", id, e));
                            continue;
                        }
                    }
                    counts.record_update();
                }
                Some(_) => {}
            }
        }

        let mut obsolete: Vec<String> = local.into_keys().collect();
        obsolete.sort();

        for id in obsolete {
            report.add(format!("Deleting obsolete record for {}", id));
            if !self.ctx.dry_run {
                if let Err(e) = applicants::delete(pool, &id).await {
                    report.warn(format!("Failed to delete applicant {}: {}", id, e));
                    continue;
                }
            }
            counts.record_delete();
        }

        report.record_counts("APPLICANT", counts);
        Ok(())
    }

    async fn insert_missing_students(
        &self,
        ods_records: &HashMap<String, ApplicantRecord>,
        report: &mut JobReport,
    ) -> Result<()> {
        let pool = &self.ctx.primary;

        let existing: HashSet<String> = students::query_all(pool)
            .await
            .context("Failed to query local students")?
            .into_iter()
            .map(|s| s.stu_id)
            .collect();

        let mut counts = ReconcileCounts::new(existing.len());

        let mut missing: Vec<&ApplicantRecord> = ods_records
            .values()
            .filter(|r| !existing.contains(&r.csu_id))
            .collect();
        missing.sort_by(|a, b| a.csu_id.cmp(&b.csu_id));

        for record in missing {
            report.add(format!("Creating student record for {}", record.csu_id));
            if !self.ctx.dry_run {
                if let Err(e) = students::insert(pool, &record.to_student(self.today)).await {
                    report.warn(format!("Failed to insert student {}: {}", record.csu_id, e));
                    continue;
                }
            }
            counts.record_insert();
        }

        report.record_counts("STUDENT", counts);
        Ok(())
    }
}

async fn replace_applicant(pool: &sqlx::SqlitePool, record: &ApplicantRecord) -> Result<()> {
    applicants::delete(pool, &record.csu_id).await?;
    applicants::insert(pool, &record.to_applicant()).await?;
    Ok(())
}

/// Build a record from one ODS row, or `None` if the row is unusable or not admitted
fn admitted_record(row: &OdsApplicantRow, report: &mut JobReport) -> Option<ApplicantRecord> {
    let Some(csu_id) = row.csu_id.as_deref() else {
        report.add("ODS record had null CSU ID");
        return None;
    };
    if csu_id.chars().count() != 9 {
        report.add(format!("ODS record had bad student ID: '{}'", csu_id));
        return None;
    }

    let admitted = row.admitted.as_deref()?;
    if row.decision.is_none() && admitted != "Y" {
        return None;
    }

    let application_term = row.app_term.as_deref().and_then(|code| {
        let term = TermKey::from_banner_code(code);
        if term.is_none() && code.len() == 6 {
            report.add(format!("Warning: Invalid application term for {}: {}", csu_id, code));
        }
        term
    });

    let name = |value: &Option<String>| value.as_deref().map(normalize_apostrophes);

    let record = ApplicantRecord {
        csu_id: csu_id.to_string(),
        first_name: name(&row.first_name),
        last_name: name(&row.last_name),
        pref_name: name(&row.pref_name),
        middle_initial: name(&row.middle_name),
        birth_date: row.birth_date,
        gender: row.gender.clone(),
        email: row.email.clone(),
        adm_type: row.adm_type.clone(),
        student_class: row.student_class.clone(),
        college: row.college.clone().or_else(|| row.adm_college.clone()),
        department: row.department.clone().or_else(|| row.adm_dept.clone()),
        program_of_study: row.program.clone().or_else(|| row.adm_program.clone()),
        hs_code: row.hs_code.clone(),
        residency: row.residency.clone().or_else(|| row.adm_residency.clone()),
        residency_state: row.residency_state.clone(),
        residency_county: row.residency_county.clone(),
        hs_gpa: row.hs_gpa.clone(),
        hs_class_rank: row.hs_class_rank,
        hs_class_size: row.hs_class_size,
        act_math: row.act_math,
        sat_math: row.satr_math.or(row.sat_math),
        pidm: row.pidm,
        application_term,
        application_date: row.apln_date,
        grad_term: row.grad_term.clone(),
        campus: row.campus.clone().or_else(|| row.adm_campus.clone()),
    };

    Some(record.pruned())
}
