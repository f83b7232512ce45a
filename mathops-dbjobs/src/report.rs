//! Job reports
//!
//! Every job returns a `JobReport`: the human-readable lines the job produced
//! plus one `ReconcileCounts` per table it reconciled. The report prints as
//! plain text or serializes to JSON.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{info, warn};

/// Insert/update/delete tallies for one reconciled table
///
/// `final_count` always equals `initial + inserted - deleted`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileCounts {
    initial: usize,
    inserted: usize,
    updated: usize,
    deleted: usize,
    #[serde(rename = "final")]
    final_count: usize,
}

impl ReconcileCounts {
    pub fn new(initial: usize) -> Self {
        Self {
            initial,
            final_count: initial,
            ..Self::default()
        }
    }

    pub fn record_insert(&mut self) {
        self.inserted += 1;
        self.final_count += 1;
    }

    pub fn record_update(&mut self) {
        self.updated += 1;
    }

    pub fn record_delete(&mut self) {
        self.deleted += 1;
        self.final_count = self.final_count.saturating_sub(1);
    }

    pub fn initial(&self) -> usize {
        self.initial
    }

    pub fn inserted(&self) -> usize {
        self.inserted
    }

    pub fn updated(&self) -> usize {
        self.updated
    }

    pub fn deleted(&self) -> usize {
        self.deleted
    }

    pub fn final_count(&self) -> usize {
        self.final_count
    }
}

/// Output of one job run
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub job: String,
    pub dry_run: bool,
    pub lines: Vec<String>,
    pub counts: BTreeMap<String, ReconcileCounts>,
}

impl JobReport {
    pub fn new(job: &str, dry_run: bool) -> Self {
        Self {
            job: job.to_string(),
            dry_run,
            lines: Vec::new(),
            counts: BTreeMap::new(),
        }
    }

    /// Append a line without logging it
    pub fn add(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Append a line and log it at info level
    pub fn note(&mut self, line: impl Into<String>) {
        let line = line.into();
        info!("{}", line);
        self.lines.push(line);
    }

    /// Append a line and log it at warn level
    pub fn warn(&mut self, line: impl Into<String>) {
        let line = line.into();
        warn!("{}", line);
        self.lines.push(line);
    }

    /// Store the final tallies for `table`
    pub fn record_counts(&mut self, table: &str, counts: ReconcileCounts) {
        self.counts.insert(table.to_string(), counts);
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for JobReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dry_run {
            writeln!(f, "[{}] dry run, no changes written", self.job)?;
        } else {
            writeln!(f, "[{}]", self.job)?;
        }

        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }

        for (table, c) in &self.counts {
            writeln!(f)?;
            writeln!(f, "  Number of {} records inserted:  {}", table, c.inserted)?;
            writeln!(f, "  Number of {} records updated:   {}", table, c.updated)?;
            writeln!(f, "  Number of {} records deleted:   {}", table, c.deleted)?;
            writeln!(f, "  Final number of {} records:     {}", table, c.final_count)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_final_count_tracks_inserts_and_deletes() {
        let mut c = ReconcileCounts::new(10);
        c.record_insert();
        c.record_insert();
        c.record_update();
        c.record_delete();

        assert_eq!(c.final_count(), c.initial() + c.inserted() - c.deleted());
        assert_eq!(c.final_count(), 11);
        assert_eq!(c.updated(), 1);
    }

    #[test]
    fn test_report_text_and_json() {
        let mut report = JobReport::new("import-ods-applicants", true);
        report.add("Found 2 applicants.");
        let mut counts = ReconcileCounts::new(1);
        counts.record_insert();
        report.record_counts("APPLICANT", counts);

        let text = report.to_string();
        assert!(text.contains("dry run"));
        assert!(text.contains("Found 2 applicants."));
        assert!(text.contains("Final number of APPLICANT records:     2"));

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["counts"]["APPLICANT"]["final"], 2);
        assert_eq!(json["dry_run"], true);
    }
}
