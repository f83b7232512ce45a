//! Applicant reconciliation against seeded ODS tables

mod helpers;

use helpers::*;
use mathops_common::db::{applicants, students, RawApplicant};
use mathops_common::TermKey;
use mathops_dbjobs::jobs::{ApplicantRecord, ImportOdsApplicants};
use mathops_dbjobs::JobContext;

async fn seeded_context(dry_run: bool) -> JobContext {
    let ctx = full_context(dry_run).await;
    set_active_term(&ctx.primary, "FA25").await;

    let ods = ctx.ods().unwrap();
    seed_ods_applicant(ods, "811111111", 1, "202590", "2025-01-15").await;
    seed_ods_application(ods, 1, "202610", "2025-03-01").await;
    seed_ods_applicant(ods, "822222222", 2, "202590", "2025-02-01").await;
    seed_ods_applicant(ods, "12345", 3, "202590", "2025-02-01").await;
    // Outside the application term window
    seed_ods_applicant(ods, "844444444", 4, "201990", "2019-02-01").await;

    let stale = RawApplicant {
        stu_id: "822222222".to_string(),
        last_name: Some("Ramen".to_string()),
        ..RawApplicant::default()
    };
    applicants::insert(&ctx.primary, &stale).await.unwrap();

    let obsolete = RawApplicant {
        stu_id: "833333333".to_string(),
        ..RawApplicant::default()
    };
    applicants::insert(&ctx.primary, &obsolete).await.unwrap();

    ctx
}

#[tokio::test]
async fn test_reconcile_inserts_updates_and_deletes() {
    let ctx = seeded_context(false).await;

    let report = ImportOdsApplicants::new(ctx.clone())
        .with_today(date(2025, 10, 1))
        .run()
        .await
        .unwrap();

    let counts = report.counts["APPLICANT"];
    assert_eq!(counts.initial(), 2);
    assert_eq!(counts.inserted(), 1);
    assert_eq!(counts.updated(), 1);
    assert_eq!(counts.deleted(), 1);
    assert_eq!(counts.final_count(), 2);
    assert!(report
        .lines
        .iter()
        .any(|l| l == "ODS record had bad student ID: '12345'"));

    let rows = applicants::query_all(&ctx.primary).await.unwrap();
    assert_eq!(rows.len(), counts.final_count());

    // The later of the two applications survives
    let first = applicants::query_by_id(&ctx.primary, "811111111").await.unwrap().unwrap();
    assert_eq!(first.apln_term, Some("SP26".parse::<TermKey>().unwrap()));
    assert_eq!(first.first_name.as_deref(), Some("Priya"));
    assert_eq!(first.hs_gpa.as_deref(), Some("3.90"));
    assert_eq!(first.prog_study.as_deref(), Some("MATH-BS"));
    assert_eq!(first.pidm, Some(1));

    let updated = applicants::query_by_id(&ctx.primary, "822222222").await.unwrap().unwrap();
    assert_eq!(updated.last_name.as_deref(), Some("Raman"));

    assert!(applicants::query_by_id(&ctx.primary, "833333333").await.unwrap().is_none());
    assert!(applicants::query_by_id(&ctx.primary, "844444444").await.unwrap().is_none());
}

#[tokio::test]
async fn test_second_run_changes_nothing() {
    let ctx = seeded_context(false).await;
    let job = ImportOdsApplicants::new(ctx.clone()).with_today(date(2025, 10, 1));

    job.run().await.unwrap();
    let report = job.run().await.unwrap();

    let counts = report.counts["APPLICANT"];
    assert_eq!(counts.inserted(), 0);
    assert_eq!(counts.updated(), 0);
    assert_eq!(counts.deleted(), 0);
    assert_eq!(counts.final_count(), counts.initial());
}

#[tokio::test]
async fn test_dry_run_reports_without_writing() {
    let ctx = seeded_context(true).await;

    let report = ImportOdsApplicants::new(ctx.clone())
        .with_today(date(2025, 10, 1))
        .run()
        .await
        .unwrap();

    assert!(report.dry_run);
    assert_eq!(report.counts["APPLICANT"].inserted(), 1);
    assert!(report
        .lines
        .iter()
        .any(|l| l == "Inserting applicant record for 811111111"));

    let rows = applicants::query_all(&ctx.primary).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert!(applicants::query_by_id(&ctx.primary, "833333333").await.unwrap().is_some());
}

#[tokio::test]
async fn test_create_students_for_new_applicants() {
    let ctx = seeded_context(false).await;
    students::insert(&ctx.primary, &student("822222222", 2)).await.unwrap();

    let report = ImportOdsApplicants::new(ctx.clone())
        .with_today(date(2025, 10, 1))
        .create_students(true)
        .run()
        .await
        .unwrap();

    assert_eq!(report.counts["STUDENT"].inserted(), 1);

    let created = students::query_by_id(&ctx.primary, "811111111").await.unwrap().unwrap();
    assert_eq!(created.hs_gpa.as_deref(), Some("3.9"));
    assert_eq!(created.stu_email.as_deref(), Some("priya@example.edu"));
    assert_eq!(created.create_dt, Some(date(2025, 10, 1)));
}

#[tokio::test]
async fn test_missing_active_term_does_no_work() {
    let ctx = full_context(false).await;

    let report = ImportOdsApplicants::new(ctx).run().await.unwrap();

    assert!(report.counts.is_empty());
    assert!(report.lines.iter().any(|l| l.contains("active term")));
}

#[tokio::test]
async fn test_missing_ods_context_is_an_error() {
    let ctx = JobContext::new(primary_pool().await, true);
    set_active_term(&ctx.primary, "FA25").await;

    let result = ImportOdsApplicants::new(ctx).run().await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_odd_warehouse_values_do_not_stop_the_import() {
    let ctx = full_context(false).await;
    set_active_term(&ctx.primary, "FA25").await;
    let ods = ctx.ods().unwrap();

    seed_ods_applicant(ods, "811111111", 1, "202590", "2025-01-15").await;
    sqlx::query(
        "UPDATE csug_gp_admissions SET birth_date = '2006-06-29 00:00:00', hs_class_rank = 12.5 WHERE pidm = 1",
    )
    .execute(ods)
    .await
    .unwrap();

    seed_ods_applicant(ods, "822222222", 2, "202590", "2025-02-01").await;
    sqlx::query("UPDATE csug_gp_admissions SET birth_date = '2007-03-14' WHERE pidm = 2")
        .execute(ods)
        .await
        .unwrap();

    seed_ods_applicant(ods, "833333333", 3, "202590", "2025-02-01").await;
    sqlx::query("UPDATE csug_gp_admissions SET birth_date = 'unknown' WHERE pidm = 3")
        .execute(ods)
        .await
        .unwrap();

    let report = ImportOdsApplicants::new(ctx.clone())
        .with_today(date(2025, 10, 1))
        .run()
        .await
        .unwrap();

    assert_eq!(report.counts["APPLICANT"].inserted(), 2);
    assert!(report
        .lines
        .iter()
        .any(|l| l.starts_with("Skipping ODS row for 833333333")));

    let first = applicants::query_by_id(&ctx.primary, "811111111").await.unwrap().unwrap();
    assert_eq!(first.birthdate, Some(date(2006, 6, 29)));
    assert_eq!(first.hs_class_rank, Some(12));

    let second = applicants::query_by_id(&ctx.primary, "822222222").await.unwrap().unwrap();
    assert_eq!(second.birthdate, Some(date(2007, 3, 14)));
}

#[tokio::test]
async fn test_pruned_record_survives_the_applicant_table() {
    let pool = primary_pool().await;

    let record = ApplicantRecord {
        csu_id: "811111111".to_string(),
        first_name: Some("  Maximiliana-Alexandrina Fitzgerald ".to_string()),
        last_name: Some("Vanderberg-Oyelaran-Castellanos-Whitmore".to_string()),
        birth_date: Some(date(2006, 6, 29)),
        gender: Some(" Female".to_string()),
        college: Some("NS".to_string()),
        program_of_study: Some("MATH-BS".to_string()),
        hs_code: Some(" 0612345 ".to_string()),
        residency: Some("RESIDENT".to_string()),
        residency_state: Some(" CO   ".to_string()),
        residency_county: Some("LARIMER COUNTY".to_string()),
        hs_gpa: Some("3.8750".to_string()),
        hs_class_rank: Some(12),
        hs_class_size: Some(350),
        act_math: Some(27),
        sat_math: Some(640),
        pidm: Some(1),
        application_term: Some("FA25".parse::<TermKey>().unwrap()),
        ..ApplicantRecord::default()
    }
    .pruned();

    let row = record.to_applicant();
    assert_eq!(row.first_name.as_deref(), Some("Maximiliana-Alexandrina Fitzge"));
    assert_eq!(row.last_name.as_deref().map(|n| n.chars().count()), Some(30));
    assert_eq!(row.gender.as_deref(), Some("F"));
    assert_eq!(row.hs_code.as_deref(), Some("061234"));
    assert_eq!(row.resident.as_deref(), Some("RESI"));
    assert_eq!(row.resident_state.as_deref(), Some("CO"));
    assert_eq!(row.resident_county.as_deref(), Some("LARIME"));
    assert_eq!(row.hs_gpa.as_deref(), Some("3.87"));

    applicants::insert(&pool, &row).await.unwrap();
    let stored = applicants::query_by_id(&pool, "811111111").await.unwrap().unwrap();

    assert_eq!(stored, row);
    assert!(record.same_as(&stored));
}
