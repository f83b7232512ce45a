//! Student information refresh, program code download and name casing

mod helpers;

use helpers::*;
use mathops_common::db::{program_codes, students, ProgramCode, RawStudent};
use mathops_dbjobs::jobs::{BulkUpdateStudentInfo, DownloadBannerProgramCodes, StudentNamesToMixedCase};
use sqlx::SqlitePool;

async fn seed_ods_person(ods: &SqlitePool, csu_id: &str, pidm: i32) {
    sqlx::query(
        "INSERT INTO csug_gp_admissions (csu_id, pidm, first_name, middle_name, last_name, \
         preferred_first_name, email, multi_source) \
         VALUES (?, ?, 'Tomás', ' Elías ', 'Herrera', 'Tom', 'tomas.herrera@example.edu', 'CSU')",
    )
    .bind(csu_id)
    .bind(pidm)
    .execute(ods)
    .await
    .unwrap();
}

async fn seed_term_summary(ods: &SqlitePool, csu_id: &str, term: &str, college: &str, program: &str) {
    sqlx::query(
        "INSERT INTO csus_enroll_term_summary_ah (csu_id, term, primary_college, primary_department, \
         program_of_study) VALUES (?, ?, ?, 'MATH', ?)",
    )
    .bind(csu_id)
    .bind(term)
    .bind(college)
    .bind(program)
    .execute(ods)
    .await
    .unwrap();
}

#[tokio::test]
async fn test_student_info_refreshed_from_latest_term() {
    let ctx = full_context(false).await;
    let ods = ctx.ods().unwrap();

    let outdated = RawStudent {
        first_name: Some("TOMAS".to_string()),
        last_name: Some("HERRERA".to_string()),
        ..student("845678901", 4567)
    };
    students::insert(&ctx.primary, &outdated).await.unwrap();
    students::insert(&ctx.primary, &student("888888888", 8888)).await.unwrap();

    seed_ods_person(ods, "845678901", 4567).await;
    seed_term_summary(ods, "845678901", "202490", "LA", "UNDC-BS").await;
    seed_term_summary(ods, "845678901", "202510", "NS", "MATH-BS").await;
    seed_term_summary(ods, "845678901", "SUMMER", "XX", "XX").await;
    seed_ods_person(ods, "888888888", 8888).await;
    seed_term_summary(ods, "888888888", "202510", "NS", "MATH-BS").await;

    let report = BulkUpdateStudentInfo::new(ctx.clone()).run().await.unwrap();

    assert_eq!(report.counts["STUDENT"].updated(), 1);
    assert!(report.lines.iter().any(|l| l == "Need to update 845678901"));

    let refreshed = students::query_by_id(&ctx.primary, "845678901").await.unwrap().unwrap();
    assert_eq!(refreshed.first_name.as_deref(), Some("Tomás"));
    assert_eq!(refreshed.middle_initial.as_deref(), Some("E"));
    assert_eq!(refreshed.pref_name.as_deref(), Some("Tom"));
    assert_eq!(refreshed.college.as_deref(), Some("NS"));
    assert_eq!(refreshed.program_code.as_deref(), Some("MATH-BS"));

    let test_student = students::query_by_id(&ctx.primary, "888888888").await.unwrap().unwrap();
    assert_eq!(test_student.first_name, None);

    // Everything now matches
    let again = BulkUpdateStudentInfo::new(ctx).run().await.unwrap();
    assert_eq!(again.counts["STUDENT"].updated(), 0);
}

#[tokio::test]
async fn test_student_info_skips_only_undecodable_rows() {
    let ctx = full_context(false).await;
    let ods = ctx.ods().unwrap();

    students::insert(&ctx.primary, &student("845678901", 4567)).await.unwrap();
    students::insert(&ctx.primary, &student("856789012", 5678)).await.unwrap();

    seed_ods_person(ods, "845678901", 4567).await;
    seed_ods_person(ods, "856789012", 5678).await;
    sqlx::query(
        "UPDATE csug_gp_admissions SET birth_date = CASE pidm \
         WHEN 4567 THEN '2006-06-29 00:00:00' ELSE '29/06/2006' END",
    )
    .execute(ods)
    .await
    .unwrap();
    seed_term_summary(ods, "845678901", "202510", "NS", "MATH-BS").await;
    seed_term_summary(ods, "856789012", "202510", "NS", "MATH-BS").await;

    let report = BulkUpdateStudentInfo::new(ctx.clone()).run().await.unwrap();

    assert_eq!(report.counts["STUDENT"].updated(), 1);
    assert!(report
        .lines
        .iter()
        .any(|l| l.starts_with("Skipping ODS row for 856789012")));

    let refreshed = students::query_by_id(&ctx.primary, "845678901").await.unwrap().unwrap();
    assert_eq!(refreshed.first_name.as_deref(), Some("Tomás"));
    let untouched = students::query_by_id(&ctx.primary, "856789012").await.unwrap().unwrap();
    assert_eq!(untouched.first_name, None);
}

#[tokio::test]
async fn test_student_info_dry_run() {
    let ctx = full_context(true).await;
    let ods = ctx.ods().unwrap();

    students::insert(&ctx.primary, &student("845678901", 4567)).await.unwrap();
    seed_ods_person(ods, "845678901", 4567).await;
    seed_term_summary(ods, "845678901", "202510", "NS", "MATH-BS").await;

    let report = BulkUpdateStudentInfo::new(ctx.clone()).run().await.unwrap();
    assert_eq!(report.counts["STUDENT"].updated(), 1);

    let unchanged = students::query_by_id(&ctx.primary, "845678901").await.unwrap().unwrap();
    assert_eq!(unchanged.first_name, None);
}

#[tokio::test]
async fn test_program_codes_and_student_programs() {
    let ctx = full_context(false).await;
    let live = ctx.live().unwrap();

    sqlx::query(
        "INSERT INTO program_catalog (prog_code, description, valid_ind) VALUES \
         ('MATH-BS', 'Mathematics', 'Y'), ('PHYS-BS', 'Physics', 'Y'), ('OLD-BS', 'Retired', 'N')",
    )
    .execute(live)
    .await
    .unwrap();
    sqlx::query(
        "INSERT INTO student_program (pidm, eff_term, prog_code) VALUES \
         (7, '202490', 'UNDC-BS'), (7, '202510', 'MATH-BS')",
    )
    .execute(live)
    .await
    .unwrap();

    for (code, description) in [("MATH-BS", "Math"), ("OLD-BS", "Retired")] {
        program_codes::insert(
            &ctx.primary,
            &ProgramCode {
                prog_code: code.to_string(),
                description: Some(description.to_string()),
            },
        )
        .await
        .unwrap();
    }

    let undeclared = RawStudent {
        program_code: Some("UNDC-BS".to_string()),
        ..student("811111111", 7)
    };
    students::insert(&ctx.primary, &undeclared).await.unwrap();

    let report = DownloadBannerProgramCodes::new(ctx.clone()).run().await.unwrap();

    let codes = report.counts["PROGRAM_CODE"];
    assert_eq!(
        (codes.inserted(), codes.updated(), codes.deleted(), codes.final_count()),
        (1, 1, 1, 2)
    );

    let local = program_codes::query_all(&ctx.primary).await.unwrap();
    let names: Vec<_> = local.iter().map(|c| c.prog_code.as_str()).collect();
    assert_eq!(names, vec!["MATH-BS", "PHYS-BS"]);
    assert_eq!(local[0].description.as_deref(), Some("Mathematics"));

    let moved = students::query_by_id(&ctx.primary, "811111111").await.unwrap().unwrap();
    assert_eq!(moved.program_code.as_deref(), Some("MATH-BS"));
    assert_eq!(report.counts["STUDENT"].updated(), 1);
}

#[tokio::test]
async fn test_names_to_mixed_case() {
    let ctx = full_context(false).await;
    let live = ctx.live().unwrap();

    sqlx::query(
        "INSERT INTO spriden (pidm, first_name, last_name, change_ind) VALUES \
         (44, 'Siobhan', 'McAllister', NULL), (66, 'Lee', 'Park', NULL)",
    )
    .execute(live)
    .await
    .unwrap();

    let shouting = RawStudent {
        first_name: Some("SIOBHAN".to_string()),
        last_name: Some("MCALLISTER".to_string()),
        ..student("844444444", 44)
    };
    let unknown = RawStudent {
        first_name: Some("ARJUN".to_string()),
        last_name: Some("MEHTA".to_string()),
        ..student("855555555", 55)
    };
    let already_fine = RawStudent {
        first_name: Some("Lee".to_string()),
        last_name: Some("Park".to_string()),
        ..student("866666666", 66)
    };
    for s in [&shouting, &unknown, &already_fine] {
        students::insert(&ctx.primary, s).await.unwrap();
    }

    let report = StudentNamesToMixedCase::new(ctx.clone()).run().await.unwrap();

    assert_eq!(report.counts["STUDENT"].updated(), 1);
    assert!(report.lines.iter().any(|l| l == "1 students were not found in Banner"));

    let fixed = students::query_by_id(&ctx.primary, "844444444").await.unwrap().unwrap();
    assert_eq!(fixed.first_name.as_deref(), Some("Siobhan"));
    assert_eq!(fixed.last_name.as_deref(), Some("McAllister"));

    let still_upper = students::query_by_id(&ctx.primary, "855555555").await.unwrap().unwrap();
    assert_eq!(still_upper.last_name.as_deref(), Some("MEHTA"));
}
