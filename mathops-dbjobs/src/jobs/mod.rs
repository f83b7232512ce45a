//! Batch jobs, one module per job

pub mod applicant_record;
pub mod banner_program_codes;
pub mod bulk_update_mpl;
pub mod bulk_update_student_info;
pub mod import_ods_applicants;
pub mod mixed_case_names;
pub mod winter_precalc;

pub use applicant_record::ApplicantRecord;
pub use banner_program_codes::DownloadBannerProgramCodes;
pub use bulk_update_mpl::BulkUpdateMplScores;
pub use bulk_update_student_info::BulkUpdateStudentInfo;
pub use import_ods_applicants::ImportOdsApplicants;
pub use mixed_case_names::StudentNamesToMixedCase;
pub use winter_precalc::DetermineWinterPrecalcElig;
