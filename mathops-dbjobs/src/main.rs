//! mathops-dbjobs - Math Placement batch data-synchronization jobs
//!
//! One subcommand per job. Jobs run in dry-run mode unless the configuration
//! disables it or `--apply` is given.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mathops_common::config::{load_config, DatabasePaths};
use mathops_common::db::{init_database, migrations, open_source};
use mathops_dbjobs::jobs::{
    BulkUpdateMplScores, BulkUpdateStudentInfo, DetermineWinterPrecalcElig, DownloadBannerProgramCodes,
    ImportOdsApplicants, StudentNamesToMixedCase,
};
use mathops_dbjobs::{JobContext, JobReport};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mathops-dbjobs")]
#[command(about = "Math Placement batch data-synchronization jobs", version)]
struct Args {
    /// Configuration file (overrides MATHOPS_CONFIG and the standard locations)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write changes (turns dry-run mode off for this run)
    #[arg(long, global = true)]
    apply: bool,

    /// Print the job report as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Primary database path
    #[arg(long, global = true, env = "MATHOPS_PRIMARY_DB")]
    primary: Option<PathBuf>,

    /// ODS database path
    #[arg(long, global = true, env = "MATHOPS_ODS_DB")]
    ods: Option<PathBuf>,

    /// Banner live database path
    #[arg(long, global = true, env = "MATHOPS_LIVE_DB")]
    live: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reconcile the applicant table with admitted applicants in the ODS
    ImportOdsApplicants {
        /// Also create student rows for applicants not yet in the student table
        #[arg(long)]
        create_students: bool,
    },
    /// Record MPL test scores implied by students' math plans
    BulkUpdateMplScores,
    /// Refresh student identity and program fields from the ODS
    BulkUpdateStudentInfo,
    /// Grant winter Precalculus Tutorial eligibility
    DetermineWinterPrecalcElig,
    /// Mirror the Banner program catalog and student program codes
    DownloadBannerProgramCodes,
    /// Replace all-caps student names with Banner's capitalization
    StudentNamesToMixedCase,
    /// Create or upgrade the primary database schema
    InitDb,
}

impl Command {
    fn needs_ods(&self) -> bool {
        matches!(
            self,
            Command::ImportOdsApplicants { .. } | Command::BulkUpdateStudentInfo
        )
    }

    fn needs_live(&self) -> bool {
        matches!(
            self,
            Command::BulkUpdateMplScores
                | Command::DownloadBannerProgramCodes
                | Command::StudentNamesToMixedCase
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing; the filter is replaced once the config file is read
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_filter_reloading();
    let filter_handle = builder.reload_handle();
    builder.init();

    // Log build identification immediately after tracing init
    info!(
        "Starting Math Placement batch jobs (mathops-dbjobs) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config = load_config(args.config.as_deref()).context("Failed to load configuration")?;

    if std::env::var_os("RUST_LOG").is_none() {
        if let Err(e) = filter_handle.reload(EnvFilter::new(&config.logging.level)) {
            warn!("Unable to apply log level '{}': {}", config.logging.level, e);
        }
    }

    let paths = DatabasePaths {
        primary: args.primary.clone().unwrap_or(config.databases.primary),
        ods: args.ods.clone().unwrap_or(config.databases.ods),
        live: args.live.clone().unwrap_or(config.databases.live),
    };

    let dry_run = config.dry_run && !args.apply;
    if dry_run {
        info!("Dry-run mode: changes are reported but not written (use --apply to write)");
    }

    let report = match run(&args.command, &paths, dry_run).await {
        Ok(report) => report,
        Err(e) => {
            error!("Job failed: {:#}", e);
            return Err(e);
        }
    };

    if args.json {
        println!("{}", report.to_json().context("Failed to serialize report")?);
    } else {
        print!("{}", report);
    }

    Ok(())
}

async fn run(command: &Command, paths: &DatabasePaths, dry_run: bool) -> Result<JobReport> {
    info!("Primary database: {}", paths.primary.display());
    let primary = init_database(&paths.primary)
        .await
        .with_context(|| format!("Failed to open primary database {}", paths.primary.display()))?;

    let mut ctx = JobContext::new(primary, dry_run);

    if command.needs_ods() {
        info!("ODS database: {}", paths.ods.display());
        let ods = open_source(&paths.ods)
            .await
            .with_context(|| format!("Failed to open ODS database {}", paths.ods.display()))?;
        ctx = ctx.with_ods(ods);
    }

    if command.needs_live() {
        info!("Live database: {}", paths.live.display());
        let live = open_source(&paths.live)
            .await
            .with_context(|| format!("Failed to open live database {}", paths.live.display()))?;
        ctx = ctx.with_live(live);
    }

    match command {
        Command::ImportOdsApplicants { create_students } => {
            ImportOdsApplicants::new(ctx)
                .create_students(*create_students)
                .run()
                .await
        }
        Command::BulkUpdateMplScores => BulkUpdateMplScores::new(ctx).run().await,
        Command::BulkUpdateStudentInfo => BulkUpdateStudentInfo::new(ctx).run().await,
        Command::DetermineWinterPrecalcElig => DetermineWinterPrecalcElig::new(ctx).run().await,
        Command::DownloadBannerProgramCodes => DownloadBannerProgramCodes::new(ctx).run().await,
        Command::StudentNamesToMixedCase => StudentNamesToMixedCase::new(ctx).run().await,
        Command::InitDb => {
            let version = migrations::get_schema_version(&ctx.primary).await?;
            let mut report = JobReport::new("init-db", false);
            report.note(format!(
                "Primary schema ready at {} (schema version {})",
                paths.primary.display(),
                version
            ));
            Ok(report)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::try_parse_from([
            "mathops-dbjobs",
            "import-ods-applicants",
            "--create-students",
            "--apply",
            "--json",
        ])
        .unwrap();

        assert!(args.apply);
        assert!(args.json);
        assert!(matches!(
            args.command,
            Command::ImportOdsApplicants { create_students: true }
        ));
        assert!(args.command.needs_ods());
        assert!(!args.command.needs_live());
    }
}
