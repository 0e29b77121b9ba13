//! LMS Engagement Analytics Import Engine
//!
//! Batch pipeline handling:
//! - Blackboard export archive parsing (zip of pipe-delimited CSV members)
//! - Referential reconciliation of vendor keys into the course store
//! - Per-user session reconstruction with the 40-minute gap rule
//! - Error accumulation with on-disk error logs and a summary report

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use analytics_core::{CourseOffering, Error, LmsType};
use lms_import::error_log::{dedup_errors, sample};
use lms_import::{BlackboardImport, CourseStore, ErrorLogWriter, ExportArchive};
use session_worker::SessionWorker;
use telemetry::init_tracing_from_env;

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    /// Directory import error logs are written to
    #[serde(default = "default_error_logs_dir")]
    error_logs_dir: String,

    /// How many errors to quote inline in the run summary
    #[serde(default = "default_error_sample_size")]
    error_sample_size: usize,
}

fn default_error_logs_dir() -> String {
    "data/error-logs".to_string()
}

fn default_error_sample_size() -> usize {
    lms_import::error_log::DEFAULT_ERROR_SAMPLE_SIZE
}

impl Default for Config {
    fn default() -> Self {
        Self {
            error_logs_dir: default_error_logs_dir(),
            error_sample_size: default_error_sample_size(),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "lms-analytics", about = "LMS engagement analytics import engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Import a course export archive and reconstruct sessions
    Import {
        /// Path to the export zip archive
        archive: PathBuf,

        /// Course offering code, e.g. COMP1001_2016_S2
        #[arg(long)]
        code: String,

        /// Offering start (RFC 3339, e.g. 2016-07-01T00:00:00Z)
        #[arg(long)]
        start: DateTime<Utc>,

        /// Offering end (RFC 3339)
        #[arg(long)]
        end: DateTime<Utc>,

        /// LMS the archive was exported from
        #[arg(long, default_value = "blackboard")]
        lms: LmsType,

        /// Clear imported data for the offering without importing
        #[arg(long)]
        just_clear: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing_from_env();

    info!("Starting LMS analytics engine v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    let cli = Cli::parse();

    match cli.command {
        Command::Import {
            archive,
            code,
            start,
            end,
            lms,
            just_clear,
        } => {
            let offering = CourseOffering::new(code, lms, start, end);
            let mut store = CourseStore::new(offering);
            run_import(&config, &mut store, &archive, just_clear).await
        }
    }
}

async fn run_import(
    config: &Config,
    store: &mut CourseStore,
    archive_path: &Path,
    just_clear: bool,
) -> Result<()> {
    let code = store.offering().code.clone();
    let lms_type = store.offering().lms_type;
    if lms_type != LmsType::Blackboard {
        bail!("no import support for LMS type {}", lms_type.as_str());
    }

    if just_clear {
        info!("Removing old data for {}", code);
        store.clear();
        store.update_latest_activity();
        return Ok(());
    }

    info!("Importing course offering data for {}", code);
    let archive = ExportArchive::open(archive_path)
        .with_context(|| format!("Failed to open export archive {}", archive_path.display()))?;

    let outcome = BlackboardImport::new(&archive, store)
        .process_import_data()
        .context("Import failed")?;

    let errors = dedup_errors(outcome.errors);
    let non_critical_errors = dedup_errors(outcome.non_critical_errors);

    if errors.is_empty() {
        info!("Processing user sessions for {}", code);
        SessionWorker::run(store)
            .await
            .context("Session reconstruction failed")?;
    }

    let log_writer = ErrorLogWriter::new(&config.error_logs_dir);
    let log_time = Utc::now();

    if !non_critical_errors.is_empty() {
        let log_path = log_writer.write_non_critical_errors(&non_critical_errors, log_time)?;
        warn!(
            "{} non critical error(s) during the import of {}; full log at {}",
            non_critical_errors.len(),
            code,
            log_path.display()
        );
        for err in sample(&non_critical_errors, config.error_sample_size) {
            warn!("  {}", err);
        }
    }

    // Critical errors abort the run before the offering is stamped.
    if !errors.is_empty() {
        let log_path = log_writer.write_errors(&errors, log_time)?;
        error!(
            "{} error(s) during the import of {}; full log at {}",
            errors.len(),
            code,
            log_path.display()
        );
        for err in sample(&errors, config.error_sample_size) {
            error!("  {}", err);
        }
        return Err(Error::ImportData {
            count: errors.len(),
        }
        .into());
    }

    store.update_latest_activity();

    let stats = store.stats();
    info!(
        users = stats.users,
        pages = stats.pages,
        page_visits = stats.page_visits,
        posts = stats.posts,
        submission_attempts = stats.submission_attempts,
        sessions = stats.sessions,
        "import finished"
    );
    println!("{}", serde_json::to_string_pretty(&stats)?);

    Ok(())
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        // Start with defaults
        .add_source(config::Config::try_from(&Config::default())?)
        // Load from config file if exists
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        // Override with environment variables
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("LMS")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let config: Config = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    Ok(config)
}
