use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use pv_sweep::{
    rank_by_uptime, run_study, ReportFormat, StudyConfig, StudyConfigError, StudyRunError,
};
use sweep_core::{CancellationToken, FailurePolicy, Report, ReportSink, SinkError};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(
    name = "pv_sweep",
    about = "Sweep PV + battery designs against an hourly load profile",
    long_about = "Evaluates every combination of modules per string and string count\n\
                  (or any dimensions from a study file) and reports the fraction of\n\
                  hours each design fully meets demand."
)]
struct Cli {
    /// Study file (.toml or .json); the built-in residential study when omitted
    #[arg(long, env = "PV_SWEEP_CONFIG")]
    config: Option<PathBuf>,

    /// Hourly load table: one header line, demand in the first column
    #[arg(long, env = "PV_SWEEP_LOAD_PROFILE")]
    load_profile: Option<PathBuf>,

    /// Report file; the format follows the extension (.json, .csv, .parquet)
    #[arg(long, env = "PV_SWEEP_OUTPUT")]
    output: Option<PathBuf>,

    /// Maximum number of designs evaluated at once
    #[arg(long, env = "PV_SWEEP_MAX_CONCURRENCY")]
    max_concurrency: Option<usize>,

    /// `tolerant` records infeasible designs; `fail-fast` aborts on the first
    #[arg(long, env = "PV_SWEEP_FAILURE_POLICY")]
    failure_policy: Option<FailurePolicy>,

    /// Cancel the sweep after this many seconds
    #[arg(long, env = "PV_SWEEP_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    /// Number of best designs to print
    #[arg(long, default_value_t = 5)]
    top: usize,
}

// ── Errors ─────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Study(#[from] StudyRunError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("cannot infer report format from {} (use .json, .csv or .parquet)", .0.display())]
    UnknownFormat(PathBuf),
}

impl CliError {
    fn exit_code(&self) -> u8 {
        match self {
            Self::Study(error) if !error.is_setup() => 1,
            _ => 2,
        }
    }
}

impl From<StudyConfigError> for CliError {
    fn from(error: StudyConfigError) -> Self {
        Self::Study(StudyRunError::Setup(error))
    }
}

// ── Entry point ────────────────────────────────────────────────────

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            error!(component = "pv_sweep", error = %failure, "study_failed");
            eprintln!("error: {failure}");
            ExitCode::from(failure.exit_code())
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let study = load_study(&cli)?;
    let format = ReportFormat::from_path(&study.output)
        .ok_or_else(|| CliError::UnknownFormat(study.output.clone()))?;

    let report = run_study(&study, !cli.no_progress, CancellationToken::new())?;

    format.sink(study.output.clone()).persist(&report)?;
    info!(
        component = "pv_sweep",
        output = %study.output.display(),
        successes = report.success_count(),
        failures = report.failure_count(),
        "report_persisted"
    );

    print_summary(&report, cli.top);
    Ok(())
}

fn load_study(cli: &Cli) -> Result<StudyConfig, StudyConfigError> {
    let mut study = match &cli.config {
        Some(path) => StudyConfig::from_path(path)?,
        None => StudyConfig::default(),
    };

    if let Some(path) = &cli.load_profile {
        study.load_profile = Some(path.clone());
    }
    if let Some(path) = &cli.output {
        study.output = path.clone();
    }
    if let Some(max_concurrency) = cli.max_concurrency {
        study.sweep.max_concurrency = max_concurrency;
    }
    if let Some(failure_policy) = cli.failure_policy {
        study.sweep.failure_policy = failure_policy;
    }
    if let Some(timeout_secs) = cli.timeout_secs {
        study.sweep = study.sweep.with_timeout(Duration::from_secs(timeout_secs));
    }

    Ok(study)
}

fn print_summary(report: &Report, top: usize) {
    println!(
        "{} designs evaluated: {} feasible, {} infeasible",
        report.len(),
        report.success_count(),
        report.failure_count()
    );
    for design in rank_by_uptime(report).into_iter().take(top) {
        println!(
            "#{:<3} {:<40} uptime {:>8.4}% ({} h)",
            design.rank,
            design.point.to_string(),
            design.uptime_fraction * 100.0,
            design.uptime_hours
        );
    }
}
