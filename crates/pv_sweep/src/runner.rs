//! Sweep execution with terminal progress reporting.

use indicatif::{ProgressBar, ProgressStyle};
use sweep_core::{
    run_sweep, CancellationToken, LoadProfile, Report, SimulationOracle, SweepConfig, SweepError,
    SweepOptions,
};
use tracing::info;

use crate::config::{StudyConfig, StudyConfigError};
use crate::load_profile;
use crate::pv_model::PvBatteryOracle;

#[derive(Debug, thiserror::Error)]
pub enum StudyRunError {
    #[error(transparent)]
    Setup(#[from] StudyConfigError),

    #[error(transparent)]
    Sweep(#[from] SweepError),
}

impl StudyRunError {
    /// True when the study never started evaluating: bad files or settings.
    pub fn is_setup(&self) -> bool {
        match self {
            Self::Setup(_) => true,
            Self::Sweep(error) => error.is_configuration(),
        }
    }
}

/// Run a sweep, optionally drawing a progress bar on stderr.
///
/// The bar advances once per accepted outcome and shows the running count
/// of infeasible designs.
pub fn run_design_sweep<O>(
    config: &SweepConfig,
    load: &LoadProfile,
    oracle: &O,
    show_progress: bool,
    cancellation: CancellationToken,
) -> Result<Report, SweepError>
where
    O: SimulationOracle + ?Sized,
{
    let pb = progress_bar(config.total_points(), show_progress);

    let mut options = SweepOptions::new().with_cancellation(cancellation);
    if let Some(bar) = pb.clone() {
        options = options.with_progress(move |progress| {
            bar.set_position(progress.completed as u64);
            if progress.failures > 0 {
                bar.set_message(format!("{} infeasible", progress.failures));
            }
        });
    }

    let result = run_sweep(config, load, oracle, options);

    if let Some(ref progress_bar) = pb {
        match &result {
            Ok(_) => progress_bar.finish_with_message("Completed"),
            Err(_) => progress_bar.abandon_with_message("Stopped"),
        }
    }

    result
}

/// Loads a study's inputs, builds the reference oracle, and runs the sweep.
pub fn run_study(
    study: &StudyConfig,
    show_progress: bool,
    cancellation: CancellationToken,
) -> Result<Report, StudyRunError> {
    let config = study.normalize()?;
    let load = load_profile::from_path(study.load_profile_path()?)
        .map_err(StudyConfigError::from)?;
    let oracle = PvBatteryOracle::new(study.system.clone(), study.solar()?);

    info!(
        component = "pv_sweep",
        fingerprint = config.fingerprint(),
        total_points = config.total_points(),
        load_hours = load.len(),
        load_total_kwh = load.total(),
        load_peak_kw = load.peak(),
        "study_loaded"
    );

    Ok(run_design_sweep(
        &config,
        &load,
        &oracle,
        show_progress,
        cancellation,
    )?)
}

fn progress_bar(total: usize, show_progress: bool) -> Option<ProgressBar> {
    if !show_progress || total == 0 {
        return None;
    }

    let bar = ProgressBar::new(total as u64);
    let style = ProgressStyle::default_bar()
        .template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
        )
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    Some(bar)
}
