use crate::aggregator::ResultAggregator;
use crate::contract::SweepConfig;
use crate::error::SweepError;
use crate::grid;
use crate::oracle::{LoadProfile, SimulationOracle};
use crate::report::Report;
use crate::scheduler::{CancellationToken, SweepOutcome, SweepProgress, SweepScheduler};

/// Caller-side hooks for a sweep run.
#[derive(Default)]
pub struct SweepOptions<'a> {
    cancellation: CancellationToken,
    progress: Option<Box<dyn FnMut(SweepProgress) + 'a>>,
}

impl<'a> SweepOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Called on the driving thread after every accepted outcome.
    pub fn with_progress(mut self, progress: impl FnMut(SweepProgress) + 'a) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }
}

/// Generates the grid, evaluates it with bounded concurrency and returns the
/// grid-ordered report. Any error discards all partial results.
pub fn run_sweep<O>(
    config: &SweepConfig,
    load: &LoadProfile,
    oracle: &O,
    options: SweepOptions<'_>,
) -> Result<Report, SweepError>
where
    O: SimulationOracle + ?Sized,
{
    let grid = grid::generate(config.dimensions())?;
    let total = grid.len();
    let scheduler = SweepScheduler::from_config(config).with_cancellation(options.cancellation);
    let mut progress = options.progress;
    let mut aggregator = ResultAggregator::new(total);
    let mut failures = 0usize;

    scheduler.run(&grid, load, oracle, &mut |delivered| {
        if matches!(delivered.outcome, SweepOutcome::Failure(_)) {
            failures += 1;
        }
        aggregator.accept(delivered)?;
        if let Some(report_progress) = progress.as_mut() {
            report_progress(SweepProgress {
                completed: aggregator.received(),
                total,
                failures,
            });
        }
        Ok(())
    })?;

    let records = aggregator.finish()?;
    Ok(Report::new(
        config.fingerprint().to_string(),
        config.failure_policy(),
        grid.dimension_names().to_vec(),
        records,
    ))
}
