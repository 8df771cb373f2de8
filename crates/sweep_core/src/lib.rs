//! Parametric sweep engine for design-space exploration.
//!
//! A sweep expands integer dimension ranges into a grid of design points,
//! evaluates each point with a [`SimulationOracle`] under bounded
//! concurrency, and reassembles the outcomes into a grid-ordered [`Report`].
//! Persisting the report is left to a [`ReportSink`] chosen by the caller.

pub mod aggregator;
pub mod contract;
pub mod error;
pub mod grid;
pub mod oracle;
pub mod report;
pub mod scheduler;
pub mod sink;
pub mod sweep;

pub use aggregator::{aggregate, ResultAggregator};
pub use contract::{
    normalize_request, DimensionSpec, FailurePolicy, SweepConfig, SweepRequest,
};
pub use error::{AbortReason, CancelCause, SweepError};
pub use grid::{generate, Grid, ParameterPoint};
pub use oracle::{LoadProfile, OracleError, PerformanceRecord, SimulationOracle};
pub use report::{FailureRecord, Report, SimulationResult, SuccessRecord};
pub use scheduler::{
    CancellationToken, IndexedOutcome, SweepOutcome, SweepProgress, SweepScheduler,
};
pub use sink::{persist_all, ReportSink, SinkError};
pub use sweep::{run_sweep, SweepOptions};
