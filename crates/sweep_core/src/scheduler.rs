//! Bounded-concurrency evaluation of a grid against a simulation oracle.
//!
//! A dedicated rayon pool sized to `min(max_concurrency, grid.len())` runs
//! one pull loop per thread. Workers claim the next grid index from a shared
//! cursor, so indices are started in grid order and at most
//! `max_concurrency` oracle calls are ever in flight. Outcomes travel over a
//! channel to the calling thread, which hands each one to the consumer.
//!
//! The pool is scoped to [`SweepScheduler::run`]: no worker outlives the call.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::contract::{FailurePolicy, SweepConfig};
use crate::error::{AbortReason, CancelCause, SweepError};
use crate::grid::{Grid, ParameterPoint};
use crate::oracle::{LoadProfile, OracleError, SimulationOracle};
use crate::report::{FailureRecord, SuccessRecord};

/// Upper bound on how long the collector blocks before re-checking
/// cancellation and the deadline.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Cooperative cancellation handle shared between a caller and a sweep.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Classified result of one oracle invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum SweepOutcome {
    Success(SuccessRecord),
    Failure(FailureRecord),
    Aborted {
        point: ParameterPoint,
        reason: AbortReason,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexedOutcome {
    pub index: usize,
    pub outcome: SweepOutcome,
}

impl IndexedOutcome {
    fn abort_error(&self) -> Option<SweepError> {
        match &self.outcome {
            SweepOutcome::Aborted { point, reason } => Some(SweepError::Aborted {
                index: self.index,
                point: point.clone(),
                reason: reason.clone(),
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepProgress {
    pub completed: usize,
    pub total: usize,
    pub failures: usize,
}

#[derive(Debug, Clone)]
pub struct SweepScheduler {
    max_concurrency: usize,
    failure_policy: FailurePolicy,
    timeout: Option<Duration>,
    cancellation: CancellationToken,
}

impl SweepScheduler {
    pub fn new(max_concurrency: usize, failure_policy: FailurePolicy) -> Self {
        Self {
            max_concurrency,
            failure_policy,
            timeout: None,
            cancellation: CancellationToken::default(),
        }
    }

    pub fn from_config(config: &SweepConfig) -> Self {
        Self::new(config.max_concurrency(), config.failure_policy()).with_timeout(config.timeout())
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Evaluates every grid point and hands each outcome to `on_outcome`
    /// exactly once, in completion order.
    ///
    /// Returns the number of delivered outcomes. Stops early with
    /// [`SweepError::Aborted`] after delivering an abort outcome, with
    /// [`SweepError::Cancelled`] on cancellation or timeout, or with whatever
    /// error `on_outcome` returns. Oracle calls already in flight when the
    /// sweep stops run to completion before this returns; no new ones start.
    pub fn run<O>(
        &self,
        grid: &Grid,
        load: &LoadProfile,
        oracle: &O,
        on_outcome: &mut dyn FnMut(IndexedOutcome) -> Result<(), SweepError>,
    ) -> Result<usize, SweepError>
    where
        O: SimulationOracle + ?Sized,
    {
        if self.max_concurrency == 0 {
            return Err(SweepError::configuration(
                "max_concurrency must be a positive integer",
            ));
        }

        let total = grid.len();
        let workers = self.max_concurrency.min(total).max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("sweep-worker-{index}"))
            .build()
            .map_err(|error| SweepError::WorkerPool {
                detail: error.to_string(),
            })?;

        info!(
            component = "sweep_scheduler",
            total_points = total,
            workers,
            failure_policy = %self.failure_policy,
            timeout_ms = self.timeout.map(|timeout| timeout.as_millis() as u64),
            "sweep_started"
        );

        let started_at = Instant::now();
        let cursor = AtomicUsize::new(0);
        let stop = AtomicBool::new(false);
        let worker = Worker {
            grid,
            load,
            oracle,
            failure_policy: self.failure_policy,
            cursor: &cursor,
            stop: &stop,
            cancellation: &self.cancellation,
        };
        let (tx, rx) = mpsc::channel::<IndexedOutcome>();

        let collected = pool.in_place_scope(|scope| {
            for _ in 0..workers {
                let tx = tx.clone();
                let worker = &worker;
                scope.spawn(move |_| worker.pull_loop(tx));
            }
            drop(tx);

            let collected = self.collect(&rx, total, started_at, on_outcome);
            if collected.is_err() {
                stop.store(true, Ordering::SeqCst);
            }
            collected
        });

        let duration_ms = started_at.elapsed().as_millis() as u64;
        match &collected {
            Ok(completed) => {
                let points_per_second = if duration_ms == 0 {
                    *completed as f64
                } else {
                    *completed as f64 / (duration_ms as f64 / 1_000.0)
                };
                info!(
                    component = "sweep_scheduler",
                    completed = *completed,
                    duration_ms,
                    points_per_second,
                    "sweep_completed"
                );
            }
            Err(SweepError::Aborted { index, point, reason }) => error!(
                component = "sweep_scheduler",
                index = *index,
                point = %point,
                reason = %reason,
                duration_ms,
                "sweep_aborted"
            ),
            Err(SweepError::Cancelled {
                cause, completed, ..
            }) => warn!(
                component = "sweep_scheduler",
                cause = %cause,
                completed = *completed,
                duration_ms,
                "sweep_cancelled"
            ),
            Err(other) => error!(
                component = "sweep_scheduler",
                error = %other,
                duration_ms,
                "sweep_failed"
            ),
        }

        collected
    }

    fn collect(
        &self,
        rx: &Receiver<IndexedOutcome>,
        total: usize,
        started_at: Instant,
        on_outcome: &mut dyn FnMut(IndexedOutcome) -> Result<(), SweepError>,
    ) -> Result<usize, SweepError> {
        let mut completed = 0usize;
        while completed < total {
            if self.cancellation.is_cancelled() {
                return Err(cancelled(CancelCause::Requested, completed, total));
            }

            let wait = match self.timeout {
                Some(timeout) => {
                    let elapsed = started_at.elapsed();
                    if elapsed >= timeout {
                        return Err(cancelled(CancelCause::Timeout(timeout), completed, total));
                    }
                    POLL_INTERVAL.min(timeout - elapsed)
                }
                None => POLL_INTERVAL,
            };

            match rx.recv_timeout(wait) {
                Ok(delivered) => {
                    completed += 1;
                    let abort = delivered.abort_error();
                    on_outcome(delivered)?;
                    if let Some(abort) = abort {
                        return Err(abort);
                    }
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        if completed < total {
            if self.cancellation.is_cancelled() {
                return Err(cancelled(CancelCause::Requested, completed, total));
            }
            return Err(SweepError::Incomplete {
                received: completed,
                expected: total,
            });
        }
        Ok(completed)
    }

}

fn cancelled(cause: CancelCause, completed: usize, total: usize) -> SweepError {
    SweepError::Cancelled {
        cause,
        completed,
        total,
    }
}

struct Worker<'a, O: ?Sized> {
    grid: &'a Grid,
    load: &'a LoadProfile,
    oracle: &'a O,
    failure_policy: FailurePolicy,
    cursor: &'a AtomicUsize,
    stop: &'a AtomicBool,
    cancellation: &'a CancellationToken,
}

impl<O> Worker<'_, O>
where
    O: SimulationOracle + ?Sized,
{
    fn pull_loop(&self, tx: Sender<IndexedOutcome>) {
        loop {
            if self.stop.load(Ordering::SeqCst) || self.cancellation.is_cancelled() {
                break;
            }
            let index = self.cursor.fetch_add(1, Ordering::SeqCst);
            let Some(point) = self.grid.get(index) else {
                break;
            };

            let outcome = self.evaluate(point);
            if matches!(outcome, SweepOutcome::Aborted { .. }) {
                self.stop.store(true, Ordering::SeqCst);
            }
            if tx.send(IndexedOutcome { index, outcome }).is_err() {
                break;
            }
        }
    }

    fn evaluate(&self, point: &ParameterPoint) -> SweepOutcome {
        let evaluated =
            panic::catch_unwind(AssertUnwindSafe(|| self.oracle.evaluate(point, self.load)));

        match evaluated {
            Ok(Ok(performance)) => {
                debug!(component = "sweep_scheduler", point = %point, "point_evaluated");
                SweepOutcome::Success(SuccessRecord::from_performance(point.clone(), performance))
            }
            Ok(Err(OracleError::Infeasible { reason })) => match self.failure_policy {
                FailurePolicy::Tolerant => {
                    warn!(
                        component = "sweep_scheduler",
                        point = %point,
                        reason = %reason,
                        "point_infeasible"
                    );
                    SweepOutcome::Failure(FailureRecord {
                        point: point.clone(),
                        reason,
                    })
                }
                FailurePolicy::FailFast => SweepOutcome::Aborted {
                    point: point.clone(),
                    reason: AbortReason::Infeasible(reason),
                },
            },
            Ok(Err(OracleError::Fault { message })) => SweepOutcome::Aborted {
                point: point.clone(),
                reason: AbortReason::OracleFault(message),
            },
            Err(payload) => SweepOutcome::Aborted {
                point: point.clone(),
                reason: AbortReason::OracleFault(format!(
                    "oracle panicked: {}",
                    panic_message(payload.as_ref())
                )),
            },
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
