use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use sweep_core::{
    CancellationToken, LoadProfile, OracleError, ParameterPoint, PerformanceRecord,
    SimulationOracle,
};

/// Meets every hour of the load, except for points listed as infeasible.
#[derive(Debug, Default)]
pub struct StubOracle {
    infeasible: HashSet<Vec<i64>>,
    calls: AtomicUsize,
}

impl StubOracle {
    pub fn with_infeasible(points: &[&[i64]]) -> Self {
        Self {
            infeasible: points.iter().map(|values| values.to_vec()).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SimulationOracle for StubOracle {
    fn evaluate(
        &self,
        point: &ParameterPoint,
        load: &LoadProfile,
    ) -> Result<PerformanceRecord, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.infeasible.contains(point.values()) {
            return Err(OracleError::infeasible(format!(
                "{point} puts the string voltage outside the MPPT window"
            )));
        }
        Ok(PerformanceRecord::new(1.0, load.len() as u64).with_constant("inverters", 4))
    }
}

/// Tracks how many evaluations overlap in time.
#[derive(Debug)]
pub struct InstrumentedOracle {
    hold: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl InstrumentedOracle {
    pub fn new(hold: Duration) -> Self {
        Self {
            hold,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SimulationOracle for InstrumentedOracle {
    fn evaluate(
        &self,
        point: &ParameterPoint,
        load: &LoadProfile,
    ) -> Result<PerformanceRecord, OracleError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.hold);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let modules = point.get("modules_per_string").unwrap_or_default();
        let fraction = (modules as f64 / 10.0).min(1.0);
        Ok(PerformanceRecord::new(
            fraction,
            (fraction * load.len() as f64).round() as u64,
        ))
    }
}

/// Sleeps on every call; used to trip sweep timeouts.
#[derive(Debug)]
pub struct SlowOracle {
    pub delay: Duration,
}

impl SimulationOracle for SlowOracle {
    fn evaluate(
        &self,
        _point: &ParameterPoint,
        load: &LoadProfile,
    ) -> Result<PerformanceRecord, OracleError> {
        thread::sleep(self.delay);
        Ok(PerformanceRecord::new(1.0, load.len() as u64))
    }
}

/// Requests cancellation once it has been called `after` times.
#[derive(Debug)]
pub struct CancellingOracle {
    token: CancellationToken,
    after: usize,
    calls: AtomicUsize,
}

impl CancellingOracle {
    pub fn new(token: CancellationToken, after: usize) -> Self {
        Self {
            token,
            after,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SimulationOracle for CancellingOracle {
    fn evaluate(
        &self,
        _point: &ParameterPoint,
        load: &LoadProfile,
    ) -> Result<PerformanceRecord, OracleError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call >= self.after {
            self.token.cancel();
        }
        thread::sleep(Duration::from_millis(2));
        Ok(PerformanceRecord::new(1.0, load.len() as u64))
    }
}

/// Panics on one specific grid point.
#[derive(Debug)]
pub struct PanickingOracle {
    pub on: Vec<i64>,
}

impl SimulationOracle for PanickingOracle {
    fn evaluate(
        &self,
        point: &ParameterPoint,
        load: &LoadProfile,
    ) -> Result<PerformanceRecord, OracleError> {
        if point.values() == self.on.as_slice() {
            panic!("battery model diverged at {point}");
        }
        Ok(PerformanceRecord::new(1.0, load.len() as u64))
    }
}
