use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::SweepError;
use crate::grid::ParameterPoint;

/// Hourly electrical demand in kWh, one value per hour of the reference year.
///
/// Loaded once per sweep and shared read-only by every oracle invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadProfile {
    values: Vec<f64>,
}

impl LoadProfile {
    pub fn new(values: Vec<f64>) -> Result<Self, SweepError> {
        if values.is_empty() {
            return Err(SweepError::configuration("load profile cannot be empty"));
        }
        if let Some(hour) = values
            .iter()
            .position(|value| !value.is_finite() || *value < 0.0)
        {
            return Err(SweepError::configuration(format!(
                "load profile hour {hour} must be a finite, non-negative kWh value (got {})",
                values[hour]
            )));
        }
        Ok(Self { values })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    pub fn peak(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }
}

/// Performance of one feasible design, as reported by the oracle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceRecord {
    /// Fraction of analyzed hours in which demand was fully met, in `[0, 1]`.
    pub uptime_fraction: f64,
    pub uptime_hours: u64,
    /// Fixed or derived design parameters echoed back for the report.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub design_constants: BTreeMap<String, Value>,
}

impl PerformanceRecord {
    pub fn new(uptime_fraction: f64, uptime_hours: u64) -> Self {
        Self {
            uptime_fraction,
            uptime_hours,
            design_constants: BTreeMap::new(),
        }
    }

    pub fn with_constant(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.design_constants.insert(name.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    /// The design violates a physical constraint and cannot be simulated.
    #[error("infeasible design: {reason}")]
    Infeasible { reason: String },
    /// Anything else: bad inputs, a bug, an exhausted resource.
    #[error("oracle fault: {message}")]
    Fault { message: String },
}

impl OracleError {
    pub fn infeasible(reason: impl Into<String>) -> Self {
        Self::Infeasible {
            reason: reason.into(),
        }
    }

    pub fn fault(message: impl Into<String>) -> Self {
        Self::Fault {
            message: message.into(),
        }
    }
}

/// Evaluates one design point against the shared load profile.
///
/// Implementations must be pure with respect to their inputs and safe to
/// call from several worker threads at once.
pub trait SimulationOracle: Sync {
    fn evaluate(
        &self,
        point: &ParameterPoint,
        load: &LoadProfile,
    ) -> Result<PerformanceRecord, OracleError>;
}

impl<F> SimulationOracle for F
where
    F: Fn(&ParameterPoint, &LoadProfile) -> Result<PerformanceRecord, OracleError> + Sync,
{
    fn evaluate(
        &self,
        point: &ParameterPoint,
        load: &LoadProfile,
    ) -> Result<PerformanceRecord, OracleError> {
        self(point, load)
    }
}
