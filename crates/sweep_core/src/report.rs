use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::contract::FailurePolicy;
use crate::grid::ParameterPoint;
use crate::oracle::PerformanceRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuccessRecord {
    pub point: ParameterPoint,
    pub uptime_fraction: f64,
    pub uptime_hours: u64,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub design_constants: BTreeMap<String, Value>,
}

impl SuccessRecord {
    pub fn from_performance(point: ParameterPoint, performance: PerformanceRecord) -> Self {
        Self {
            point,
            uptime_fraction: performance.uptime_fraction,
            uptime_hours: performance.uptime_hours,
            design_constants: performance.design_constants,
        }
    }

    pub fn uptime_percent(&self) -> f64 {
        self.uptime_fraction * 100.0
    }
}

/// Placeholder for a design the oracle rejected as infeasible.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureRecord {
    pub point: ParameterPoint,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SimulationResult {
    Success(SuccessRecord),
    Failure(FailureRecord),
}

impl SimulationResult {
    pub fn point(&self) -> &ParameterPoint {
        match self {
            Self::Success(record) => &record.point,
            Self::Failure(record) => &record.point,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn as_success(&self) -> Option<&SuccessRecord> {
        match self {
            Self::Success(record) => Some(record),
            Self::Failure(_) => None,
        }
    }

    pub fn as_failure(&self) -> Option<&FailureRecord> {
        match self {
            Self::Success(_) => None,
            Self::Failure(record) => Some(record),
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::Failure(_) => "failure",
        }
    }
}

/// Sweep results in grid order: `records()[i]` belongs to grid index `i`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    fingerprint: String,
    failure_policy: FailurePolicy,
    dimension_names: Vec<String>,
    records: Vec<SimulationResult>,
}

impl Report {
    pub fn new(
        fingerprint: String,
        failure_policy: FailurePolicy,
        dimension_names: Vec<String>,
        records: Vec<SimulationResult>,
    ) -> Self {
        Self {
            fingerprint,
            failure_policy,
            dimension_names,
            records,
        }
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    pub fn dimension_names(&self) -> &[String] {
        &self.dimension_names
    }

    pub fn records(&self) -> &[SimulationResult] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&SimulationResult> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn successes(&self) -> impl Iterator<Item = (usize, &SuccessRecord)> + '_ {
        self.records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| record.as_success().map(|success| (index, success)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (usize, &FailureRecord)> + '_ {
        self.records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| record.as_failure().map(|failure| (index, failure)))
    }

    pub fn success_count(&self) -> usize {
        self.successes().count()
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }
}
