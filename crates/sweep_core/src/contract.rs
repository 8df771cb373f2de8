use std::collections::HashSet;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::SweepError;

pub const CONTRACT_SCHEMA_VERSION: &str = "v1";
pub const MAX_DIMENSION_VALUES: usize = 10_000;
pub const MAX_TOTAL_PARAMETER_POINTS: usize = 200_000;
pub const MAX_CONCURRENCY: usize = 1_024;
pub const DEFAULT_MAX_CONCURRENCY: usize = 16;

/// One named design variable swept over an inclusive integer range.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct DimensionSpec {
    pub name: String,
    pub start: i64,
    pub end: i64,
    #[serde(default = "default_step")]
    pub step: u32,
}

impl DimensionSpec {
    pub fn new(name: impl Into<String>, range: RangeInclusive<i64>) -> Self {
        Self {
            name: name.into(),
            start: *range.start(),
            end: *range.end(),
            step: default_step(),
        }
    }

    pub fn with_step(mut self, step: u32) -> Self {
        self.step = step;
        self
    }

    /// Number of values in the range; zero when `start > end` or `step == 0`.
    pub fn len(&self) -> usize {
        if self.step == 0 || self.start > self.end {
            return 0;
        }
        let span = i128::from(self.end) - i128::from(self.start);
        let count = span / i128::from(self.step) + 1;
        usize::try_from(count).unwrap_or(usize::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn values(&self) -> Vec<i64> {
        let step = i64::from(self.step);
        (0..self.len() as i64)
            .map(|offset| self.start + offset * step)
            .collect()
    }
}

pub fn default_step() -> u32 {
    1
}

pub fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

/// What happens when the oracle reports an infeasible design point.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Record a failure entry for the point and keep going.
    #[default]
    Tolerant,
    /// Abort the sweep on the first infeasible point.
    #[serde(alias = "fail_fast")]
    FailFast,
}

impl FailurePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tolerant => "tolerant",
            Self::FailFast => "fail-fast",
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailurePolicy {
    type Err = SweepError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "tolerant" => Ok(Self::Tolerant),
            "fail-fast" | "fail_fast" => Ok(Self::FailFast),
            other => Err(SweepError::configuration(format!(
                "unknown failure policy '{other}' (expected 'tolerant' or 'fail-fast')"
            ))),
        }
    }
}

/// Sweep definition as supplied by the caller, before validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SweepRequest {
    pub dimensions: Vec<DimensionSpec>,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl SweepRequest {
    pub fn new(dimensions: Vec<DimensionSpec>) -> Self {
        Self {
            dimensions,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            failure_policy: FailurePolicy::default(),
            timeout_ms: None,
        }
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }
}

/// Validated, immutable sweep configuration.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SweepConfig {
    dimensions: Vec<DimensionSpec>,
    total_points: usize,
    max_concurrency: usize,
    failure_policy: FailurePolicy,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout_ms: Option<u64>,
    #[serde(skip)]
    fingerprint: String,
}

impl SweepConfig {
    pub fn dimensions(&self) -> &[DimensionSpec] {
        &self.dimensions
    }

    pub fn total_points(&self) -> usize {
        self.total_points
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// SHA-256 over the result-determining part of the configuration
    /// (dimensions and failure policy).
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

#[derive(Serialize)]
struct FingerprintPayload<'a> {
    schema_version: &'a str,
    dimensions: &'a [DimensionSpec],
    failure_policy: FailurePolicy,
}

pub fn normalize_request(payload: SweepRequest) -> Result<SweepConfig, SweepError> {
    let dimensions: Vec<DimensionSpec> = payload
        .dimensions
        .into_iter()
        .map(|dimension| DimensionSpec {
            name: dimension.name.trim().to_string(),
            ..dimension
        })
        .collect();
    let total_points = validate_dimensions(&dimensions)?;

    if payload.max_concurrency == 0 {
        return Err(SweepError::configuration(
            "max_concurrency must be a positive integer",
        ));
    }

    if payload.max_concurrency > MAX_CONCURRENCY {
        return Err(SweepError::configuration(format!(
            "max_concurrency exceeds MAX_CONCURRENCY={MAX_CONCURRENCY}"
        )));
    }

    if let Some(0) = payload.timeout_ms {
        return Err(SweepError::configuration(
            "timeout_ms must be a positive integer",
        ));
    }

    let mut config = SweepConfig {
        dimensions,
        total_points,
        max_concurrency: payload.max_concurrency,
        failure_policy: payload.failure_policy,
        timeout_ms: payload.timeout_ms,
        fingerprint: String::new(),
    };
    config.fingerprint = config_fingerprint(&config);
    Ok(config)
}

/// Checks a dimension list and returns the size of its Cartesian product.
pub fn validate_dimensions(dimensions: &[DimensionSpec]) -> Result<usize, SweepError> {
    if dimensions.is_empty() {
        return Err(SweepError::configuration("dimensions cannot be empty"));
    }

    let mut seen = HashSet::with_capacity(dimensions.len());
    let mut total_points = 1usize;
    for dimension in dimensions {
        let name = dimension.name.trim();
        if name.is_empty() {
            return Err(SweepError::configuration(
                "dimension names must be non-empty strings",
            ));
        }
        if !seen.insert(name) {
            return Err(SweepError::configuration(format!(
                "Dimension '{name}' is declared more than once"
            )));
        }
        if dimension.step == 0 {
            return Err(SweepError::configuration(format!(
                "Dimension '{name}' must have a positive step"
            )));
        }
        if dimension.is_empty() {
            return Err(SweepError::configuration(format!(
                "Dimension '{name}' has an empty range {}..={}",
                dimension.start, dimension.end
            )));
        }
        if dimension.len() > MAX_DIMENSION_VALUES {
            return Err(SweepError::configuration(format!(
                "Dimension '{name}' exceeds MAX_DIMENSION_VALUES={MAX_DIMENSION_VALUES}"
            )));
        }
        total_points = total_points.saturating_mul(dimension.len());
        if total_points > MAX_TOTAL_PARAMETER_POINTS {
            return Err(SweepError::configuration(format!(
                "Parameter space is too large (>{MAX_TOTAL_PARAMETER_POINTS} points)"
            )));
        }
    }

    Ok(total_points)
}

pub fn config_fingerprint(config: &SweepConfig) -> String {
    let payload = FingerprintPayload {
        schema_version: CONTRACT_SCHEMA_VERSION,
        dimensions: &config.dimensions,
        failure_policy: config.failure_policy,
    };
    let mut hasher = Sha256::new();
    hasher.update(stable_contract_json(&payload));
    format!("{:x}", hasher.finalize())
}

pub fn stable_contract_json(value: impl Serialize) -> String {
    serde_json::to_string(&value).expect("serialization of contract value should not fail")
}
