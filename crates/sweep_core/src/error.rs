use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::grid::ParameterPoint;

/// Every way a sweep can end without producing a [`Report`](crate::Report).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SweepError {
    /// Bad grid or sweep definition, raised before any point is evaluated.
    #[error("configuration error: {detail}")]
    Configuration { detail: String },

    /// A point ended the sweep: an infeasible design under the fail-fast
    /// policy, or an oracle fault under either policy.
    #[error("sweep aborted at grid index {index} {point}: {reason}")]
    Aborted {
        index: usize,
        point: ParameterPoint,
        reason: AbortReason,
    },

    /// The caller cancelled the sweep or its timeout expired. Partial
    /// results are discarded.
    #[error("sweep cancelled after {completed} of {total} points: {cause}")]
    Cancelled {
        cause: CancelCause,
        completed: usize,
        total: usize,
    },

    /// The result stream closed before every grid index was delivered.
    #[error("result stream ended with {received} of {expected} points")]
    Incomplete { received: usize, expected: usize },

    /// A delivered result did not fit the grid (unknown or repeated index).
    #[error("result protocol violation: {detail}")]
    Protocol { detail: String },

    #[error("worker pool could not be built: {detail}")]
    WorkerPool { detail: String },
}

impl SweepError {
    pub fn configuration(detail: impl Into<String>) -> Self {
        Self::Configuration {
            detail: detail.into(),
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}

/// Why a single point aborted the whole sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum AbortReason {
    /// Design-constraint violation reported by the oracle (fail-fast only).
    Infeasible(String),
    /// Unexpected oracle error or panic. Fatal regardless of policy.
    OracleFault(String),
}

impl AbortReason {
    pub fn message(&self) -> &str {
        match self {
            Self::Infeasible(message) | Self::OracleFault(message) => message,
        }
    }
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Infeasible(message) => write!(f, "infeasible design: {message}"),
            Self::OracleFault(message) => write!(f, "oracle fault: {message}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelCause {
    Requested,
    Timeout(Duration),
}

impl fmt::Display for CancelCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requested => f.write_str("cancellation requested"),
            Self::Timeout(timeout) => write!(f, "timed out after {} ms", timeout.as_millis()),
        }
    }
}
