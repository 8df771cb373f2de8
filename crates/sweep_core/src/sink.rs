use std::error::Error;

use crate::report::Report;

#[derive(Debug, thiserror::Error)]
#[error("failed to persist report to {target}: {source}")]
pub struct SinkError {
    target: String,
    #[source]
    source: Box<dyn Error + Send + Sync>,
}

impl SinkError {
    pub fn new(target: impl Into<String>, source: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        Self {
            target: target.into(),
            source: source.into(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

/// Durable destination for a finished report.
///
/// The sweep engine never calls a sink itself; callers persist a report only
/// after [`run_sweep`](crate::run_sweep) returned it.
pub trait ReportSink {
    fn persist(&self, report: &Report) -> Result<(), SinkError>;
}

impl<S: ReportSink + ?Sized> ReportSink for &S {
    fn persist(&self, report: &Report) -> Result<(), SinkError> {
        (**self).persist(report)
    }
}

impl<S: ReportSink + ?Sized> ReportSink for Box<S> {
    fn persist(&self, report: &Report) -> Result<(), SinkError> {
        (**self).persist(report)
    }
}

/// Persists a report to every sink in turn, stopping at the first failure.
pub fn persist_all(report: &Report, sinks: &[&dyn ReportSink]) -> Result<(), SinkError> {
    for sink in sinks {
        sink.persist(report)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::contract::FailurePolicy;

    #[derive(Default)]
    struct MemorySink {
        persisted: RefCell<Vec<String>>,
    }

    impl ReportSink for MemorySink {
        fn persist(&self, report: &Report) -> Result<(), SinkError> {
            self.persisted.borrow_mut().push(report.fingerprint().to_string());
            Ok(())
        }
    }

    struct FailingSink;

    impl ReportSink for FailingSink {
        fn persist(&self, _report: &Report) -> Result<(), SinkError> {
            Err(SinkError::new("memory://failing", "disk full"))
        }
    }

    fn empty_report() -> Report {
        Report::new("f00d".to_string(), FailurePolicy::Tolerant, Vec::new(), Vec::new())
    }

    #[test]
    fn persist_all_stops_at_first_failure() {
        let first = MemorySink::default();
        let last = MemorySink::default();
        let error = persist_all(&empty_report(), &[&first, &FailingSink, &last])
            .expect_err("should fail");

        assert_eq!(error.target(), "memory://failing");
        assert_eq!(error.to_string(), "failed to persist report to memory://failing: disk full");
        assert_eq!(first.persisted.borrow().as_slice(), ["f00d".to_string()]);
        assert!(last.persisted.borrow().is_empty());
    }
}
