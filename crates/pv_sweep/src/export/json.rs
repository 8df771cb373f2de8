use std::io::BufWriter;

use serde::Serialize;
use sweep_core::{FailurePolicy, Report, SimulationResult};

#[derive(Serialize)]
struct JsonReport<'a> {
    fingerprint: &'a str,
    failure_policy: FailurePolicy,
    dimension_names: &'a [String],
    total_points: usize,
    successes: usize,
    failures: usize,
    records: &'a [SimulationResult],
}

pub(crate) fn export_to_json_impl(
    report: &Report,
    file: std::fs::File,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let payload = JsonReport {
        fingerprint: report.fingerprint(),
        failure_policy: report.failure_policy(),
        dimension_names: report.dimension_names(),
        total_points: report.len(),
        successes: report.success_count(),
        failures: report.failure_count(),
        records: report.records(),
    };
    serde_json::to_writer_pretty(BufWriter::new(file), &payload)?;
    Ok(())
}
