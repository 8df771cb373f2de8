use std::collections::{BTreeSet, HashSet};
use std::fs::File;
use std::path::Path;

use serde_json::Value;
use sweep_core::Report;

/// Column names every tabular export writes besides dimensions and constants.
pub(crate) const FIXED_COLUMNS: [&str; 6] = [
    "index",
    "status",
    "uptime_fraction",
    "uptime_percent",
    "uptime_hours",
    "reason",
];

const CONSTANT_PREFIX: &str = "const_";

/// A design constant and the column it is written under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ConstantColumn {
    pub key: String,
    pub header: String,
}

pub(crate) fn ensure_not_empty<T>(
    items: &[T],
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if items.is_empty() {
        return Err("No results to export".into());
    }

    Ok(())
}

pub(crate) fn create_output_file(
    path: impl AsRef<Path>,
) -> Result<File, Box<dyn std::error::Error + Send + Sync>> {
    Ok(File::create(path)?)
}

/// Sorted union of the design-constant names across all success records.
///
/// A constant whose name is already taken by a dimension or a fixed column
/// is written under `const_<name>`, so every header is unique.
pub(crate) fn constant_columns(report: &Report) -> Vec<ConstantColumn> {
    let keys: BTreeSet<String> = report
        .successes()
        .flat_map(|(_, record)| record.design_constants.keys().cloned())
        .collect();

    let mut taken: HashSet<String> = FIXED_COLUMNS
        .iter()
        .map(|name| name.to_string())
        .chain(report.dimension_names().iter().cloned())
        .chain(keys.iter().cloned())
        .collect();

    keys.into_iter()
        .map(|key| {
            let clashes = FIXED_COLUMNS.contains(&key.as_str())
                || report.dimension_names().contains(&key);
            let mut header = key.clone();
            if clashes {
                header = format!("{CONSTANT_PREFIX}{key}");
                while !taken.insert(header.clone()) {
                    header = format!("{CONSTANT_PREFIX}{header}");
                }
            }
            ConstantColumn { key, header }
        })
        .collect()
}

/// Text form of a constant for tabular outputs; strings are written unquoted.
pub(crate) fn constant_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweep_core::{
        FailurePolicy, ParameterPoint, PerformanceRecord, SimulationResult, SuccessRecord,
    };

    fn report_with(dimensions: &[&str], constants: &[&str]) -> Report {
        let point = ParameterPoint::from_pairs(dimensions.iter().map(|name| (*name, 1)));
        let mut performance = PerformanceRecord::new(1.0, 24);
        for name in constants {
            performance = performance.with_constant(*name, 1);
        }
        Report::new(
            "fp".to_string(),
            FailurePolicy::Tolerant,
            dimensions.iter().map(|name| name.to_string()).collect(),
            vec![SimulationResult::Success(SuccessRecord::from_performance(
                point,
                performance,
            ))],
        )
    }

    fn headers(report: &Report) -> Vec<String> {
        constant_columns(report)
            .into_iter()
            .map(|column| column.header)
            .collect()
    }

    #[test]
    fn test_constant_named_like_a_dimension_is_prefixed() {
        let report = report_with(&["strings", "inverters"], &["inverters", "system_capacity_kw"]);
        assert_eq!(headers(&report), vec!["const_inverters", "system_capacity_kw"]);
        assert_eq!(constant_columns(&report)[0].key, "inverters");
    }

    #[test]
    fn test_prefixed_header_never_reuses_an_existing_name() {
        let report = report_with(&["inverters"], &["inverters", "const_inverters", "status"]);
        assert_eq!(
            headers(&report),
            vec!["const_inverters", "const_const_inverters", "const_status"]
        );
    }

    #[test]
    fn test_constant_text_leaves_strings_unquoted() {
        assert_eq!(constant_text(&Value::from("LFP")), Some("LFP".to_string()));
        assert_eq!(constant_text(&Value::from(4)), Some("4".to_string()));
        assert_eq!(constant_text(&Value::Null), None);
    }
}
