#![allow(dead_code)]

pub mod oracles;

use sweep_core::{
    normalize_request, DimensionSpec, FailurePolicy, LoadProfile, SweepConfig, SweepRequest,
};

/// Flat one-day load profile; every stub oracle meets it in full.
pub fn flat_load() -> LoadProfile {
    LoadProfile::new(vec![1.5; 24]).expect("flat load should build")
}

pub fn design_config(
    modules: std::ops::RangeInclusive<i64>,
    strings: std::ops::RangeInclusive<i64>,
    max_concurrency: usize,
    failure_policy: FailurePolicy,
) -> SweepConfig {
    normalize_request(
        SweepRequest::new(vec![
            DimensionSpec::new("modules_per_string", modules),
            DimensionSpec::new("strings", strings),
        ])
        .with_max_concurrency(max_concurrency)
        .with_failure_policy(failure_policy),
    )
    .expect("design config should normalize")
}
