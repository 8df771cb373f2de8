//! Example: residential PV + battery design sweep.
//!
//! This example demonstrates how to:
//! 1. Build a study programmatically (no files needed)
//! 2. Run the sweep with bounded concurrency and a progress bar
//! 3. Rank feasible designs by uptime
//! 4. Export the grid-ordered report to JSON and CSV
//!
//! Run with `RUST_LOG=info` to see the scheduler's structured events.

use pv_sweep::{
    rank_by_uptime, run_design_sweep, CsvReportSink, JsonReportSink, PvBatteryOracle,
    SolarResource, StudyConfig,
};
use sweep_core::{persist_all, CancellationToken, FailurePolicy, LoadProfile};

fn evening_peak_load() -> Result<LoadProfile, sweep_core::SweepError> {
    let daily_kw = [
        0.4, 0.4, 0.4, 0.4, 0.4, 0.5, 0.9, 1.1, 0.8, 0.6, 0.6, 0.7, //
        0.8, 0.7, 0.6, 0.6, 0.8, 1.2, 1.6, 1.8, 1.6, 1.2, 0.8, 0.5,
    ];
    LoadProfile::new((0..8_760).map(|hour| daily_kw[hour % 24]).collect())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("Starting residential design sweep...");

    let mut study = StudyConfig::default();
    study.sweep.max_concurrency = 8;
    study.sweep.failure_policy = FailurePolicy::Tolerant;
    let config = study.normalize()?;
    println!(
        "Sweeping {} designs (fingerprint {})",
        config.total_points(),
        &config.fingerprint()[..12]
    );

    let load = evening_peak_load()?;
    let solar = SolarResource::synthetic_clear_sky(
        study.system.latitude_deg,
        study.system.performance_ratio,
    );
    let oracle = PvBatteryOracle::new(study.system.clone(), solar);

    let report = run_design_sweep(&config, &load, &oracle, true, CancellationToken::new())?;
    println!(
        "Completed: {} feasible, {} infeasible",
        report.success_count(),
        report.failure_count()
    );

    println!("\n=== Top 5 Designs ===");
    for design in rank_by_uptime(&report).into_iter().take(5) {
        println!(
            "#{} {} -> {:.2}% uptime ({} h)",
            design.rank,
            design.point,
            design.uptime_fraction * 100.0,
            design.uptime_hours
        );
    }

    println!("\n=== Infeasible Designs ===");
    for (index, failure) in report.failures().take(3) {
        println!("[{index}] {}: {}", failure.point, failure.reason);
    }

    let json = JsonReportSink::new("parameter_sweep_results.json");
    let csv = CsvReportSink::new("parameter_sweep_results.csv");
    persist_all(&report, &[&json, &csv])?;
    println!("\nResults exported to parameter_sweep_results.json and parameter_sweep_results.csv");

    Ok(())
}
