//! Solar-plus-battery design sweeps built on `sweep_core`.
//!
//! This crate supplies the domain pieces around the generic sweep engine: an
//! hourly load-profile reader, a reference PV + battery oracle, report sinks
//! for JSON, CSV and Parquet, and a progress-reporting runner used by the
//! `pv_sweep` binary.
//!
//! # Quick Start
//!
//! ```no_run
//! use pv_sweep::{load_profile, rank_by_uptime, run_design_sweep, JsonReportSink, StudyConfig};
//! use pv_sweep::{PvBatteryOracle, SolarResource};
//! use sweep_core::{CancellationToken, ReportSink};
//!
//! let study = StudyConfig::default();
//! let config = study.normalize().unwrap();
//! let load = load_profile::from_path("load.csv").unwrap();
//! let solar = SolarResource::synthetic_clear_sky(5.6, 0.8);
//! let oracle = PvBatteryOracle::new(study.system.clone(), solar);
//!
//! let report = run_design_sweep(&config, &load, &oracle, true, CancellationToken::new()).unwrap();
//! JsonReportSink::new("ghana_model.json").persist(&report).unwrap();
//! println!("best: {:?}", rank_by_uptime(&report).first());
//! ```

pub mod config;
pub mod export;
pub mod load_profile;
pub mod pv_model;
pub mod runner;

pub use config::{StudyConfig, StudyConfigError};
pub use export::{
    best_design, export_to_csv, export_to_json, export_to_parquet, rank_by_uptime,
    CsvReportSink, JsonReportSink, ParquetReportSink, RankedDesign, ReportFormat,
};
pub use load_profile::LoadProfileError;
pub use pv_model::{PvBatteryOracle, PvBatterySystem, SolarResource};
pub use runner::{run_design_sweep, run_study, StudyRunError};
