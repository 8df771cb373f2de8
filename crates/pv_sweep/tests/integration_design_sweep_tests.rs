use std::path::PathBuf;

use pv_sweep::{best_design, run_study, ReportFormat, StudyConfig, StudyRunError};
use sweep_core::{
    AbortReason, CancellationToken, DimensionSpec, FailurePolicy, ReportSink, SweepError,
};

fn residential_study() -> StudyConfig {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("studies/residential.toml");
    let mut study = StudyConfig::from_path(path).expect("bundled study should load");
    study.system.analysis_years = 2;
    study
}

#[test]
fn residential_study_marks_seven_module_strings_infeasible() {
    let study = residential_study();
    let report = run_study(&study, false, CancellationToken::new()).expect("study should run");

    assert_eq!(report.len(), 66);
    assert_eq!(report.failure_count(), 11);
    assert!(report
        .failures()
        .all(|(_, failure)| failure.point.get("modules_per_string") == Some(7)));
    assert_eq!(
        report.failures().map(|(index, _)| index).collect::<Vec<_>>(),
        (55..66).collect::<Vec<_>>()
    );
    assert_eq!(
        report.get(0).map(|record| record.point().values().to_vec()),
        Some(vec![2, 4])
    );
}

#[test]
fn more_strings_never_reduce_uptime() {
    let study = residential_study();
    let report = run_study(&study, false, CancellationToken::new()).expect("study should run");

    for modules in 2..=6 {
        let uptimes: Vec<f64> = report
            .successes()
            .filter(|(_, record)| record.point.get("modules_per_string") == Some(modules))
            .map(|(_, record)| record.uptime_fraction)
            .collect();
        assert_eq!(uptimes.len(), 11);
        assert!(
            uptimes.windows(2).all(|pair| pair[0] <= pair[1]),
            "uptime dropped for {modules} modules per string: {uptimes:?}"
        );
    }

    let best = best_design(&report).expect("some design should be feasible");
    assert!(best.uptime_fraction > 0.0);
}

#[test]
fn fail_fast_study_aborts_at_first_infeasible_design() {
    let mut study = residential_study();
    study.sweep.failure_policy = FailurePolicy::FailFast;
    study.sweep.max_concurrency = 1;

    let error = run_study(&study, false, CancellationToken::new()).expect_err("should abort");
    match error {
        StudyRunError::Sweep(SweepError::Aborted {
            index,
            reason: AbortReason::Infeasible(_),
            ..
        }) => assert_eq!(index, 55),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn concurrency_does_not_change_the_report() {
    let mut serial = residential_study();
    serial.sweep.max_concurrency = 1;
    let mut parallel = residential_study();
    parallel.sweep.max_concurrency = 12;

    let first = run_study(&serial, false, CancellationToken::new()).expect("serial study");
    let second = run_study(&parallel, false, CancellationToken::new()).expect("parallel study");
    assert_eq!(first, second);
}

#[test]
fn report_persists_in_every_format() {
    let mut study = residential_study();
    study.sweep.dimensions[1].end = 5;
    let report = run_study(&study, false, CancellationToken::new()).expect("study should run");

    let dir = tempfile::tempdir().expect("temp dir");
    for name in ["designs.json", "designs.csv", "designs.parquet"] {
        let path = dir.path().join(name);
        let format = ReportFormat::from_path(&path).expect("known extension");
        format
            .sink(path.clone())
            .persist(&report)
            .expect("report should persist");
        let size = std::fs::metadata(&path).expect("file should exist").len();
        assert!(size > 0, "{name} is empty");
    }
}

#[test]
fn sweeping_inverters_exports_one_column_per_name() {
    let mut study = residential_study();
    study.sweep.dimensions = vec![
        DimensionSpec::new("modules_per_string", 3..=3),
        DimensionSpec::new("strings", 4..=4),
        DimensionSpec::new("inverters", 1..=2),
    ];
    let report = run_study(&study, false, CancellationToken::new()).expect("study should run");
    assert_eq!(report.success_count(), 2);

    let dir = tempfile::tempdir().expect("temp dir");
    let csv_path = dir.path().join("designs.csv");
    ReportFormat::Csv
        .sink(csv_path.clone())
        .persist(&report)
        .expect("csv should persist");
    let mut reader = csv::Reader::from_path(&csv_path).expect("csv should open");
    let headers = reader.headers().expect("csv headers").clone();
    let unique: std::collections::HashSet<_> = headers.iter().collect();
    assert_eq!(unique.len(), headers.len(), "duplicate column in {headers:?}");
    assert!(headers.iter().any(|name| name == "inverters"));
    assert!(headers.iter().any(|name| name == "const_inverters"));

    let parquet_path = dir.path().join("designs.parquet");
    ReportFormat::Parquet
        .sink(parquet_path)
        .persist(&report)
        .expect("parquet should persist");
}

#[test]
fn missing_load_file_is_a_setup_error() {
    let mut study = residential_study();
    study.load_profile = Some(PathBuf::from("/no/such/load.csv"));

    let error = run_study(&study, false, CancellationToken::new()).expect_err("should fail");
    assert!(error.is_setup());
}
