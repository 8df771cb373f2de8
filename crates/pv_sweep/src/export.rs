//! Report sinks and downstream analysis.
//!
//! Every sink writes one file per report. Rows follow grid order, and
//! failure entries keep their grid position with empty metric fields.

use std::path::{Path, PathBuf};

use sweep_core::{Report, ReportSink, SinkError};

#[path = "export/csv.rs"]
mod csv;
#[path = "export/json.rs"]
mod json;
#[path = "export/parquet.rs"]
mod parquet;
#[path = "export/ranking.rs"]
mod ranking;
#[path = "export/writer_utils.rs"]
mod writer_utils;

pub use ranking::{best_design, rank_by_uptime, RankedDesign};

pub type ExportResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Export a report as pretty-printed JSON: a summary envelope around the
/// grid-ordered record list.
pub fn export_to_json(report: &Report, path: impl AsRef<Path>) -> ExportResult {
    writer_utils::ensure_not_empty(report.records())?;
    let file = writer_utils::create_output_file(path)?;
    json::export_to_json_impl(report, file)
}

/// Export a report as CSV with one row per grid point.
///
/// Columns: `index`, `status`, one column per dimension, the uptime metrics,
/// one column per echoed design constant, and `reason` for failures.
pub fn export_to_csv(report: &Report, path: impl AsRef<Path>) -> ExportResult {
    writer_utils::ensure_not_empty(report.records())?;
    let file = writer_utils::create_output_file(path)?;
    csv::export_to_csv_impl(report, file)
}

/// Export a report as a single Parquet row group.
pub fn export_to_parquet(report: &Report, path: impl AsRef<Path>) -> ExportResult {
    writer_utils::ensure_not_empty(report.records())?;
    let file = writer_utils::create_output_file(path)?;
    parquet::export_to_parquet_impl(report, file)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Csv,
    Parquet,
}

impl ReportFormat {
    /// Picks a format from the file extension, case-insensitively.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let extension = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            "parquet" => Some(Self::Parquet),
            _ => None,
        }
    }

    pub fn sink(self, path: impl Into<PathBuf>) -> Box<dyn ReportSink> {
        let path = path.into();
        match self {
            Self::Json => Box::new(JsonReportSink::new(path)),
            Self::Csv => Box::new(CsvReportSink::new(path)),
            Self::Parquet => Box::new(ParquetReportSink::new(path)),
        }
    }
}

macro_rules! file_sink {
    ($name:ident, $export:path) => {
        #[derive(Debug, Clone)]
        pub struct $name {
            path: PathBuf,
        }

        impl $name {
            pub fn new(path: impl Into<PathBuf>) -> Self {
                Self { path: path.into() }
            }

            pub fn path(&self) -> &Path {
                &self.path
            }
        }

        impl ReportSink for $name {
            fn persist(&self, report: &Report) -> Result<(), SinkError> {
                $export(report, &self.path)
                    .map_err(|error| SinkError::new(self.path.display().to_string(), error))
            }
        }
    };
}

file_sink!(JsonReportSink, export_to_json);
file_sink!(CsvReportSink, export_to_csv);
file_sink!(ParquetReportSink, export_to_parquet);
