//! Hourly demand (and solar resource) tables.
//!
//! Files hold one value per hour in the first column, under a single header
//! line. Columns may be comma separated or whitespace separated; extra
//! columns are ignored.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use sweep_core::{LoadProfile, SweepError};

#[derive(Debug, thiserror::Error)]
pub enum LoadProfileError {
    #[error("failed to open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {source}")]
    Read {
        line: u64,
        #[source]
        source: csv::Error,
    },

    #[error("line {line}: '{value}' is not a number")]
    Parse { line: u64, value: String },

    #[error(transparent)]
    Invalid(#[from] SweepError),
}

pub fn from_path(path: impl AsRef<Path>) -> Result<LoadProfile, LoadProfileError> {
    let values = read_hourly_column_from_path(path)?;
    Ok(LoadProfile::new(values)?)
}

pub fn from_reader(reader: impl Read) -> Result<LoadProfile, LoadProfileError> {
    let values = read_hourly_column(reader)?;
    Ok(LoadProfile::new(values)?)
}

pub(crate) fn read_hourly_column_from_path(
    path: impl AsRef<Path>,
) -> Result<Vec<f64>, LoadProfileError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| LoadProfileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_hourly_column(file)
}

pub(crate) fn read_hourly_column(reader: impl Read) -> Result<Vec<f64>, LoadProfileError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut values = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|source| LoadProfileError::Read {
            line: source.position().map(|pos| pos.line()).unwrap_or_default(),
            source,
        })?;
        let line = record.position().map(|pos| pos.line()).unwrap_or_default();
        let field = record
            .get(0)
            .and_then(|field| field.split_whitespace().next())
            .unwrap_or_default();
        if field.is_empty() {
            continue;
        }
        let value = field.parse::<f64>().map_err(|_| LoadProfileError::Parse {
            line,
            value: field.to_string(),
        })?;
        values.push(value);
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_header_and_reads_first_column() {
        let load = from_reader("load_kw,label\n1.5,night\n 2.0 ,day\n\n3.25,day\n".as_bytes())
            .expect("load should parse");
        assert_eq!(load.values(), [1.5, 2.0, 3.25]);
    }

    #[test]
    fn reads_whitespace_separated_tables() {
        let load = from_reader("# kW\n0.8 0.1\n1.2\t0.3\n".as_bytes()).expect("load should parse");
        assert_eq!(load.values(), [0.8, 1.2]);
    }

    #[test]
    fn reports_line_of_unparseable_value() {
        let error = from_reader("kw\n1.0\nabc\n".as_bytes()).expect_err("should fail");
        match error {
            LoadProfileError::Parse { line, value } => {
                assert_eq!(line, 3);
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_header_only_and_negative_tables() {
        assert!(matches!(
            from_reader("kw\n".as_bytes()),
            Err(LoadProfileError::Invalid(_))
        ));
        assert!(matches!(
            from_reader("kw\n1.0\n-2.0\n".as_bytes()),
            Err(LoadProfileError::Invalid(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let error = from_path("/definitely/not/here.csv").expect_err("should fail");
        assert!(matches!(error, LoadProfileError::Io { .. }));
        assert!(error.to_string().contains("/definitely/not/here.csv"));
    }
}
