use sweep_core::{Report, SimulationResult};

use super::writer_utils::{constant_columns, constant_text};

pub(crate) fn export_to_csv_impl(
    report: &Report,
    file: std::fs::File,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let constants = constant_columns(report);
    let mut wtr = csv::Writer::from_writer(file);

    let mut header = vec!["index".to_string(), "status".to_string()];
    header.extend(report.dimension_names().iter().cloned());
    header.extend(
        ["uptime_fraction", "uptime_percent", "uptime_hours"]
            .into_iter()
            .map(str::to_string),
    );
    header.extend(constants.iter().map(|column| column.header.clone()));
    header.push("reason".to_string());
    wtr.write_record(&header)?;

    for (index, record) in report.records().iter().enumerate() {
        let mut row = vec![index.to_string(), record.status().to_string()];
        row.extend(record.point().values().iter().map(i64::to_string));

        match record {
            SimulationResult::Success(success) => {
                row.push(success.uptime_fraction.to_string());
                row.push(format!("{:.4}", success.uptime_percent()));
                row.push(success.uptime_hours.to_string());
                row.extend(constants.iter().map(|column| {
                    success
                        .design_constants
                        .get(&column.key)
                        .and_then(constant_text)
                        .unwrap_or_default()
                }));
                row.push(String::new());
            }
            SimulationResult::Failure(failure) => {
                row.extend(std::iter::repeat(String::new()).take(3 + constants.len()));
                row.push(failure.reason.clone());
            }
        }
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::export::export_to_csv;
    use crate::export::test_reports::{inverter_sweep_report, mixed_report};
    use tempfile::NamedTempFile;

    #[test]
    fn test_csv_keeps_grid_order_and_blank_failure_metrics() {
        let file = NamedTempFile::new().unwrap();
        export_to_csv(&mixed_report(), file.path()).unwrap();

        let mut rdr = csv::Reader::from_path(file.path()).unwrap();
        let headers = rdr.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec![
                "index",
                "status",
                "modules_per_string",
                "strings",
                "uptime_fraction",
                "uptime_percent",
                "uptime_hours",
                "inverters",
                "system_capacity_kw",
                "reason",
            ]
        );

        let rows: Vec<csv::StringRecord> = rdr.records().map(Result::unwrap).collect();
        assert_eq!(rows.len(), 4);
        assert_eq!(&rows[0][0], "0");
        assert_eq!(&rows[0][5], "75.0000");
        assert_eq!(&rows[0][7], "4");
        assert_eq!(&rows[2][1], "failure");
        assert_eq!(&rows[2][2], "7");
        assert_eq!(&rows[2][4], "");
        assert!(rows[2][9].contains("MPPT window"));
    }

    #[test]
    fn test_csv_headers_stay_unique_when_sweeping_a_constant() {
        let file = NamedTempFile::new().unwrap();
        export_to_csv(&inverter_sweep_report(), file.path()).unwrap();

        let mut rdr = csv::Reader::from_path(file.path()).unwrap();
        let headers: Vec<String> = rdr.headers().unwrap().iter().map(str::to_string).collect();
        assert_eq!(headers.iter().filter(|name| *name == "inverters").count(), 1);
        let dimension = headers.iter().position(|name| name == "inverters").unwrap();
        let constant = headers.iter().position(|name| name == "const_inverters").unwrap();
        let chemistry = headers.iter().position(|name| name == "battery_chemistry").unwrap();

        let rows: Vec<csv::StringRecord> = rdr.records().map(Result::unwrap).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[1][dimension], "2");
        assert_eq!(&rows[1][constant], "2");
        assert_eq!(&rows[1][chemistry], "LFP");
    }
}
