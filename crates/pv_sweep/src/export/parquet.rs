use std::sync::Arc;

use arrow::array::{
    ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray, UInt64Array,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use serde_json::Value;
use sweep_core::Report;

use super::writer_utils::{constant_columns, constant_text, ConstantColumn};

pub(crate) fn export_to_parquet_impl(
    report: &Report,
    file: std::fs::File,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let batch = build_record_batch(report)?;
    let props = WriterProperties::builder().build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    Ok(())
}

/// A constant column paired with the Arrow type its values fit.
struct TypedConstant {
    column: ConstantColumn,
    data_type: DataType,
}

fn build_record_batch(report: &Report) -> Result<RecordBatch, arrow::error::ArrowError> {
    let constants: Vec<TypedConstant> = constant_columns(report)
        .into_iter()
        .map(|column| TypedConstant {
            data_type: constant_data_type(report, &column.key),
            column,
        })
        .collect();
    let schema = Arc::new(parquet_schema(report.dimension_names(), &constants));
    let arrays = build_arrays(report, &constants);

    RecordBatch::try_new(schema, arrays)
}

/// Float64 when every present value is a number, Boolean when every one is a
/// bool, Utf8 otherwise.
fn constant_data_type(report: &Report, key: &str) -> DataType {
    let values: Vec<&Value> = report
        .successes()
        .filter_map(|(_, record)| record.design_constants.get(key))
        .filter(|value| !value.is_null())
        .collect();

    if values.iter().all(|value| value.is_number()) {
        DataType::Float64
    } else if values.iter().all(|value| value.is_boolean()) {
        DataType::Boolean
    } else {
        DataType::Utf8
    }
}

fn parquet_schema(dimension_names: &[String], constants: &[TypedConstant]) -> Schema {
    let mut fields = vec![
        Field::new("index", DataType::UInt64, false),
        Field::new("status", DataType::Utf8, false),
    ];
    fields.extend(
        dimension_names
            .iter()
            .map(|name| Field::new(name, DataType::Int64, false)),
    );
    fields.push(Field::new("uptime_fraction", DataType::Float64, true));
    fields.push(Field::new("uptime_hours", DataType::UInt64, true));
    fields.extend(constants.iter().map(|constant| {
        Field::new(&constant.column.header, constant.data_type.clone(), true)
    }));
    fields.push(Field::new("reason", DataType::Utf8, true));
    Schema::new(fields)
}

fn build_arrays(report: &Report, constants: &[TypedConstant]) -> Vec<ArrayRef> {
    let records = report.records();
    let mut arrays: Vec<ArrayRef> = vec![
        Arc::new(UInt64Array::from(
            (0..records.len() as u64).collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from(
            records.iter().map(|r| r.status()).collect::<Vec<_>>(),
        )),
    ];

    for slot in 0..report.dimension_names().len() {
        arrays.push(Arc::new(Int64Array::from(
            records
                .iter()
                .map(|r| r.point().values()[slot])
                .collect::<Vec<_>>(),
        )));
    }

    arrays.push(Arc::new(Float64Array::from(
        records
            .iter()
            .map(|r| r.as_success().map(|s| s.uptime_fraction))
            .collect::<Vec<_>>(),
    )));
    arrays.push(Arc::new(UInt64Array::from(
        records
            .iter()
            .map(|r| r.as_success().map(|s| s.uptime_hours))
            .collect::<Vec<_>>(),
    )));

    for constant in constants {
        let cells: Vec<Option<&Value>> = records
            .iter()
            .map(|r| {
                r.as_success()
                    .and_then(|s| s.design_constants.get(&constant.column.key))
            })
            .collect();
        let array: ArrayRef = match constant.data_type {
            DataType::Float64 => Arc::new(Float64Array::from(
                cells
                    .iter()
                    .map(|cell| cell.and_then(Value::as_f64))
                    .collect::<Vec<_>>(),
            )),
            DataType::Boolean => Arc::new(BooleanArray::from(
                cells
                    .iter()
                    .map(|cell| cell.and_then(Value::as_bool))
                    .collect::<Vec<_>>(),
            )),
            _ => Arc::new(StringArray::from(
                cells
                    .iter()
                    .map(|cell| cell.and_then(constant_text))
                    .collect::<Vec<_>>(),
            )),
        };
        arrays.push(array);
    }

    arrays.push(Arc::new(StringArray::from(
        records
            .iter()
            .map(|r| r.as_failure().map(|f| f.reason.as_str()))
            .collect::<Vec<_>>(),
    )));

    arrays
}

#[cfg(test)]
mod tests {
    use std::fs::File;

    use arrow::array::{Array, BooleanArray, Float64Array, Int64Array, StringArray};
    use arrow::datatypes::DataType;
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use tempfile::NamedTempFile;

    use crate::export::export_to_parquet;
    use crate::export::test_reports::{inverter_sweep_report, mixed_report};

    fn read_back(path: &std::path::Path) -> RecordBatch {
        let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(path).unwrap())
            .unwrap()
            .build()
            .unwrap();
        let mut batches: Vec<_> = reader.map(Result::unwrap).collect();
        assert_eq!(batches.len(), 1);
        batches.remove(0)
    }

    #[test]
    fn test_parquet_round_trips_schema_and_nulls() {
        let file = NamedTempFile::new().unwrap();
        export_to_parquet(&mixed_report(), file.path()).unwrap();

        let batch = read_back(file.path());
        assert_eq!(batch.num_rows(), 4);

        let schema = batch.schema();
        let names: Vec<_> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(
            names,
            vec![
                "index",
                "status",
                "modules_per_string",
                "strings",
                "uptime_fraction",
                "uptime_hours",
                "inverters",
                "system_capacity_kw",
                "reason",
            ]
        );

        let uptime = batch
            .column(4)
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        assert_eq!(uptime.value(1), 0.9);
        assert!(uptime.is_null(2));

        let reason = batch
            .column(8)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert!(reason.is_null(0));
        assert!(reason.value(2).contains("MPPT window"));
    }

    #[test]
    fn test_parquet_keeps_non_numeric_constants_and_unique_columns() {
        let file = NamedTempFile::new().unwrap();
        export_to_parquet(&inverter_sweep_report(), file.path()).unwrap();

        let batch = read_back(file.path());
        let schema = batch.schema();
        let names: Vec<_> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(names.iter().filter(|name| **name == "inverters").count(), 1);

        let (slot, field) = schema.column_with_name("inverters").unwrap();
        assert_eq!(field.data_type(), &DataType::Int64);
        let dimension = batch.column(slot).as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(dimension.value(1), 2);

        let (slot, field) = schema.column_with_name("const_inverters").unwrap();
        assert_eq!(field.data_type(), &DataType::Float64);
        let echoed = batch.column(slot).as_any().downcast_ref::<Float64Array>().unwrap();
        assert_eq!(echoed.value(1), 2.0);

        let (slot, field) = schema.column_with_name("battery_chemistry").unwrap();
        assert_eq!(field.data_type(), &DataType::Utf8);
        let chemistry = batch.column(slot).as_any().downcast_ref::<StringArray>().unwrap();
        assert!(!chemistry.is_null(0));
        assert_eq!(chemistry.value(0), "LFP");

        let (slot, field) = schema.column_with_name("bifacial").unwrap();
        assert_eq!(field.data_type(), &DataType::Boolean);
        let bifacial = batch.column(slot).as_any().downcast_ref::<BooleanArray>().unwrap();
        assert!(!bifacial.value(0));
        assert!(bifacial.value(1));
    }
}
