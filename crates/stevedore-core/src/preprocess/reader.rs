use std::path::Path;

use crate::error::{Error, Result};
use crate::schema::{ColumnRole, ColumnSpec, DatasetSchema};
use crate::table::{RecordTable, Value};

/// Reads a headerless, delimiter-separated raw extract file into a
/// `RecordTable` using the dataset schema's column names and declared types.
///
/// Fields are whitespace-trimmed. Empty fields and the upstream extract's
/// textual null spellings become `Value::Null`. Typed property columns are
/// parsed eagerly so downstream stages never see an untyped value.
pub fn read_raw_table(path: &Path, schema: &DatasetSchema, delimiter: u8) -> Result<RecordTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .from_path(path)?;

    let columns = schema.raw_column_names();
    let mut table = RecordTable::new(columns.clone());

    for (row, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() != columns.len() {
            return Err(Error::RowArity {
                row,
                expected: columns.len(),
                found: record.len(),
            });
        }

        let mut values = Vec::with_capacity(columns.len());
        for (spec, field) in schema.columns.iter().zip(record.iter()) {
            values.push(parse_field(spec, field, row)?);
        }
        table.push_row(values)?;
    }

    Ok(table)
}

fn parse_field(spec: &ColumnSpec, raw: &str, row: usize) -> Result<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "None" || trimmed == "nan" {
        return Ok(Value::Null);
    }

    // Identifier and label columns stay textual regardless of declared type.
    if spec.role != ColumnRole::Property {
        return Ok(Value::String(trimmed.to_string()));
    }

    let malformed = |reason: String| Error::MalformedValue {
        column: spec.name.clone(),
        row,
        reason,
    };

    match spec.declared_type.as_str() {
        "int" => trimmed
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| malformed(format!("{trimmed:?} is not an int"))),
        "float" => trimmed
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| malformed(format!("{trimmed:?} is not a float"))),
        "boolean" => match trimmed {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(malformed(format!("{trimmed:?} is not a boolean"))),
        },
        _ => Ok(Value::String(trimmed.to_string())),
    }
}
