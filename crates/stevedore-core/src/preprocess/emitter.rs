use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::table::RecordTable;

use super::header::HeaderDescriptor;

/// One processed data/header file pair fed into a merge.
#[derive(Debug, Clone)]
pub struct MergeInput {
    pub data: PathBuf,
    pub header: PathBuf,
}

fn render_rows(table: &RecordTable, delimiter: char) -> Result<String> {
    let mut out = String::new();
    for (row_idx, row) in table.rows().iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            let rendered = value.render();
            if rendered.contains(delimiter) {
                return Err(Error::MalformedValue {
                    column: table.columns()[col_idx].clone(),
                    row: row_idx,
                    reason: format!("value {rendered:?} contains the field delimiter"),
                });
            }
            // A line break inside a value would split the row across
            // physical lines and break header/data alignment.
            if rendered.contains('\n') || rendered.contains('\r') {
                return Err(Error::MalformedValue {
                    column: table.columns()[col_idx].clone(),
                    row: row_idx,
                    reason: format!("value {rendered:?} contains a line break"),
                });
            }
            if col_idx > 0 {
                out.push(delimiter);
            }
            out.push_str(&rendered);
        }
        out.push('\n');
    }
    Ok(out)
}

/// Writes a canonical table and its synthesized header as a sibling file
/// pair. Every value is validated before the first byte is written, and the
/// targets are overwritten whole, so re-runs are idempotent and a failing
/// emit leaves previous output untouched.
pub fn emit(
    table: &RecordTable,
    header: &HeaderDescriptor,
    data_path: &Path,
    header_path: &Path,
    delimiter: char,
) -> Result<()> {
    if header.len() != table.column_count() {
        return Err(Error::HeaderArity {
            header: header.len(),
            columns: table.column_count(),
        });
    }

    let data = render_rows(table, delimiter)?;
    fs::write(data_path, data)?;
    fs::write(header_path, format!("{}\n", header.line(delimiter)))?;

    tracing::debug!(
        data = %data_path.display(),
        header = %header_path.display(),
        rows = table.row_count(),
        "emitted file pair"
    );
    Ok(())
}

/// Writes a raw extract table without a header file (the extraction phase's
/// output format).
pub fn write_raw(table: &RecordTable, path: &Path, delimiter: char) -> Result<()> {
    let data = render_rows(table, delimiter)?;
    fs::write(path, data)?;
    Ok(())
}

/// Concatenates same-kind data files in the given order into a single
/// load-ready pair. The header is written once; all inputs must agree on it
/// exactly, and nothing is written until every input has been checked.
pub fn merge(inputs: &[MergeInput], out_data: &Path, out_header: &Path) -> Result<()> {
    let Some(first) = inputs.first() else {
        tracing::warn!("merge called with no inputs, nothing written");
        return Ok(());
    };

    let reference = fs::read_to_string(&first.header)?.trim_end().to_string();
    for input in &inputs[1..] {
        let header = fs::read_to_string(&input.header)?.trim_end().to_string();
        if header != reference {
            return Err(Error::SchemaMismatch {
                path: input.data.clone(),
                expected: reference,
                found: header,
            });
        }
    }

    let mut merged = String::new();
    for input in inputs {
        let data = fs::read_to_string(&input.data)?;
        merged.push_str(&data);
        if !data.is_empty() && !data.ends_with('\n') {
            merged.push('\n');
        }
    }

    fs::write(out_data, merged)?;
    fs::write(out_header, format!("{reference}\n"))?;

    tracing::info!(
        inputs = inputs.len(),
        out = %out_data.display(),
        "merged relationship files"
    );
    Ok(())
}
