use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::schema::{ColumnRole, ConflictPolicy, DatasetKind, DatasetSchema};
use crate::table::{RecordTable, Value};

use super::split_composite;

#[derive(Debug, Clone)]
pub struct NormalizedNodes {
    pub table: RecordTable,
    /// Extract rows folded into an earlier row with the same id.
    pub rows_merged: usize,
}

/// Normalizes a node extract: the id column moves first, label values are
/// uppercased, and rows sharing an id are merged property-wise.
///
/// Under `LastWriteWins` a later row's non-null properties override earlier
/// ones; under `RejectOnConflict` two disagreeing non-null values for the
/// same property abort with `DuplicateIdConflict`. A null never overrides a
/// present value.
pub fn normalize_nodes(table: &RecordTable, schema: &DatasetSchema) -> Result<NormalizedNodes> {
    if schema.kind != DatasetKind::Node {
        return Err(Error::InvalidSchema {
            dataset: schema.kind,
            reason: "not a node dataset".into(),
        });
    }
    if table.is_empty() {
        return Err(Error::EmptyTable(DatasetKind::Node));
    }

    let missing = |name: &str| Error::MissingColumn {
        dataset: DatasetKind::Node,
        column: name.to_string(),
    };

    // Id source: either the composite raw column or the single Id-role column.
    let composite_column = schema.composite.as_ref().map(|c| c.column.as_str());
    let id_index = match composite_column {
        Some(name) => table.column_index(name).ok_or_else(|| missing(name))?,
        None => {
            let spec = schema
                .columns
                .iter()
                .find(|c| c.role == ColumnRole::Id)
                .ok_or_else(|| Error::InvalidSchema {
                    dataset: DatasetKind::Node,
                    reason: "no id column".into(),
                })?;
            table
                .column_index(&spec.name)
                .ok_or_else(|| missing(&spec.name))?
        }
    };

    // Canonical layout: id column(s) first, remaining raw columns in
    // declared order.
    let mut kept: Vec<usize> = Vec::new();
    let mut output_columns: Vec<String> = Vec::new();
    if let Some(composite) = &schema.composite {
        output_columns.push(composite.into[0].clone());
        output_columns.push(composite.into[1].clone());
    } else {
        output_columns.push(table.columns()[id_index].clone());
    }
    let fixed = output_columns.len();

    let mut label_positions: Vec<usize> = Vec::new();
    for spec in &schema.columns {
        if spec.role == ColumnRole::Id || Some(spec.name.as_str()) == composite_column {
            continue;
        }
        if spec.role == ColumnRole::Label {
            label_positions.push(fixed + kept.len());
        }
        kept.push(
            table
                .column_index(&spec.name)
                .ok_or_else(|| missing(&spec.name))?,
        );
        output_columns.push(spec.name.clone());
    }

    let mut output = RecordTable::new(output_columns);
    let mut by_id: HashMap<String, usize> = HashMap::new();
    let mut merged_rows: Vec<Vec<Value>> = Vec::new();
    let mut rows_merged = 0;

    for (row_idx, row) in table.rows().iter().enumerate() {
        let mut values: Vec<Value> = Vec::with_capacity(fixed + kept.len());

        if let Some(composite) = &schema.composite {
            let (id, extra) =
                split_composite(composite, DatasetKind::Node, row_idx, &row[id_index])?;
            values.push(id);
            values.push(extra);
        } else {
            values.push(row[id_index].clone());
        }

        for &idx in &kept {
            values.push(row[idx].clone());
        }
        for &pos in &label_positions {
            values[pos] = uppercase(&values[pos]);
        }

        let id = values[0].render();
        if let Some(&existing_idx) = by_id.get(&id) {
            rows_merged += 1;
            merge_row(
                &mut merged_rows[existing_idx],
                &values,
                &id,
                output.columns(),
                schema.conflict_policy,
            )?;
        } else {
            by_id.insert(id, merged_rows.len());
            merged_rows.push(values);
        }
    }

    for row in merged_rows {
        output.push_row(row)?;
    }

    Ok(NormalizedNodes {
        table: output,
        rows_merged,
    })
}

fn merge_row(
    existing: &mut [Value],
    incoming: &[Value],
    id: &str,
    columns: &[String],
    policy: ConflictPolicy,
) -> Result<()> {
    for (col_idx, incoming_value) in incoming.iter().enumerate().skip(1) {
        if incoming_value.is_null() {
            continue;
        }
        let current = &existing[col_idx];
        if current.is_null() || current == incoming_value {
            existing[col_idx] = incoming_value.clone();
            continue;
        }
        match policy {
            ConflictPolicy::LastWriteWins => existing[col_idx] = incoming_value.clone(),
            ConflictPolicy::RejectOnConflict => {
                return Err(Error::DuplicateIdConflict {
                    id: id.to_string(),
                    column: columns[col_idx].clone(),
                    existing: current.render(),
                    incoming: incoming_value.render(),
                });
            }
        }
    }
    Ok(())
}

fn uppercase(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.to_uppercase()),
        other => other.clone(),
    }
}
