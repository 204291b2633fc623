use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::schema::{ColumnRole, CompositeKey, DatasetKind, DatasetSchema, REL_TYPE_COLUMN};
use crate::table::{RecordTable, Value};

use super::split_composite;

#[derive(Debug, Clone)]
pub struct NormalizedRelationships {
    pub table: RecordTable,
    /// Unordered pairs collapsed during bi-directional dedup.
    pub pairs_collapsed: usize,
    /// Rows dropped because an attribute assertion carried a null field.
    pub rows_dropped: usize,
}

struct ColumnPlan<'a> {
    start: PairSource<'a>,
    type_source: TypeSource,
    /// Property column indices in the raw table, in declared order.
    properties: Vec<usize>,
    output_columns: Vec<String>,
}

enum PairSource<'a> {
    Composite(usize, &'a CompositeKey),
    Columns { start: usize, end: usize },
}

enum TypeSource {
    Column(usize),
    Literal(String),
}

fn raw_index(table: &RecordTable, kind: DatasetKind, name: &str) -> Result<usize> {
    table.column_index(name).ok_or_else(|| Error::MissingColumn {
        dataset: kind,
        column: name.to_string(),
    })
}

fn plan_columns<'a>(table: &RecordTable, schema: &'a DatasetSchema) -> Result<ColumnPlan<'a>> {
    let kind = schema.kind;

    let (start, start_name, end_name) = if let Some(composite) = &schema.composite {
        (
            PairSource::Composite(raw_index(table, kind, &composite.column)?, composite),
            composite.into[0].clone(),
            composite.into[1].clone(),
        )
    } else {
        let find = |role: ColumnRole| {
            schema
                .columns
                .iter()
                .find(|c| c.role == role)
                .map(|c| c.name.clone())
                .ok_or_else(|| Error::InvalidSchema {
                    dataset: kind,
                    reason: "missing identifier column".into(),
                })
        };
        let start_name = find(ColumnRole::StartId)?;
        let end_name = find(ColumnRole::EndId)?;
        (
            PairSource::Columns {
                start: raw_index(table, kind, &start_name)?,
                end: raw_index(table, kind, &end_name)?,
            },
            start_name,
            end_name,
        )
    };

    let (type_source, type_name) = match &schema.rel_type_literal {
        Some(literal) => (
            TypeSource::Literal(literal.to_uppercase()),
            REL_TYPE_COLUMN.to_string(),
        ),
        None => {
            let spec = schema
                .columns
                .iter()
                .find(|c| c.role == ColumnRole::RelType)
                .ok_or_else(|| Error::InvalidSchema {
                    dataset: kind,
                    reason: "no relationship type source".into(),
                })?;
            (
                TypeSource::Column(raw_index(table, kind, &spec.name)?),
                spec.name.clone(),
            )
        }
    };

    let composite_column = schema.composite.as_ref().map(|c| c.column.as_str());
    let mut properties = Vec::new();
    let mut output_columns = vec![start_name, end_name, type_name];
    for spec in &schema.columns {
        if spec.role == ColumnRole::Property && Some(spec.name.as_str()) != composite_column {
            properties.push(raw_index(table, kind, &spec.name)?);
            output_columns.push(spec.name.clone());
        }
    }

    Ok(ColumnPlan {
        start,
        type_source,
        properties,
        output_columns,
    })
}

fn uppercase(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.to_uppercase()),
        other => other.clone(),
    }
}

/// Normalizes one relationship extract into the canonical
/// `[start_id, end_id, rel_type, property...]` column layout, splitting
/// composite keys, injecting a fixed label when configured, and collapsing
/// unordered pairs for the bi-directional kind.
///
/// A collapsed pair keeps the relationship type and properties of the
/// first-encountered row; its canonical representative puts the
/// lexicographically smaller identifier first, so re-runs are idempotent.
pub fn normalize_relationships(
    table: &RecordTable,
    schema: &DatasetSchema,
) -> Result<NormalizedRelationships> {
    let kind = schema.kind;
    if !kind.is_relationship() {
        return Err(Error::InvalidSchema {
            dataset: kind,
            reason: "not a relationship dataset".into(),
        });
    }
    if table.is_empty() {
        return Err(Error::EmptyTable(kind));
    }

    let plan = plan_columns(table, schema)?;

    let mut output = RecordTable::new(plan.output_columns.clone());
    let mut seen_pairs: HashSet<(String, String)> = HashSet::new();
    let mut pairs_collapsed = 0;
    let mut rows_dropped = 0;

    for (row_idx, row) in table.rows().iter().enumerate() {
        // One entity-property assertion per row; assertions with a missing
        // field carry no information for the loader.
        if kind == DatasetKind::Attribute && row.iter().any(Value::is_null) {
            rows_dropped += 1;
            continue;
        }

        let (mut start, mut end) = match &plan.start {
            PairSource::Composite(idx, composite) => {
                split_composite(composite, kind, row_idx, &row[*idx])?
            }
            PairSource::Columns { start, end } => (row[*start].clone(), row[*end].clone()),
        };

        if kind == DatasetKind::BiDirectional {
            let (a, b) = (start.render(), end.render());
            let pair = if a <= b { (a, b) } else { (b, a) };
            if !seen_pairs.insert(pair) {
                pairs_collapsed += 1;
                continue;
            }
            if start.render() > end.render() {
                std::mem::swap(&mut start, &mut end);
            }
        }

        let rel_type = match &plan.type_source {
            TypeSource::Column(idx) => uppercase(&row[*idx]),
            TypeSource::Literal(literal) => Value::String(literal.clone()),
        };

        let mut values = vec![start, end, rel_type];
        values.extend(plan.properties.iter().map(|&idx| row[idx].clone()));
        output.push_row(values)?;
    }

    if output.is_empty() {
        return Err(Error::EmptyTable(kind));
    }

    Ok(NormalizedRelationships {
        table: output,
        pairs_collapsed,
        rows_dropped,
    })
}
