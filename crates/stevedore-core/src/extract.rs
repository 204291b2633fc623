use std::collections::HashMap;

use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};

use crate::error::{Error, Result};
use crate::schema::{DatasetKind, PreprocessConfig};
use crate::table::{RecordTable, Value};

/// Runs the configured extract query for a dataset kind and materializes the
/// full result set. Extraction is a thin collaborator: fetch-all, no retry,
/// no streaming.
#[async_trait::async_trait]
pub trait ExtractProvider: Send + Sync {
    async fn fetch(&self, kind: DatasetKind) -> Result<RecordTable>;
}

pub struct PostgresExtractor {
    pool: PgPool,
    queries: HashMap<DatasetKind, String>,
    columns: HashMap<DatasetKind, Vec<String>>,
}

impl PostgresExtractor {
    pub async fn connect(url: &str, config: &PreprocessConfig) -> Result<Self> {
        let pool = PgPoolOptions::new().max_connections(1).connect(url).await?;

        let mut queries = HashMap::new();
        let mut columns = HashMap::new();
        for schema in &config.datasets {
            if let Some(query) = &schema.query {
                queries.insert(schema.kind, query.clone());
                columns.insert(schema.kind, schema.raw_column_names());
            }
        }

        Ok(Self {
            pool,
            queries,
            columns,
        })
    }

    fn decode_value(row: &PgRow, index: usize) -> Result<Value> {
        if let Ok(v) = row.try_get::<Option<i64>, _>(index) {
            return Ok(v.map_or(Value::Null, Value::Int));
        }
        if let Ok(v) = row.try_get::<Option<i32>, _>(index) {
            return Ok(v.map_or(Value::Null, |i| Value::Int(i64::from(i))));
        }
        if let Ok(v) = row.try_get::<Option<f64>, _>(index) {
            return Ok(v.map_or(Value::Null, Value::Float));
        }
        if let Ok(v) = row.try_get::<Option<bool>, _>(index) {
            return Ok(v.map_or(Value::Null, Value::Bool));
        }
        // Last resort is text; a column that decodes as none of the
        // supported types aborts the extract.
        let v = row.try_get::<Option<String>, _>(index)?;
        Ok(v.map_or(Value::Null, Value::String))
    }
}

#[async_trait::async_trait]
impl ExtractProvider for PostgresExtractor {
    async fn fetch(&self, kind: DatasetKind) -> Result<RecordTable> {
        let query = self.queries.get(&kind).ok_or(Error::InvalidSchema {
            dataset: kind,
            reason: "no extract query configured".into(),
        })?;
        let columns = &self.columns[&kind];

        tracing::info!(kind = %kind, "running extract query");
        let rows = sqlx::query(query).fetch_all(&self.pool).await?;

        let mut table = RecordTable::new(columns.clone());
        for (row_idx, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(Error::RowArity {
                    row: row_idx,
                    expected: columns.len(),
                    found: row.len(),
                });
            }
            let values = (0..columns.len())
                .map(|i| Self::decode_value(row, i))
                .collect::<Result<Vec<_>>>()?;
            table.push_row(values)?;
        }

        tracing::info!(kind = %kind, rows = table.row_count(), "extract complete");
        Ok(table)
    }
}
