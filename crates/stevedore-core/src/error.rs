use std::path::PathBuf;

use thiserror::Error;

use crate::schema::DatasetKind;

#[derive(Debug, Error)]
pub enum Error {
    #[error(
        "malformed composite key in {dataset} row {row}: {value:?} does not split once on {separator:?}"
    )]
    MalformedKey {
        dataset: DatasetKind,
        row: usize,
        value: String,
        separator: String,
    },

    #[error("malformed value in column {column:?} row {row}: {reason}")]
    MalformedValue {
        column: String,
        row: usize,
        reason: String,
    },

    #[error(
        "conflicting values for node {id:?} in column {column:?}: {existing:?} vs {incoming:?}"
    )]
    DuplicateIdConflict {
        id: String,
        column: String,
        existing: String,
        incoming: String,
    },

    #[error("no loader primitive for declared type {declared:?} on column {column:?}")]
    UnmappableType { column: String, declared: String },

    #[error("header mismatch at {path}: expected {expected:?}, found {found:?}")]
    SchemaMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },

    #[error("header has {header} tokens but table has {columns} columns")]
    HeaderArity { header: usize, columns: usize },

    #[error("{0} dataset has no rows")]
    EmptyTable(DatasetKind),

    #[error("row {row} has {found} fields, expected {expected}")]
    RowArity {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("column {column:?} not present in {dataset} table")]
    MissingColumn {
        dataset: DatasetKind,
        column: String,
    },

    #[error("invalid {dataset} schema: {reason}")]
    InvalidSchema {
        dataset: DatasetKind,
        reason: String,
    },

    #[error("unknown dataset kind: {0}")]
    UnknownDatasetKind(String),

    #[error("no path registered under {0:?}")]
    UnregisteredPath(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
