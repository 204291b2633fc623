pub mod error;
pub mod extract;
pub mod preprocess;
pub mod registry;
pub mod schema;
pub mod table;

pub use error::{Error, Result};
pub use extract::{ExtractProvider, PostgresExtractor};
pub use preprocess::{
    build_header, emit, merge, normalize_nodes, normalize_relationships, read_raw_table,
    write_raw, HeaderDescriptor, MergeInput, NormalizedNodes, NormalizedRelationships,
    PreprocessPipeline, RunStats,
};
pub use registry::PathRegistry;
pub use schema::{
    ColumnRole, ColumnSpec, CompositeKey, ConflictPolicy, DatasetKind, DatasetSchema,
    PreprocessConfig,
};
pub use table::{RecordTable, Value};
