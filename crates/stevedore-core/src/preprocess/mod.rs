mod emitter;
mod header;
mod node;
mod pipeline;
mod reader;
mod relationship;

pub use emitter::{emit, merge, write_raw, MergeInput};
pub use header::{build_header, HeaderDescriptor};
pub use node::{normalize_nodes, NormalizedNodes};
pub use pipeline::{PreprocessPipeline, RunStats};
pub use reader::read_raw_table;
pub use relationship::{normalize_relationships, NormalizedRelationships};

use crate::error::{Error, Result};
use crate::schema::{CompositeKey, DatasetKind};
use crate::table::Value;

/// Splits one composite key value into its two identifiers. The value must
/// contain the separator exactly once; both halves are whitespace-trimmed
/// after the optional enclosure is stripped.
pub(crate) fn split_composite(
    composite: &CompositeKey,
    kind: DatasetKind,
    row: usize,
    value: &Value,
) -> Result<(Value, Value)> {
    let rendered = match value {
        Value::String(s) => s.clone(),
        other => other.render(),
    };

    let mut inner = rendered.trim();
    if let Some(enclosure) = &composite.enclosed_by {
        let mut chars = enclosure.chars();
        let open = chars.next().unwrap_or_default();
        let close = chars.next().unwrap_or_default();
        inner = inner.strip_prefix(open).unwrap_or(inner);
        inner = inner.strip_suffix(close).unwrap_or(inner);
    }

    let parts: Vec<&str> = inner.split(&composite.separator).collect();
    if value.is_null() || parts.len() != 2 {
        return Err(Error::MalformedKey {
            dataset: kind,
            row,
            value: rendered,
            separator: composite.separator.clone(),
        });
    }

    Ok((
        Value::String(parts[0].trim().to_string()),
        Value::String(parts[1].trim().to_string()),
    ))
}
