use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::registry::{
    self, PathRegistry, MERGED_RELATIONSHIPS_HEADER_KEY, MERGED_RELATIONSHIPS_KEY,
};
use crate::schema::{DatasetKind, PreprocessConfig};
use crate::table::RecordTable;

use super::emitter::{self, MergeInput};
use super::header::build_header;
use super::node::normalize_nodes;
use super::reader::read_raw_table;
use super::relationship::normalize_relationships;

/// Outcome of one per-dataset preprocessing run.
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    pub rows_in: usize,
    pub rows_out: usize,
    pub pairs_collapsed: usize,
    pub rows_dropped: usize,
    pub rows_merged: usize,
    /// True when the raw extract was empty and emission was skipped.
    pub skipped: bool,
}

/// Drives one dataset through read → normalize → header synthesis → emit,
/// updating the path registry after every write. Each stage fully
/// materializes its output before the next begins.
pub struct PreprocessPipeline {
    config: PreprocessConfig,
    base_path: PathBuf,
}

impl PreprocessPipeline {
    #[must_use]
    pub fn new(config: PreprocessConfig, base_path: impl Into<PathBuf>) -> Self {
        Self {
            config,
            base_path: base_path.into(),
        }
    }

    fn target(&self, name: &str) -> PathBuf {
        self.base_path.join(ensure_extension(name))
    }

    /// Writes a raw extract table for `kind` and registers its path; the
    /// extraction phase's output step.
    pub fn write_raw(
        &self,
        registry: &mut PathRegistry,
        kind: DatasetKind,
        table: &RecordTable,
        file_name: Option<&str>,
    ) -> Result<PathBuf> {
        let default = format!("{kind}_raw");
        let path = self.target(file_name.unwrap_or(&default));
        emitter::write_raw(table, &path, self.config.delimiter)?;
        registry.insert(registry::raw_key(kind), &path);
        tracing::info!(kind = %kind, rows = table.row_count(), path = %path.display(), "raw extract written");
        Ok(path)
    }

    /// Runs the preprocessing stage for one dataset kind. The raw file
    /// location comes from the registry; the processed pair is registered
    /// on success. An empty extract is logged and skipped, not fatal.
    pub fn run_dataset(
        &self,
        registry: &mut PathRegistry,
        kind: DatasetKind,
        file_name: Option<&str>,
    ) -> Result<RunStats> {
        let schema = self.config.schema(kind)?;
        let raw_path = registry.get(&registry::raw_key(kind))?.to_path_buf();

        let table = read_raw_table(&raw_path, schema, self.config.delimiter_byte())?;
        let mut stats = RunStats {
            rows_in: table.row_count(),
            ..RunStats::default()
        };

        let canonical = if kind == DatasetKind::Node {
            match normalize_nodes(&table, schema) {
                Ok(normalized) => {
                    stats.rows_merged = normalized.rows_merged;
                    normalized.table
                }
                Err(Error::EmptyTable(kind)) => return Ok(self.skip(kind, stats)),
                Err(e) => return Err(e),
            }
        } else {
            match normalize_relationships(&table, schema) {
                Ok(normalized) => {
                    stats.pairs_collapsed = normalized.pairs_collapsed;
                    stats.rows_dropped = normalized.rows_dropped;
                    normalized.table
                }
                Err(Error::EmptyTable(kind)) => return Ok(self.skip(kind, stats)),
                Err(e) => return Err(e),
            }
        };
        stats.rows_out = canonical.row_count();

        let header = build_header(&canonical, schema)?;

        let default = format!("{kind}_processed");
        let data_path = self.target(file_name.unwrap_or(&default));
        let header_path = header_sibling(&data_path);
        emitter::emit(
            &canonical,
            &header,
            &data_path,
            &header_path,
            self.config.delimiter,
        )?;

        registry.insert(registry::processed_key(kind), &data_path);
        registry.insert(registry::header_key(kind), &header_path);

        tracing::info!(
            kind = %kind,
            rows_in = stats.rows_in,
            rows_out = stats.rows_out,
            "dataset preprocessed"
        );
        Ok(stats)
    }

    fn skip(&self, kind: DatasetKind, mut stats: RunStats) -> RunStats {
        tracing::warn!(kind = %kind, "empty extract, emission skipped");
        stats.skipped = true;
        stats
    }

    /// Concatenates the processed relationship files into the single pair
    /// the bulk loader consumes, in the fixed directional → bi-directional
    /// → attribute order. Returns `None` without writing or registering
    /// anything when no relationship kind has a processed pair.
    pub fn merge_relationships(
        &self,
        registry: &mut PathRegistry,
        file_name: Option<&str>,
    ) -> Result<Option<PathBuf>> {
        let mut inputs = Vec::new();
        for kind in DatasetKind::relationship_kinds() {
            // A kind skipped for emptiness has no registered pair.
            if !registry.contains(&registry::processed_key(kind)) {
                tracing::warn!(kind = %kind, "no processed file, excluded from merge");
                continue;
            }
            inputs.push(MergeInput {
                data: registry.get(&registry::processed_key(kind))?.to_path_buf(),
                header: registry.get(&registry::header_key(kind))?.to_path_buf(),
            });
        }

        if inputs.is_empty() {
            tracing::warn!("no relationship files to merge");
            return Ok(None);
        }

        let data_path = self.target(file_name.unwrap_or("relationships"));
        let header_path = header_sibling(&data_path);
        emitter::merge(&inputs, &data_path, &header_path)?;

        registry.insert(MERGED_RELATIONSHIPS_KEY, &data_path);
        registry.insert(MERGED_RELATIONSHIPS_HEADER_KEY, &header_path);
        Ok(Some(data_path))
    }
}

/// Output files carry the `.txt` extension whether or not the caller
/// supplied it.
fn ensure_extension(name: &str) -> String {
    if std::path::Path::new(name)
        .extension()
        .is_some_and(|e| e == "txt")
    {
        name.to_string()
    } else {
        format!("{name}.txt")
    }
}

fn header_sibling(data_path: &Path) -> PathBuf {
    let stem = data_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("out");
    data_path.with_file_name(format!("{stem}_header.txt"))
}
