use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::schema::DatasetKind;

/// File the registry persists to, inside the run's base path.
pub const REGISTRY_FILE: &str = "file_paths.json";

/// Logical registry key for a kind's raw extract file.
#[must_use]
pub fn raw_key(kind: DatasetKind) -> String {
    format!("{kind}_raw")
}

/// Logical registry key for a kind's processed data file.
#[must_use]
pub fn processed_key(kind: DatasetKind) -> String {
    format!("{kind}_processed")
}

/// Logical registry key for a kind's processed header file.
#[must_use]
pub fn header_key(kind: DatasetKind) -> String {
    format!("{kind}_header")
}

pub const MERGED_RELATIONSHIPS_KEY: &str = "relationships";
pub const MERGED_RELATIONSHIPS_HEADER_KEY: &str = "relationships_header";

/// Maps logical dataset names to file-system locations. The registry is the
/// only state shared between the extraction and preprocessing phases; it is
/// loaded and saved explicitly at phase boundaries and passed by reference
/// in between.
#[derive(Debug, Clone)]
pub struct PathRegistry {
    file: PathBuf,
    entries: BTreeMap<String, PathBuf>,
}

impl PathRegistry {
    /// Loads the registry from `base_path`, starting empty when no registry
    /// file exists yet.
    pub fn load(base_path: &Path) -> Result<Self> {
        let file = base_path.join(REGISTRY_FILE);
        let entries = if file.exists() {
            serde_json::from_str(&fs::read_to_string(&file)?)?
        } else {
            BTreeMap::new()
        };
        Ok(Self { file, entries })
    }

    pub fn save(&self) -> Result<()> {
        fs::write(&self.file, serde_json::to_string_pretty(&self.entries)?)?;
        Ok(())
    }

    pub fn insert(&mut self, key: impl Into<String>, path: impl Into<PathBuf>) {
        self.entries.insert(key.into(), path.into());
    }

    pub fn get(&self, key: &str) -> Result<&Path> {
        self.entries
            .get(key)
            .map(PathBuf::as_path)
            .ok_or_else(|| Error::UnregisteredPath(key.to_string()))
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
