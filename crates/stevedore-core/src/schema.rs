use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Name of the relationship-type column injected when a dataset carries a
/// fixed label instead of a per-row type column.
pub const REL_TYPE_COLUMN: &str = "type";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    Node,
    Directional,
    BiDirectional,
    Attribute,
}

impl DatasetKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Directional => "directional",
            Self::BiDirectional => "bi_directional",
            Self::Attribute => "attribute",
        }
    }

    #[must_use]
    pub const fn is_relationship(self) -> bool {
        matches!(self, Self::Directional | Self::BiDirectional | Self::Attribute)
    }

    /// The relationship kinds in the order their processed files are merged.
    #[must_use]
    pub const fn relationship_kinds() -> [Self; 3] {
        [Self::Directional, Self::BiDirectional, Self::Attribute]
    }
}

impl std::fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DatasetKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "node" | "nodes" => Ok(Self::Node),
            "directional" => Ok(Self::Directional),
            "bi_directional" | "bi-directional" => Ok(Self::BiDirectional),
            "attribute" => Ok(Self::Attribute),
            _ => Err(Error::UnknownDatasetKind(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Id,
    StartId,
    EndId,
    RelType,
    Label,
    #[default]
    Property,
}

/// Maps a declared property type to the bulk loader's primitive vocabulary.
#[must_use]
pub fn loader_primitive(declared: &str) -> Option<&'static str> {
    match declared {
        "string" => Some("string"),
        "int" => Some("int"),
        "float" => Some("float"),
        "boolean" => Some("boolean"),
        _ => None,
    }
}

fn default_type() -> String {
    "string".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(default)]
    pub role: ColumnRole,
    #[serde(rename = "type", default = "default_type")]
    pub declared_type: String,
}

impl ColumnSpec {
    #[must_use]
    pub fn property(name: &str) -> Self {
        Self {
            name: name.to_string(),
            role: ColumnRole::Property,
            declared_type: default_type(),
        }
    }

    #[must_use]
    pub fn with_role(name: &str, role: ColumnRole) -> Self {
        Self {
            name: name.to_string(),
            role,
            declared_type: default_type(),
        }
    }

    #[must_use]
    pub fn typed(name: &str, declared_type: &str) -> Self {
        Self {
            name: name.to_string(),
            role: ColumnRole::Property,
            declared_type: declared_type.to_string(),
        }
    }
}

/// A raw column whose value encodes two identifiers joined by a fixed
/// separator, optionally wrapped in an enclosing character pair
/// (the upstream extract emits keys like `[123, 456]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositeKey {
    pub column: String,
    pub separator: String,
    #[serde(default)]
    pub enclosed_by: Option<String>,
    pub into: [String; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    #[default]
    LastWriteWins,
    RejectOnConflict,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSchema {
    pub kind: DatasetKind,
    /// Raw extract columns, in extract order.
    pub columns: Vec<ColumnSpec>,
    #[serde(default)]
    pub composite: Option<CompositeKey>,
    /// Fixed relationship label shared by every row of the dataset.
    #[serde(default)]
    pub rel_type_literal: Option<String>,
    #[serde(default)]
    pub conflict_policy: ConflictPolicy,
    /// Extract query run by the raw extract provider.
    #[serde(default)]
    pub query: Option<String>,
}

impl DatasetSchema {
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    #[must_use]
    pub fn raw_column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    fn count_role(&self, role: ColumnRole) -> usize {
        self.columns.iter().filter(|c| c.role == role).count()
    }

    /// Role of a column in the canonical (post-split, post-injection) table.
    #[must_use]
    pub fn canonical_role(&self, name: &str) -> Option<ColumnRole> {
        if let Some(composite) = &self.composite {
            if name == composite.into[0] {
                return Some(if self.kind == DatasetKind::Node {
                    ColumnRole::Id
                } else {
                    ColumnRole::StartId
                });
            }
            if name == composite.into[1] {
                return Some(if self.kind == DatasetKind::Node {
                    ColumnRole::Property
                } else {
                    ColumnRole::EndId
                });
            }
        }
        if self.rel_type_literal.is_some() && name == REL_TYPE_COLUMN {
            return Some(ColumnRole::RelType);
        }
        self.column(name).map(|c| c.role)
    }

    /// Declared type of a canonical column; splits and injections are plain
    /// strings, everything else defaults to `string`.
    #[must_use]
    pub fn declared_type(&self, name: &str) -> String {
        self.column(name)
            .map_or_else(default_type, |c| c.declared_type.clone())
    }

    fn invalid(&self, reason: impl Into<String>) -> Error {
        Error::InvalidSchema {
            dataset: self.kind,
            reason: reason.into(),
        }
    }

    /// Fail-fast metadata check, run once at configuration load before any
    /// transform.
    pub fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(self.invalid("no columns declared"));
        }

        let mut names: Vec<&str> = self.columns.iter().map(|c| c.name.as_str()).collect();
        names.sort_unstable();
        if names.windows(2).any(|w| w[0] == w[1]) {
            return Err(self.invalid("duplicate column name"));
        }

        for col in &self.columns {
            if col.role == ColumnRole::Property && loader_primitive(&col.declared_type).is_none() {
                return Err(Error::UnmappableType {
                    column: col.name.clone(),
                    declared: col.declared_type.clone(),
                });
            }
        }

        if let Some(composite) = &self.composite {
            if self.column(&composite.column).is_none() {
                return Err(self.invalid(format!(
                    "composite source column {:?} not declared",
                    composite.column
                )));
            }
            if composite.separator.is_empty() {
                return Err(self.invalid("composite separator is empty"));
            }
            for target in &composite.into {
                if self.column(target).is_some() {
                    return Err(self.invalid(format!(
                        "composite target {target:?} collides with a declared column"
                    )));
                }
            }
            if let Some(enclosure) = &composite.enclosed_by {
                if enclosure.chars().count() != 2 {
                    return Err(self.invalid("composite enclosure must be exactly two characters"));
                }
            }
        }

        if self.kind == DatasetKind::Node {
            self.validate_node()
        } else {
            self.validate_relationship()
        }
    }

    fn validate_node(&self) -> Result<()> {
        for role in [ColumnRole::StartId, ColumnRole::EndId, ColumnRole::RelType] {
            if self.count_role(role) > 0 {
                return Err(self.invalid("relationship role on a node column"));
            }
        }
        if self.rel_type_literal.is_some() {
            return Err(self.invalid("rel_type_literal is not applicable to node datasets"));
        }

        let ids = self.count_role(ColumnRole::Id);
        match (&self.composite, ids) {
            (Some(_), 0) | (None, 1) => Ok(()),
            (Some(_), _) => Err(self.invalid("composite node key excludes a separate id column")),
            (None, 0) => Err(self.invalid("no id column")),
            (None, _) => Err(self.invalid("more than one id column")),
        }
    }

    fn validate_relationship(&self) -> Result<()> {
        for role in [ColumnRole::Id, ColumnRole::Label] {
            if self.count_role(role) > 0 {
                return Err(self.invalid("node role on a relationship column"));
            }
        }

        let starts = self.count_role(ColumnRole::StartId);
        let ends = self.count_role(ColumnRole::EndId);
        match (&self.composite, starts, ends) {
            (Some(_), 0, 0) | (None, 1, 1) => {}
            (Some(_), _, _) => {
                return Err(self.invalid("composite key excludes separate start/end id columns"))
            }
            (None, _, _) => {
                return Err(self.invalid("exactly one start_id and one end_id column required"))
            }
        }

        let type_columns = self.count_role(ColumnRole::RelType);
        match (type_columns, &self.rel_type_literal) {
            (1, None) | (0, Some(_)) => {}
            (0, None) => return Err(self.invalid("no relationship type source")),
            _ => return Err(self.invalid("conflicting relationship type sources")),
        }

        // The injected literal owns the type column name outright.
        if self.rel_type_literal.is_some() && self.column(REL_TYPE_COLUMN).is_some() {
            return Err(self.invalid(format!(
                "column {REL_TYPE_COLUMN:?} collides with the injected relationship type"
            )));
        }

        Ok(())
    }
}

fn default_delimiter() -> char {
    '|'
}

/// Whole-run configuration: one schema per dataset kind plus the shared
/// field delimiter. Loaded once and validated before any transform runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessConfig {
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    pub datasets: Vec<DatasetSchema>,
}

impl PreprocessConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.delimiter.is_ascii() || self.delimiter == '\n' {
            return Err(Error::MalformedValue {
                column: String::new(),
                row: 0,
                reason: format!("unusable field delimiter {:?}", self.delimiter),
            });
        }
        for schema in &self.datasets {
            schema.validate()?;
            if self.datasets.iter().filter(|s| s.kind == schema.kind).count() > 1 {
                return Err(Error::InvalidSchema {
                    dataset: schema.kind,
                    reason: "dataset kind configured more than once".into(),
                });
            }
        }
        Ok(())
    }

    pub fn schema(&self, kind: DatasetKind) -> Result<&DatasetSchema> {
        self.datasets
            .iter()
            .find(|s| s.kind == kind)
            .ok_or(Error::InvalidSchema {
                dataset: kind,
                reason: "dataset kind not configured".into(),
            })
    }

    #[must_use]
    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter as u8
    }
}
