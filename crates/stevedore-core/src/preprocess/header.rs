use crate::error::{Error, Result};
use crate::schema::{loader_primitive, ColumnRole, DatasetSchema};
use crate::table::RecordTable;

/// Ordered loader header tokens describing one data file. Token order
/// mirrors the canonical table's column order exactly; the loader has no
/// tolerance for reordering between header and data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderDescriptor {
    tokens: Vec<String>,
}

impl HeaderDescriptor {
    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The single line written to the header file.
    #[must_use]
    pub fn line(&self, delimiter: char) -> String {
        self.tokens.join(&delimiter.to_string())
    }
}

/// Synthesizes the loader header for a canonical table: identifier roles
/// map to `:ID`/`:START_ID`/`:END_ID`/`:TYPE`/`:LABEL` tokens, properties
/// to `name:type` tokens in the loader's primitive vocabulary.
pub fn build_header(table: &RecordTable, schema: &DatasetSchema) -> Result<HeaderDescriptor> {
    let mut tokens = Vec::with_capacity(table.column_count());

    for name in table.columns() {
        let role = schema
            .canonical_role(name)
            .ok_or_else(|| Error::MissingColumn {
                dataset: schema.kind,
                column: name.clone(),
            })?;

        let token = match role {
            ColumnRole::Id => ":ID".to_string(),
            ColumnRole::StartId => ":START_ID".to_string(),
            ColumnRole::EndId => ":END_ID".to_string(),
            ColumnRole::RelType => ":TYPE".to_string(),
            ColumnRole::Label => ":LABEL".to_string(),
            ColumnRole::Property => {
                let declared = schema.declared_type(name);
                let primitive =
                    loader_primitive(&declared).ok_or_else(|| Error::UnmappableType {
                        column: name.clone(),
                        declared,
                    })?;
                format!("{name}:{primitive}")
            }
        };
        tokens.push(token);
    }

    Ok(HeaderDescriptor { tokens })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnSpec, ConflictPolicy, DatasetKind};

    fn schema(columns: Vec<ColumnSpec>, kind: DatasetKind) -> DatasetSchema {
        DatasetSchema {
            kind,
            columns,
            composite: None,
            rel_type_literal: None,
            conflict_policy: ConflictPolicy::default(),
            query: None,
        }
    }

    #[test]
    fn test_relationship_tokens() {
        let schema = schema(
            vec![
                ColumnSpec::with_role("start", ColumnRole::StartId),
                ColumnSpec::with_role("end", ColumnRole::EndId),
                ColumnSpec::with_role("type", ColumnRole::RelType),
                ColumnSpec::typed("ref_count", "int"),
                ColumnSpec::property("effect"),
            ],
            DatasetKind::Directional,
        );
        let table = RecordTable::new(vec![
            "start".into(),
            "end".into(),
            "type".into(),
            "ref_count".into(),
            "effect".into(),
        ]);

        let header = build_header(&table, &schema).unwrap();

        assert_eq!(
            header.tokens(),
            &[":START_ID", ":END_ID", ":TYPE", "ref_count:int", "effect:string"]
        );
        assert_eq!(header.line('|'), ":START_ID|:END_ID|:TYPE|ref_count:int|effect:string");
    }

    #[test]
    fn test_node_tokens() {
        let schema = schema(
            vec![
                ColumnSpec::with_role("id", ColumnRole::Id),
                ColumnSpec::property("name"),
                ColumnSpec::with_role("label", ColumnRole::Label),
            ],
            DatasetKind::Node,
        );
        let table = RecordTable::new(vec!["id".into(), "name".into(), "label".into()]);

        let header = build_header(&table, &schema).unwrap();
        assert_eq!(header.tokens(), &[":ID", "name:string", ":LABEL"]);
    }

    #[test]
    fn test_token_order_mirrors_columns() {
        let schema = schema(
            vec![
                ColumnSpec::property("name"),
                ColumnSpec::with_role("id", ColumnRole::Id),
            ],
            DatasetKind::Node,
        );
        let table = RecordTable::new(vec!["id".into(), "name".into()]);

        let header = build_header(&table, &schema).unwrap();
        assert_eq!(header.tokens(), &[":ID", "name:string"]);
    }

    #[test]
    fn test_unmappable_type() {
        let mut bad = ColumnSpec::property("weight");
        bad.declared_type = "decimal".into();
        let schema = schema(
            vec![ColumnSpec::with_role("id", ColumnRole::Id), bad],
            DatasetKind::Node,
        );
        let table = RecordTable::new(vec!["id".into(), "weight".into()]);

        let err = build_header(&table, &schema).unwrap_err();
        assert!(matches!(
            err,
            Error::UnmappableType { ref column, .. } if column == "weight"
        ));
    }

    #[test]
    fn test_unknown_column_rejected() {
        let schema = schema(
            vec![ColumnSpec::with_role("id", ColumnRole::Id)],
            DatasetKind::Node,
        );
        let table = RecordTable::new(vec!["mystery".into()]);

        assert!(matches!(
            build_header(&table, &schema),
            Err(Error::MissingColumn { .. })
        ));
    }
}
