use std::fs;
use std::path::Path;

use tempfile::TempDir;

use stevedore_core::registry::{self, PathRegistry};
use stevedore_core::{
    ColumnRole, ColumnSpec, CompositeKey, ConflictPolicy, DatasetKind, DatasetSchema,
    PreprocessConfig, PreprocessPipeline,
};

fn spec(name: &str, role: ColumnRole) -> ColumnSpec {
    ColumnSpec::with_role(name, role)
}

fn config() -> PreprocessConfig {
    PreprocessConfig {
        delimiter: '|',
        datasets: vec![
            DatasetSchema {
                kind: DatasetKind::Directional,
                columns: vec![
                    spec("start", ColumnRole::StartId),
                    spec("end", ColumnRole::EndId),
                    spec("type", ColumnRole::RelType),
                ],
                composite: None,
                rel_type_literal: None,
                conflict_policy: ConflictPolicy::default(),
                query: None,
            },
            DatasetSchema {
                kind: DatasetKind::BiDirectional,
                columns: vec![
                    ColumnSpec::property("key"),
                    spec("type", ColumnRole::RelType),
                ],
                composite: Some(CompositeKey {
                    column: "key".into(),
                    separator: ",".into(),
                    enclosed_by: Some("[]".into()),
                    into: ["start".into(), "end".into()],
                }),
                rel_type_literal: None,
                conflict_policy: ConflictPolicy::default(),
                query: None,
            },
            DatasetSchema {
                kind: DatasetKind::Node,
                columns: vec![
                    spec("id", ColumnRole::Id),
                    ColumnSpec::property("name"),
                    spec("label", ColumnRole::Label),
                ],
                composite: None,
                rel_type_literal: None,
                conflict_policy: ConflictPolicy::default(),
                query: None,
            },
        ],
    }
}

fn seed_raw(dir: &Path, registry: &mut PathRegistry, kind: DatasetKind, content: &str) {
    let path = dir.join(format!("{kind}_raw.txt"));
    fs::write(&path, content).unwrap();
    registry.insert(registry::raw_key(kind), &path);
}

#[test]
fn directional_end_to_end() {
    let tmp = TempDir::new().unwrap();
    let mut registry = PathRegistry::load(tmp.path()).unwrap();
    seed_raw(
        tmp.path(),
        &mut registry,
        DatasetKind::Directional,
        "A|B|knows\n",
    );

    let pipeline = PreprocessPipeline::new(config(), tmp.path());
    let stats = pipeline
        .run_dataset(&mut registry, DatasetKind::Directional, None)
        .unwrap();

    assert_eq!(stats.rows_in, 1);
    assert_eq!(stats.rows_out, 1);
    assert!(!stats.skipped);

    let data = registry
        .get(&registry::processed_key(DatasetKind::Directional))
        .unwrap();
    let header = registry
        .get(&registry::header_key(DatasetKind::Directional))
        .unwrap();
    assert_eq!(fs::read_to_string(data).unwrap(), "A|B|KNOWS\n");
    assert_eq!(
        fs::read_to_string(header).unwrap(),
        ":START_ID|:END_ID|:TYPE\n"
    );
}

#[test]
fn rerun_is_byte_identical() {
    let tmp = TempDir::new().unwrap();
    let mut registry = PathRegistry::load(tmp.path()).unwrap();
    seed_raw(
        tmp.path(),
        &mut registry,
        DatasetKind::BiDirectional,
        "[2, 1]|binds\n[1, 2]|binds\n[1, 3]|binds\n",
    );

    let pipeline = PreprocessPipeline::new(config(), tmp.path());

    pipeline
        .run_dataset(&mut registry, DatasetKind::BiDirectional, None)
        .unwrap();
    let data_path = registry
        .get(&registry::processed_key(DatasetKind::BiDirectional))
        .unwrap()
        .to_path_buf();
    let first = fs::read(&data_path).unwrap();

    let stats = pipeline
        .run_dataset(&mut registry, DatasetKind::BiDirectional, None)
        .unwrap();
    let second = fs::read(&data_path).unwrap();

    assert_eq!(first, second);
    assert_eq!(stats.pairs_collapsed, 1);
    assert_eq!(
        fs::read_to_string(&data_path).unwrap(),
        "1|2|BINDS\n1|3|BINDS\n"
    );
}

#[test]
fn empty_extract_is_skipped_not_fatal() {
    let tmp = TempDir::new().unwrap();
    let mut registry = PathRegistry::load(tmp.path()).unwrap();
    seed_raw(tmp.path(), &mut registry, DatasetKind::Directional, "");

    let pipeline = PreprocessPipeline::new(config(), tmp.path());
    let stats = pipeline
        .run_dataset(&mut registry, DatasetKind::Directional, None)
        .unwrap();

    assert!(stats.skipped);
    assert!(!registry.contains(&registry::processed_key(DatasetKind::Directional)));
}

#[test]
fn merge_produces_single_load_ready_pair() {
    let tmp = TempDir::new().unwrap();
    let mut registry = PathRegistry::load(tmp.path()).unwrap();
    seed_raw(
        tmp.path(),
        &mut registry,
        DatasetKind::Directional,
        "A|B|knows\n",
    );
    seed_raw(
        tmp.path(),
        &mut registry,
        DatasetKind::BiDirectional,
        "[C, D]|binds\n",
    );

    let pipeline = PreprocessPipeline::new(config(), tmp.path());
    pipeline
        .run_dataset(&mut registry, DatasetKind::Directional, None)
        .unwrap();
    pipeline
        .run_dataset(&mut registry, DatasetKind::BiDirectional, None)
        .unwrap();

    let merged = pipeline
        .merge_relationships(&mut registry, None)
        .unwrap()
        .unwrap();

    assert_eq!(
        fs::read_to_string(&merged).unwrap(),
        "A|B|KNOWS\nC|D|BINDS\n"
    );
    let header = registry
        .get(stevedore_core::registry::MERGED_RELATIONSHIPS_HEADER_KEY)
        .unwrap();
    assert_eq!(
        fs::read_to_string(header).unwrap(),
        ":START_ID|:END_ID|:TYPE\n"
    );
}

#[test]
fn merge_rejects_disagreeing_headers() {
    let tmp = TempDir::new().unwrap();
    let mut registry = PathRegistry::load(tmp.path()).unwrap();

    let mut cfg = config();
    // Give the bi-directional dataset an extra property so its header
    // cannot match the directional one.
    cfg.datasets[1]
        .columns
        .push(ColumnSpec::typed("ref_count", "int"));

    seed_raw(
        tmp.path(),
        &mut registry,
        DatasetKind::Directional,
        "A|B|knows\n",
    );
    seed_raw(
        tmp.path(),
        &mut registry,
        DatasetKind::BiDirectional,
        "[C, D]|binds|3\n",
    );

    let pipeline = PreprocessPipeline::new(cfg, tmp.path());
    pipeline
        .run_dataset(&mut registry, DatasetKind::Directional, None)
        .unwrap();
    pipeline
        .run_dataset(&mut registry, DatasetKind::BiDirectional, None)
        .unwrap();

    let err = pipeline
        .merge_relationships(&mut registry, None)
        .unwrap_err();
    assert!(matches!(err, stevedore_core::Error::SchemaMismatch { .. }));
    assert!(!tmp.path().join("relationships.txt").exists());
}

#[test]
fn merge_with_nothing_processed_registers_nothing() {
    let tmp = TempDir::new().unwrap();
    let mut registry = PathRegistry::load(tmp.path()).unwrap();
    seed_raw(tmp.path(), &mut registry, DatasetKind::Directional, "");

    let pipeline = PreprocessPipeline::new(config(), tmp.path());
    let stats = pipeline
        .run_dataset(&mut registry, DatasetKind::Directional, None)
        .unwrap();
    assert!(stats.skipped);

    let merged = pipeline.merge_relationships(&mut registry, None).unwrap();

    assert!(merged.is_none());
    assert!(!tmp.path().join("relationships.txt").exists());
    assert!(!registry.contains(registry::MERGED_RELATIONSHIPS_KEY));
    assert!(!registry.contains(registry::MERGED_RELATIONSHIPS_HEADER_KEY));
}

#[test]
fn node_pipeline_merges_duplicate_ids() {
    let tmp = TempDir::new().unwrap();
    let mut registry = PathRegistry::load(tmp.path()).unwrap();
    seed_raw(
        tmp.path(),
        &mut registry,
        DatasetKind::Node,
        "X|alpha|gene\nX|beta|gene\nY|gamma|protein\n",
    );

    let pipeline = PreprocessPipeline::new(config(), tmp.path());
    let stats = pipeline
        .run_dataset(&mut registry, DatasetKind::Node, Some("nodes"))
        .unwrap();

    assert_eq!(stats.rows_merged, 1);

    let data = tmp.path().join("nodes.txt");
    assert_eq!(
        fs::read_to_string(&data).unwrap(),
        "X|beta|GENE\nY|gamma|PROTEIN\n"
    );
    assert_eq!(
        fs::read_to_string(tmp.path().join("nodes_header.txt")).unwrap(),
        ":ID|name:string|:LABEL\n"
    );
}

#[test]
fn registry_persists_between_phases() {
    let tmp = TempDir::new().unwrap();
    {
        let mut registry = PathRegistry::load(tmp.path()).unwrap();
        seed_raw(
            tmp.path(),
            &mut registry,
            DatasetKind::Directional,
            "A|B|knows\n",
        );
        registry.save().unwrap();
    }

    let mut registry = PathRegistry::load(tmp.path()).unwrap();
    let pipeline = PreprocessPipeline::new(config(), tmp.path());
    let stats = pipeline
        .run_dataset(&mut registry, DatasetKind::Directional, None)
        .unwrap();
    assert_eq!(stats.rows_out, 1);
}
