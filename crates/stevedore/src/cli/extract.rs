use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use stevedore_core::{
    DatasetKind, ExtractProvider, PathRegistry, PostgresExtractor, PreprocessConfig,
    PreprocessPipeline,
};

use super::DatasetArg;

pub fn run(config_path: &Path, base_path: &Path, datasets: &[DatasetArg]) -> Result<()> {
    let config = PreprocessConfig::load(config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    fs::create_dir_all(base_path)?;

    let url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;

    let kinds: Vec<DatasetKind> = if datasets.is_empty() {
        config
            .datasets
            .iter()
            .filter(|s| s.query.is_some())
            .map(|s| s.kind)
            .collect()
    } else {
        datasets.iter().map(|d| d.kind()).collect()
    };

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let extractor = PostgresExtractor::connect(&url, &config).await?;
        let mut registry = PathRegistry::load(base_path)?;
        let pipeline = PreprocessPipeline::new(config, base_path);

        for kind in kinds {
            let table = extractor.fetch(kind).await?;
            let path = pipeline.write_raw(&mut registry, kind, &table, None)?;
            println!("{kind}: {} rows -> {}", table.row_count(), path.display());
        }

        registry.save()?;
        Ok(())
    })
}
