use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use stevedore_core::{PathRegistry, PreprocessConfig, PreprocessPipeline};

use super::Method;

pub fn run(
    config_path: &Path,
    base_path: &Path,
    methods: &[Method],
    file_name: Option<&str>,
) -> Result<()> {
    if file_name.is_some() && methods.len() > 1 {
        bail!("--file-name only applies to single-method runs");
    }

    let config = PreprocessConfig::load(config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    fs::create_dir_all(base_path)?;

    let mut registry = PathRegistry::load(base_path)?;
    let pipeline = PreprocessPipeline::new(config, base_path);

    for method in methods {
        match method.dataset_kind() {
            Some(kind) => {
                let stats = pipeline
                    .run_dataset(&mut registry, kind, file_name)
                    .with_context(|| format!("preprocessing {kind} failed"))?;
                if stats.skipped {
                    println!("{kind}: empty extract, nothing emitted");
                } else {
                    println!(
                        "{kind}: {} rows in, {} rows out ({} collapsed, {} dropped, {} merged)",
                        stats.rows_in,
                        stats.rows_out,
                        stats.pairs_collapsed,
                        stats.rows_dropped,
                        stats.rows_merged
                    );
                }
            }
            None => {
                match pipeline
                    .merge_relationships(&mut registry, file_name)
                    .context("relationship merge failed")?
                {
                    Some(path) => println!("merged relationships -> {}", path.display()),
                    None => println!("no relationship files to merge"),
                }
            }
        }
    }

    registry.save()?;
    Ok(())
}
