use anyhow::Result;
use clap::Parser;

mod cli;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Extract {
            config,
            base_path,
            datasets,
        } => cli::extract::run(&config, &base_path, &datasets),
        Commands::Preprocess {
            config,
            base_path,
            methods,
            file_name,
        } => cli::preprocess::run(&config, &base_path, &methods, file_name.as_deref()),
    }
}
