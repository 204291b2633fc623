pub mod extract;
pub mod preprocess;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use stevedore_core::DatasetKind;

#[derive(Parser)]
#[command(
    name = "stvd",
    about = "Prepare relational extracts for graph bulk loading",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the configured extract queries and write raw dataset files
    Extract {
        /// Dataset schema configuration file
        #[arg(short, long)]
        config: PathBuf,
        /// Directory the raw files and path registry live in
        #[arg(short, long, default_value = "./data/processed")]
        base_path: PathBuf,
        /// Dataset kinds to extract (all configured kinds if omitted)
        #[arg(long = "dataset")]
        datasets: Vec<DatasetArg>,
    },
    /// Transform raw extracts into loader-ready data/header file pairs
    Preprocess {
        /// Dataset schema configuration file
        #[arg(short, long)]
        config: PathBuf,
        /// Directory the raw files and path registry live in
        #[arg(short, long, default_value = "./data/processed")]
        base_path: PathBuf,
        /// Transform methods to run, in order
        #[arg(long = "method", required = true)]
        methods: Vec<Method>,
        /// Output file name (single-method runs only)
        #[arg(long)]
        file_name: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DatasetArg {
    Directional,
    BiDirectional,
    Attribute,
    Nodes,
}

impl DatasetArg {
    pub const fn kind(self) -> DatasetKind {
        match self {
            Self::Directional => DatasetKind::Directional,
            Self::BiDirectional => DatasetKind::BiDirectional,
            Self::Attribute => DatasetKind::Attribute,
            Self::Nodes => DatasetKind::Node,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Method {
    Directional,
    BiDirectional,
    Attribute,
    Nodes,
    MergeRelationships,
}

impl Method {
    pub const fn dataset_kind(self) -> Option<DatasetKind> {
        match self {
            Self::Directional => Some(DatasetKind::Directional),
            Self::BiDirectional => Some(DatasetKind::BiDirectional),
            Self::Attribute => Some(DatasetKind::Attribute),
            Self::Nodes => Some(DatasetKind::Node),
            Self::MergeRelationships => None,
        }
    }
}
