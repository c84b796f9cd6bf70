//! Command line arguments.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Deterministic data-model generator for leaf and spine VXLAN EVPN fabrics
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory holding the five variable files
    #[arg(short, long, default_value = "vars")]
    pub vars_dir: PathBuf,

    /// Output directory for the inventory and per-device data models
    #[arg(short, long, default_value = "output")]
    pub output_dir: PathBuf,

    /// Serialization format of the emitted files
    #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub format: OutputFormat,

    /// Validate the variable files and exit without writing anything
    #[arg(long)]
    pub check: bool,

    /// Skip input validation
    #[arg(long)]
    pub skip_validate: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Yaml,
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Yaml => "yml",
            OutputFormat::Json => "json",
        }
    }
}
