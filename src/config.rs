use std::path::PathBuf;

use clap::Parser;

/// Command-line configuration for the `acorn` shell.
#[derive(Debug, Parser)]
#[command(name = "acorn", version, about = "A small teaching database")]
pub struct Config {
    /// Directory holding the .tbl and .idx files.
    #[arg(long, default_value = ".")]
    pub data_dir: PathBuf,
}

impl Config {
    pub fn from_args() -> Self {
        Config::parse()
    }
}
