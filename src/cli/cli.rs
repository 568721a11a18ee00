use std::path::PathBuf;

use clap::Parser;

use crate::application::data::{ColorChoice, LogLevel};

/// Interactive shell over an in-memory directory tree.
#[derive(Parser, Debug, Clone)]
#[command(version)]
pub struct Cli {
    #[clap(long, short, default_value = "warn", value_enum)]
    pub log_level: LogLevel,

    /// Prompt printed before each command is read
    #[clap(long, short, default_value = "> ")]
    pub prompt: String,

    /// YAML file describing the tree to start with
    #[clap(long, short)]
    pub seed: Option<PathBuf>,

    /// When to print failures in color
    #[clap(long, default_value = "auto", value_enum)]
    pub color: ColorChoice,
}
