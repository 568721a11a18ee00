use std::path::PathBuf;

use crate::cli::Cli;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub prompt: String,
    pub seed: Option<PathBuf>,
    pub colorize: bool,
}

impl From<Cli> for RuntimeConfig {
    fn from(cli: Cli) -> Self {
        Self {
            prompt: cli.prompt,
            seed: cli.seed,
            colorize: cli.color.should_colorize(),
        }
    }
}
