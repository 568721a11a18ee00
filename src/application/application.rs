use std::io;

use snafu::Snafu;
use snafu::prelude::*;
use tracing::{debug, info};

use crate::application::RuntimeConfig;
use crate::namespace::NamespaceTree;
use crate::seed::{Seed, SeedError};
use crate::session::{Session, SessionError, SessionOptions};

pub struct Application;

impl Application {
    pub async fn run(app_config: impl Into<RuntimeConfig>) -> Result<(), ApplicationError> {
        let app_config: RuntimeConfig = app_config.into();
        debug!("Runtime config: {:?}", app_config);

        let tree = match &app_config.seed {
            Some(path) => Seed::load(path).await.context(SeedLoadSnafu)?,
            None => {
                info!("No seed file given, starting with an empty tree");
                NamespaceTree::new()
            }
        };

        colored::control::set_override(app_config.colorize);
        let options = SessionOptions {
            prompt: app_config.prompt,
            colorize: app_config.colorize,
        };

        let stdin = io::stdin();
        let stdout = io::stdout();
        Session::new(tree, options)
            .run(stdin.lock(), stdout.lock())
            .context(SessionRunSnafu)?;

        Ok(())
    }
}

#[derive(Debug, Snafu)]
pub enum ApplicationError {
    #[snafu(display("Critical failure encountered while loading the seed file"))]
    SeedLoadError { source: SeedError },
    #[snafu(display("Critical failure encountered during the session"))]
    SessionRunError { source: SessionError },
}
