use std::path::PathBuf;

use crate::config::Config;
use crate::error::{LexisError, Result};
use crate::search::{Profile, SearchClient};

pub struct AppContext {
    /// Explicit config file, if one was given.
    pub config_path: Option<PathBuf>,
    pub config: Config,
    /// `--profile` from the command line.
    pub profile_override: Option<PathBuf>,
    pub robot_mode: bool,
    pub verbosity: u8,
}

impl AppContext {
    pub fn from_cli(cli: &crate::cli::Cli) -> Result<Self> {
        let config = Config::load(cli.config.as_deref())?;
        Ok(Self {
            config_path: cli.config.clone(),
            config,
            profile_override: cli.profile.clone(),
            robot_mode: cli.robot,
            verbosity: cli.verbose,
        })
    }

    /// Profile path from `--profile`, else `search.profile_path`.
    pub fn profile_path(&self) -> Result<PathBuf> {
        self.profile_override
            .clone()
            .or_else(|| self.config.search.profile_path.clone())
            .ok_or_else(|| {
                LexisError::MissingConfig(
                    "no search profile; pass --profile or set search.profile_path".to_string(),
                )
            })
    }

    pub fn search_client(&self) -> Result<(SearchClient, Profile)> {
        let path = self.profile_path()?;
        SearchClient::from_profile_path(&path, &self.config.search)
    }

    /// Progress bars only make sense for a human on a terminal.
    #[must_use]
    pub const fn show_progress(&self) -> bool {
        !self.robot_mode
    }
}
