use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Filter for the log file when `RUST_LOG` is unset.
    pub log_level: String,
    pub log_file: Option<String>,
    /// Maximum commits read per history fetch. Unbounded when unset.
    pub commit_limit: Option<usize>,
    /// Drop history results for a branch the cursor has since left.
    pub fence_stale_logs: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_file: None,
            commit_limit: None,
            fence_stale_logs: false,
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(
            get_user_config_path().as_deref(),
            Path::new("gitgud.toml"),
            environment(),
        )
    }

    /// Layers the user file, the local file and `env` over the defaults.
    /// Both files are optional.
    pub fn load(
        user_config: Option<&Path>,
        local_config: &Path,
        env: Environment,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = user_config {
            builder = builder.add_source(File::from(path).required(false));
        }
        let s = builder
            .add_source(File::from(local_config).required(false))
            .add_source(env)
            .build()?;

        s.try_deserialize()
    }

    pub fn log_path(&self) -> Option<PathBuf> {
        match &self.log_file {
            Some(path) => Some(PathBuf::from(shellexpand::tilde(path).into_owned())),
            None => dirs::cache_dir().map(|dir| dir.join("gitgud").join("gitgud.log")),
        }
    }
}

/// `GITGUD_*` variables, e.g. `GITGUD_COMMIT_LIMIT=200`.
pub fn environment() -> Environment {
    Environment::with_prefix("GITGUD").try_parsing(true)
}

pub fn get_user_config_path() -> Option<PathBuf> {
    let mut path = dirs::home_dir()?;
    path.push(".config");
    path.push("gitgud");
    path.push("config.toml");
    Some(path)
}
