//! Service configuration

use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Path of the SQLite database file
    pub database: PathBuf,

    /// Number of rows a leaderboard page shows
    pub leaderboard_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: PathBuf::from("pupitre.db"),
            leaderboard_limit: 20,
        }
    }
}

impl Config {
    /// Read configuration from `PUPITRE_*` environment variables, falling
    /// back to the defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Config::default();
        Config {
            database: std::env::var("PUPITRE_DB")
                .map(PathBuf::from)
                .unwrap_or(defaults.database),
            leaderboard_limit: std::env::var("PUPITRE_LEADERBOARD_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.leaderboard_limit),
        }
    }
}
