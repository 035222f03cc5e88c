//! Resolved runtime settings.

use std::path::PathBuf;

pub const DEFAULT_API_BASE: &str = "https://pokeapi.co/api/v2";
pub const CATALOG_LIMIT: usize = 151;
const APP_DIR: &str = "poketeam";

#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub api_base: String,
    pub catalog_limit: usize,
    pub data_dir: PathBuf,
    pub log_file: Option<PathBuf>,
    pub http_cache: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            catalog_limit: CATALOG_LIMIT,
            data_dir: default_data_dir(),
            log_file: None,
            http_cache: true,
        }
    }
}

impl Settings {
    pub fn session_path(&self) -> PathBuf {
        self.data_dir.join("session.json")
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join("poketeam.log"))
    }

    pub fn http_cache_dir(&self) -> Option<PathBuf> {
        self.http_cache.then(|| self.data_dir.join("http"))
    }
}

pub fn default_data_dir() -> PathBuf {
    dirs_next::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}
