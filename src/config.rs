use crate::error::ConfigError;
use dotenv::dotenv;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "todo-tui";

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub api_prefix: String,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: "http://localhost:8000".to_string(),
            api_prefix: String::new(),
            log_file: dirs::cache_dir().map(|dir| dir.join(APP_DIR).join("todo-tui.log")),
        }
    }
}

impl Config {
    /// Defaults, then `config.toml`, then `.env` and the process environment.
    pub fn load() -> Result<Config, ConfigError> {
        dotenv().ok();

        let mut config = match config_path() {
            Some(path) if path.exists() => Config::from_file(&path)?,
            _ => Config::default(),
        };
        config.apply_env(|key| env::var(key).ok());
        Ok(config.normalized())
    }

    pub fn from_file(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("TODO_BASE_URL") {
            self.base_url = url;
        }
        if let Some(prefix) = lookup("TODO_API_PREFIX") {
            self.api_prefix = prefix;
        }
        if let Some(file) = lookup("TODO_LOG_FILE") {
            self.log_file = if file.is_empty() {
                None
            } else {
                Some(PathBuf::from(file))
            };
        }
    }

    fn normalized(mut self) -> Config {
        self.base_url = self.base_url.trim().trim_end_matches('/').to_string();
        let prefix = self.api_prefix.trim().trim_matches('/');
        self.api_prefix = if prefix.is_empty() {
            String::new()
        } else {
            format!("/{}", prefix)
        };
        self
    }

    /// Root that endpoint paths such as `/todos` are appended to.
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, self.api_prefix)
    }
}

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
}
