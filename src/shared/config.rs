//! Application configuration. Listen address, public URL, storage backend.

use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Where clients are stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// Lost on restart.
    #[default]
    Memory,
    /// `{data_dir}/clients.json`
    Json,
    /// `{data_dir}/clients.db`
    Sqlite,
}

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Socket address the HTTP server binds to. Read from LMS_LISTEN_ADDR.
    #[serde(default)]
    pub listen_addr: Option<String>,

    /// Base URL used in Location headers and links. Read from LMS_PUBLIC_URL.
    #[serde(default)]
    pub public_url: Option<String>,

    /// Storage backend: memory, json or sqlite. Read from LMS_STORAGE.
    #[serde(default)]
    pub storage: Option<StorageKind>,

    /// Directory for the json/sqlite backends. Read from LMS_DATA_DIR.
    #[serde(default)]
    pub data_dir: Option<String>,
}

impl AppConfig {
    /// Environment (LMS_*) overrides the optional file named by LMS_CONFIG.
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        if let Ok(path) = std::env::var("LMS_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        c = c.add_source(config::Environment::with_prefix("LMS"));
        c.build()?.try_deserialize()
    }

    pub fn listen_addr_or_default(&self) -> String {
        self.listen_addr
            .clone()
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string())
    }

    /// Defaults to `http://{listen_addr}`. Trailing slashes are stripped.
    pub fn public_url_or_default(&self) -> String {
        self.public_url
            .clone()
            .unwrap_or_else(|| format!("http://{}", self.listen_addr_or_default()))
            .trim_end_matches('/')
            .to_string()
    }

    pub fn storage_or_default(&self) -> StorageKind {
        self.storage.unwrap_or_default()
    }

    pub fn data_dir_or_default(&self) -> PathBuf {
        PathBuf::from(self.data_dir.as_deref().unwrap_or(DEFAULT_DATA_DIR))
    }
}
