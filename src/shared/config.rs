//! Application configuration. Storage backend, paths, acting member.

use crate::domain::DomainError;
use serde::Deserialize;

/// Default data directory for the SQLite file.
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Which repository implementation to wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Directory holding `timeet.db`. Read from TIMEET_DATA_DIR.
    #[serde(default)]
    pub data_dir: Option<String>,

    /// `sqlite` (default) or `memory`. Read from TIMEET_STORAGE.
    #[serde(default)]
    pub storage: Option<StorageKind>,

    /// Member the process acts as. Read from TIMEET_MEMBER_ID.
    #[serde(default)]
    pub member_id: Option<i64>,

    /// Nickname used when the acting member has to be registered. Read from TIMEET_MEMBER_NICKNAME.
    #[serde(default)]
    pub member_nickname: Option<String>,

    /// Fixed seed for host reassignment; unset means OS entropy.
    /// Read from TIMEET_HOST_SELECTION_SEED.
    #[serde(default)]
    pub host_selection_seed: Option<u64>,
}

impl AppConfig {
    pub fn load() -> Result<Self, DomainError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        if let Ok(path) = std::env::var("TIMEET_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        // Environment wins over the file.
        c = c.add_source(config::Environment::with_prefix("TIMEET").try_parsing(true));
        c.build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| DomainError::Config(e.to_string()))
    }

    pub fn data_dir_or_default(&self) -> &str {
        self.data_dir.as_deref().unwrap_or(DEFAULT_DATA_DIR)
    }

    pub fn storage_or_default(&self) -> StorageKind {
        self.storage.unwrap_or_default()
    }

    /// Returns the acting member id. Defaults to 1.
    pub fn member_id_or_default(&self) -> i64 {
        self.member_id.unwrap_or(1)
    }

    pub fn member_nickname_or_default(&self) -> String {
        self.member_nickname
            .clone()
            .unwrap_or_else(|| format!("member-{}", self.member_id_or_default()))
    }
}
