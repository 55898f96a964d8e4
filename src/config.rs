use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Runtime settings. Defaults come from `Settings::default()`, then an
/// optional `config/default.toml`, then `BOARD_*` environment variables
/// (`BOARD_SERVER__PORT=8080`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub storage: StorageSettings,
    pub session: SessionSettings,
    pub posts: PostSettings,
    pub catalog: CatalogSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub allowed_origin: String,
    /// Seconds between background sweeps of expired sessions and stale posts.
    pub reaper_interval_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            allowed_origin: "http://localhost:3000".to_string(),
            reaper_interval_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub path: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: "data/board.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub root: String,
    /// Prefix of every canonical object URL handed out by the store.
    pub public_base_url: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            root: "data/objects".to_string(),
            public_base_url: "http://localhost:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub ttl_hours: i64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self { ttl_hours: 24 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PostSettings {
    /// Minutes until a post is archived by the reaper.
    pub ttl_minutes: i64,
}

impl Default for PostSettings {
    fn default() -> Self {
        Self { ttl_minutes: 15 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    pub base_url: String,
    pub max_character_id: u32,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            base_url: "https://rickandmortyapi.com/api".to_string(),
            max_character_id: 826,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;
pub const MAX_POST_TTL_MINUTES: i64 = 60 * 24 * 365;

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let settings: Settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(
                Environment::with_prefix("BOARD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Lifetimes must be positive and at most a year.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_SESSION_TTL_HOURS).contains(&self.session.ttl_hours) {
            return Err(ConfigError::Message(format!(
                "session.ttl_hours must be between 1 and {}, got {}",
                MAX_SESSION_TTL_HOURS, self.session.ttl_hours
            )));
        }
        if !(1..=MAX_POST_TTL_MINUTES).contains(&self.posts.ttl_minutes) {
            return Err(ConfigError::Message(format!(
                "posts.ttl_minutes must be between 1 and {}, got {}",
                MAX_POST_TTL_MINUTES, self.posts.ttl_minutes
            )));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
