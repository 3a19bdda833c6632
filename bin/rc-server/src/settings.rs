//! Layered settings: built-in defaults, then `config/default.toml` if present,
//! then `RC__SECTION__KEY` environment variables.

use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub media: MediaSettings,
    pub auth: AuthSettings,
    #[serde(default)]
    pub cors: CorsSettings,
}

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Defaults to the number of physical cores when unset.
    pub workers: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    #[serde(deserialize_with = "secret")]
    pub url: SecretString,
}

#[derive(Debug, Deserialize)]
pub struct MediaSettings {
    pub root: PathBuf,
    pub url_prefix: String,
}

#[derive(Debug, Deserialize)]
pub struct AuthSettings {
    pub token_ttl_hours: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct CorsSettings {
    pub allowed_origin: Option<String>,
}

fn secret<'de, D: Deserializer<'de>>(d: D) -> Result<SecretString, D::Error> {
    String::deserialize(d).map(SecretString::from)
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_builder(
            Config::builder()
                .add_source(File::with_name("config/default").required(false))
                .add_source(
                    Environment::with_prefix("RC")
                        .prefix_separator("__")
                        .separator("__")
                        .try_parsing(true),
                ),
        )
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        builder
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("database.url", "sqlite:rc.db")?
            .set_default("media.root", "./data/uploads")?
            .set_default("media.url_prefix", "/static/uploads")?
            .set_default("auth.token_ttl_hours", 24)?
            .build()?
            .try_deserialize()
    }
}
