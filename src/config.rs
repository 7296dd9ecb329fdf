use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use log::LevelFilter;
use serde::Deserialize;

const CONFIG_ENV: &str = "PORTER_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "./porter.toml";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub seed: SeedConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: String,
    pub request_timeout_secs: u64,

    /// Map failures to 401/404/422/400 instead of answering everything with 200.
    /// The JSON payload is the same either way.
    pub strict_status_codes: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            address: "127.0.0.1:7878".to_string(),
            request_timeout_secs: 30,
            strict_status_codes: false,
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the SQLite file, or `:memory:`.
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            path: "./db.sqlite3".to_string(),
        }
    }
}

/// Argon2id cost parameters used for new password hashes.
/// Existing hashes carry their own parameters and keep verifying after a change.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub argon2_memory_kib: u32,
    pub argon2_iterations: u32,
    pub argon2_parallelism: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        SecurityConfig {
            argon2_memory_kib: argon2::Params::DEFAULT_M_COST,
            argon2_iterations: argon2::Params::DEFAULT_T_COST,
            argon2_parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub enabled: bool,
    pub username: String,
    pub password: String,
}

impl Default for SeedConfig {
    fn default() -> Self {
        SeedConfig {
            enabled: true,
            username: "admin".to_string(),
            password: "password".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: LevelFilter,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: LevelFilter::Debug,
        }
    }
}

impl Config {
    /// Load the config from `$PORTER_CONFIG`, falling back to `./porter.toml`.
    /// Missing default file means built-in defaults; a missing explicit file is an error.
    pub fn load() -> Result<Config, Error> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Config::from_file(Path::new(&path));
        }

        let path = Path::new(DEFAULT_CONFIG_PATH);
        if path.exists() {
            Config::from_file(path)
        } else {
            Ok(Config::default())
        }
    }

    pub fn from_file(path: &Path) -> Result<Config, Error> {
        let contents = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Config::parse(&contents).map_err(|source| Error::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(contents: &str) -> Result<Config, toml::de::Error> {
        toml::from_str(contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.server.address, "127.0.0.1:7878");
        assert!(!config.server.strict_status_codes);
        assert_eq!(config.database.path, "./db.sqlite3");
        assert!(config.seed.enabled);
        assert_eq!(config.seed.username, "admin");
        assert_eq!(config.log.level, LevelFilter::Debug);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::parse(
            r#"
            [server]
            strict_status_codes = true

            [log]
            level = "warn"

            [security]
            argon2_iterations = 3
            "#,
        )
        .unwrap();

        assert!(config.server.strict_status_codes);
        assert_eq!(config.server.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.log.level, LevelFilter::Warn);
        assert_eq!(config.security.argon2_iterations, 3);
        assert_eq!(
            config.security.argon2_memory_kib,
            argon2::Params::DEFAULT_M_COST
        );
    }

    #[test]
    fn bad_types_are_rejected() {
        assert!(Config::parse("[server]\nrequest_timeout_secs = \"soon\"").is_err());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = Config::from_file(Path::new("/nonexistent/porter.toml")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
