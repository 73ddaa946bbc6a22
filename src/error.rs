use std::path::PathBuf;

use thiserror::Error;

/// Boxed driver error so the binder and menus stay independent of the SQL backend.
pub type DriverError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to create config directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config JSON {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to marshal config to JSON: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to remove config file {path}: {source}")]
    Remove {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid server name '{0}'")]
    InvalidServerName(String),

    #[error("failed to read script catalog {path}: {source}")]
    ReadCatalog {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse script catalog {path}: {source}")]
    ParseCatalog {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error("missing parameter: {0}")]
    MissingParameter(String),

    #[error("failed to prepare statement: {0}")]
    Prepare(#[source] DriverError),

    #[error("failed to execute statement: {0}")]
    Exec(#[source] DriverError),

    #[error("failed to open database: {0}")]
    Connection(#[source] DriverError),

    #[error("invalid connection string: {0}")]
    InvalidConnectionString(String),

    #[error("not connected")]
    NotConnected,

    #[error("server config error: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MenuError {
    #[error("menu node '{0}' is not a submenu")]
    NotASubmenu(String),
}
