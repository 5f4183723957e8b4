pub mod fixture;
pub mod resolve;

pub use fixture::{
    ConanConfig, DefaultsConfig, FixtureConfig, FixtureSettings, PackageEntry, RequireEntry,
    TestRequireEntry,
};

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("fixture not found")]
    FixtureNotFound,
    #[error("config file not found: {0}")]
    ConfigNotFound(PathBuf),
    #[error("invalid fixture root: {0}")]
    InvalidRoot(PathBuf),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config at {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
