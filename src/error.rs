use thiserror::Error;

use crate::config::ConfigError;
use crate::core::package::PackageId;
use crate::driver::ProcessFailure;
use crate::graph::GraphError;

#[derive(Debug, Error)]
pub enum ArachneError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("scenario error: {0}")]
    Graph(#[from] GraphError),
    #[error("package '{package}': {source}")]
    Process {
        package: PackageId,
        #[source]
        source: ProcessFailure,
    },
    #[error("package '{package}' cannot build before its dependency '{missing}'")]
    OutOfOrder {
        package: PackageId,
        missing: PackageId,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ArachneError>;
