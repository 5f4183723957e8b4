use std::path::Path;

use thiserror::Error;

pub mod conan;
pub mod pipeline;

/// Abnormal termination of an external tool invocation. Carries the command
/// line verbatim; the pipeline wraps it with the failing package's identity.
#[derive(Debug, Error)]
pub enum ProcessFailure {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to capture output of `{command}`: {source}")]
    Capture {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` exited with status {code}")]
    Exited { command: String, code: i32 },
    #[error("`{command}` terminated by signal")]
    Terminated { command: String },
}

impl ProcessFailure {
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ProcessFailure::Exited { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// The external package manager, as an injected capability so the pipeline
/// and the verify loop can run against a fake in tests. Real dependency
/// resolution, compilation, and conflict detection all live behind this
/// boundary.
pub trait PackageManager {
    /// One-time cache bootstrap for a fixture run.
    fn prepare(&self, root: &Path) -> Result<(), ProcessFailure>;
    /// Exports the shared python-require base package.
    fn export_base(&self, dir: &Path) -> Result<(), ProcessFailure>;
    fn build(&self, dir: &Path) -> Result<(), ProcessFailure>;
    fn export(&self, dir: &Path) -> Result<(), ProcessFailure>;
    /// Advisory graph rendering; not required for correctness.
    fn render_graph(&self, dir: &Path, out: &Path) -> Result<(), ProcessFailure>;
}
