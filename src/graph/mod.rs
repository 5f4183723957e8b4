use std::collections::HashMap;

use thiserror::Error;

use crate::core::package::{PackageId, Requirement, TestRequirement};
use crate::core::version::VersionError;

pub mod ops;
pub mod oracle;
pub mod viz;

/// Per-package ordered edge lists. Requirement edges must stay acyclic; test
/// edges are excluded from cycle checking because nothing can depend on a
/// package through them.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    pub requirements: HashMap<PackageId, Vec<Requirement>>,
    pub test_requirements: HashMap<PackageId, Vec<TestRequirement>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requirements_for(&self, package: &PackageId) -> &[Requirement] {
        self.requirements
            .get(package)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn test_requirements_for(&self, package: &PackageId) -> &[TestRequirement] {
        self.test_requirements
            .get(package)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Construction-time scenario errors. All of them mean the scenario
/// definition itself is wrong; none are retryable.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("invalid package identifier '{0}'")]
    InvalidIdentifier(String),
    #[error("package '{package}': {source}")]
    InvalidVersion {
        package: String,
        #[source]
        source: VersionError,
    },
    #[error("edge {from} -> {to}: {source}")]
    InvalidConstraint {
        from: PackageId,
        to: PackageId,
        #[source]
        source: VersionError,
    },
    #[error("duplicate edge {from} -> {to}")]
    DuplicateEdge { from: PackageId, to: PackageId },
    #[error("edge {from} -> {to} would create a cycle")]
    CycleDetected { from: PackageId, to: PackageId },
    #[error("unknown package '{0}'")]
    UnknownPackage(String),
}
