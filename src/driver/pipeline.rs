use std::collections::HashSet;

use crate::core::fixture::Fixture;
use crate::core::package::PackageId;
use crate::driver::PackageManager;
use crate::emit::PYREQ_NAME;
use crate::error::{ArachneError, Result};
use crate::graph::oracle::{self, ResolutionPolicy, ResolutionReport};

/// Builds and exports every package, strictly sequentially, in declaration
/// order. A package is never handed to the tool before all of its
/// requirement targets have completed, and the first failure aborts the
/// remainder; no retries.
pub fn run(fixture: &Fixture, manager: &dyn PackageManager) -> Result<()> {
    prepare(fixture, manager)?;
    let order = declaration_order(fixture);
    build_sequence(fixture, manager, &order)
}

/// Renders the advisory dependency-graph report for every package, with the
/// same sequencing and abort rules as the build.
pub fn render(fixture: &Fixture, manager: &dyn PackageManager) -> Result<()> {
    for package in fixture.scenario.packages() {
        let dir = fixture.package_dir(package.id.as_str());
        manager
            .render_graph(&dir, &dir.join("graph.html"))
            .map_err(|source| ArachneError::Process {
                package: package.id.clone(),
                source,
            })?;
    }
    Ok(())
}

#[derive(Debug)]
pub enum VerifyVerdict {
    /// Every built package was predicted to succeed, and every
    /// predicted-failure package either failed at the abort point or was
    /// never reached.
    Confirmed,
    /// The tool failed on a package the oracle predicted would succeed.
    UnexpectedFailure {
        package: PackageId,
        code: Option<i32>,
    },
    /// The tool succeeded on a package the oracle predicted would fail.
    MissingFailure { package: PackageId },
}

#[derive(Debug)]
pub struct VerifyReport {
    pub predictions: ResolutionReport,
    pub verdict: VerifyVerdict,
    /// Packages after the abort point, never handed to the tool.
    pub skipped: Vec<PackageId>,
}

impl VerifyReport {
    pub fn confirmed(&self) -> bool {
        matches!(self.verdict, VerifyVerdict::Confirmed)
    }
}

/// Runs the build sequence and compares the external tool's actual verdicts
/// against the oracle's predictions.
pub fn verify(
    fixture: &Fixture,
    manager: &dyn PackageManager,
    policy: ResolutionPolicy,
) -> Result<VerifyReport> {
    let predictions = oracle::predict(&fixture.scenario, policy);
    prepare(fixture, manager)?;

    let order = declaration_order(fixture);
    let mut completed: HashSet<PackageId> = HashSet::new();
    for (idx, package) in order.iter().enumerate() {
        check_ordering(fixture, &completed, package)?;
        let predicted_failure = predictions
            .outcome_for(package)
            .map(|outcome| !outcome.is_success())
            .unwrap_or(false);
        let dir = fixture.package_dir(package.as_str());
        let result = manager.build(&dir).and_then(|_| manager.export(&dir));
        match result {
            Ok(()) if predicted_failure => {
                return Ok(VerifyReport {
                    predictions,
                    verdict: VerifyVerdict::MissingFailure {
                        package: package.clone(),
                    },
                    skipped: order[idx + 1..].to_vec(),
                });
            }
            Ok(()) => {
                completed.insert(package.clone());
            }
            Err(_) if predicted_failure => {
                return Ok(VerifyReport {
                    predictions,
                    verdict: VerifyVerdict::Confirmed,
                    skipped: order[idx + 1..].to_vec(),
                });
            }
            Err(failure) => {
                return Ok(VerifyReport {
                    predictions,
                    verdict: VerifyVerdict::UnexpectedFailure {
                        package: package.clone(),
                        code: failure.exit_code(),
                    },
                    skipped: order[idx + 1..].to_vec(),
                });
            }
        }
    }

    Ok(VerifyReport {
        predictions,
        verdict: VerifyVerdict::Confirmed,
        skipped: Vec::new(),
    })
}

fn prepare(fixture: &Fixture, manager: &dyn PackageManager) -> Result<()> {
    let base = PackageId::new(PYREQ_NAME);
    manager
        .prepare(&fixture.output_dir())
        .map_err(|source| ArachneError::Process {
            package: base.clone(),
            source,
        })?;
    manager
        .export_base(&fixture.package_dir(PYREQ_NAME))
        .map_err(|source| ArachneError::Process {
            package: base,
            source,
        })
}

fn declaration_order(fixture: &Fixture) -> Vec<PackageId> {
    fixture
        .scenario
        .packages()
        .iter()
        .map(|package| package.id.clone())
        .collect()
}

pub(crate) fn build_sequence(
    fixture: &Fixture,
    manager: &dyn PackageManager,
    order: &[PackageId],
) -> Result<()> {
    let mut completed: HashSet<PackageId> = HashSet::new();
    for package in order {
        check_ordering(fixture, &completed, package)?;
        let dir = fixture.package_dir(package.as_str());
        manager
            .build(&dir)
            .and_then(|_| manager.export(&dir))
            .map_err(|source| ArachneError::Process {
                package: package.clone(),
                source,
            })?;
        completed.insert(package.clone());
    }
    Ok(())
}

fn check_ordering(
    fixture: &Fixture,
    completed: &HashSet<PackageId>,
    package: &PackageId,
) -> Result<()> {
    for edge in fixture.scenario.graph().requirements_for(package) {
        if !completed.contains(&edge.target) {
            return Err(ArachneError::OutOfOrder {
                package: package.clone(),
                missing: edge.target.clone(),
            });
        }
    }
    Ok(())
}
