use std::collections::HashSet;

use crate::core::package::PackageId;
use crate::core::scenario::Scenario;
use crate::core::version::{Constraint, Version};

/// How the external package manager is assumed to reconcile two constraints
/// on the same transitive target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionPolicy {
    /// Constraints must be textually identical pins.
    Pinned,
    /// Constraints are compatible iff their ranges intersect; a pin is a
    /// single-point range.
    Ranged,
}

impl ResolutionPolicy {
    pub fn parse(input: &str) -> Option<Self> {
        match input.to_ascii_lowercase().as_str() {
            "pinned" => Some(ResolutionPolicy::Pinned),
            "ranged" => Some(ResolutionPolicy::Ranged),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResolutionPolicy::Pinned => "pinned",
            ResolutionPolicy::Ranged => "ranged",
        }
    }
}

/// One declared constraint as seen from a resolving package's universe.
#[derive(Debug, Clone)]
pub struct ConstraintSource {
    pub from: PackageId,
    pub target: PackageId,
    pub constraint: Constraint,
    pub test_only: bool,
    pub order: usize,
}

#[derive(Debug, Clone)]
pub struct Conflict {
    pub dependency: PackageId,
    pub first: ConstraintSource,
    pub second: ConstraintSource,
}

#[derive(Debug, Clone)]
pub struct Unsatisfied {
    pub source: ConstraintSource,
    pub declared: Version,
}

/// Per-package verdict. Conflicts are reportable data, not errors: they are
/// the assertions the fixture exists to exercise.
#[derive(Debug, Clone)]
pub enum Outcome {
    Success,
    Conflict(Conflict),
    Unsatisfied(Unsatisfied),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

#[derive(Debug, Clone)]
pub struct PackageVerdict {
    pub package: PackageId,
    pub outcome: Outcome,
}

#[derive(Debug, Clone)]
pub struct ResolutionReport {
    pub policy: ResolutionPolicy,
    pub verdicts: Vec<PackageVerdict>,
}

impl ResolutionReport {
    pub fn outcome_for(&self, package: &PackageId) -> Option<&Outcome> {
        self.verdicts
            .iter()
            .find(|verdict| &verdict.package == package)
            .map(|verdict| &verdict.outcome)
    }

    pub fn all_success(&self) -> bool {
        self.verdicts.iter().all(|v| v.outcome.is_success())
    }
}

/// Pure function of (scenario, policy): predicts, for every package in
/// declaration order, whether the external resolver can succeed, and if not,
/// which pair of edges is responsible. Re-evaluated fully on each call.
pub fn predict(scenario: &Scenario, policy: ResolutionPolicy) -> ResolutionReport {
    let verdicts = scenario
        .packages()
        .iter()
        .map(|package| PackageVerdict {
            package: package.id.clone(),
            outcome: predict_package(scenario, &package.id, policy),
        })
        .collect();
    ResolutionReport { policy, verdicts }
}

fn predict_package(scenario: &Scenario, package: &PackageId, policy: ResolutionPolicy) -> Outcome {
    let universe = constraint_universe(scenario, package);

    // First incompatible pair in declaration order, grouped per target.
    let mut targets_seen: Vec<&PackageId> = Vec::new();
    for source in &universe {
        if targets_seen.contains(&&source.target) {
            continue;
        }
        targets_seen.push(&source.target);
        let group: Vec<&ConstraintSource> = universe
            .iter()
            .filter(|candidate| candidate.target == source.target)
            .collect();
        for (idx, first) in group.iter().enumerate() {
            for second in &group[idx + 1..] {
                if !compatible(&first.constraint, &second.constraint, policy) {
                    return Outcome::Conflict(Conflict {
                        dependency: source.target.clone(),
                        first: (*first).clone(),
                        second: (*second).clone(),
                    });
                }
            }
        }
    }

    // The tool can never resolve a version that was never declared,
    // whatever the policy.
    for source in &universe {
        if let Some(target) = scenario.package(&source.target) {
            if !source.constraint.matches(&target.version.semver) {
                return Outcome::Unsatisfied(Unsatisfied {
                    source: source.clone(),
                    declared: target.version.clone(),
                });
            }
        }
    }

    Outcome::Success
}

fn compatible(a: &Constraint, b: &Constraint, policy: ResolutionPolicy) -> bool {
    match policy {
        ResolutionPolicy::Pinned => a.raw == b.raw,
        ResolutionPolicy::Ranged => a.overlaps(b),
    }
}

/// Every constraint that enters `package`'s own resolution: its requirement
/// and test-requirement edges, plus the requirement edges of everything
/// reachable from those targets. Other packages' test edges never propagate
/// into the universe. Ordered by declaration stamp.
fn constraint_universe(scenario: &Scenario, package: &PackageId) -> Vec<ConstraintSource> {
    let graph = scenario.graph();
    let mut sources = Vec::new();
    let mut frontier = Vec::new();

    for edge in graph.requirements_for(package) {
        sources.push(ConstraintSource {
            from: package.clone(),
            target: edge.target.clone(),
            constraint: edge.constraint.clone(),
            test_only: false,
            order: edge.order,
        });
        frontier.push(edge.target.clone());
    }
    for edge in graph.test_requirements_for(package) {
        sources.push(ConstraintSource {
            from: package.clone(),
            target: edge.target.clone(),
            constraint: edge.constraint.clone(),
            test_only: true,
            order: edge.order,
        });
        frontier.push(edge.target.clone());
    }

    let mut seen = HashSet::new();
    seen.insert(package.clone());
    while let Some(current) = frontier.pop() {
        if !seen.insert(current.clone()) {
            continue;
        }
        for edge in graph.requirements_for(&current) {
            sources.push(ConstraintSource {
                from: current.clone(),
                target: edge.target.clone(),
                constraint: edge.constraint.clone(),
                test_only: false,
                order: edge.order,
            });
            frontier.push(edge.target.clone());
        }
    }

    sources.sort_by_key(|source| source.order);
    sources
}

#[cfg(test)]
mod tests {
    use crate::core::package::PackageId;
    use crate::core::scenario::Scenario;
    use crate::graph::oracle::{predict, Outcome, ResolutionPolicy};

    fn outcome<'a>(
        report: &'a crate::graph::oracle::ResolutionReport,
        name: &str,
    ) -> &'a Outcome {
        report
            .outcome_for(&PackageId::new(name))
            .expect("verdict present")
    }

    /// util; lib_a requires util; lib_b test-requires util and lib_a, all at
    /// the same range.
    fn baseline(range: &str) -> Scenario {
        let mut scenario = Scenario::new();
        let util = scenario.library("util", "0.1.0").expect("util").id();
        let lib_a = scenario
            .library("lib_a", "0.1.0")
            .expect("lib_a")
            .requires(&util, range)
            .expect("edge")
            .id();
        scenario
            .library("lib_b", "0.1.0")
            .expect("lib_b")
            .test_requires(&util, range)
            .expect("test edge")
            .test_requires(&lib_a, range)
            .expect("test edge");
        scenario
    }

    /// Adds lib_c, which reaches util both directly and through lib_a.
    fn with_shared_transitive(range: &str, direct: &str) -> Scenario {
        let mut scenario = baseline(range);
        let util = PackageId::new("util");
        let lib_a = PackageId::new("lib_a");
        let lib_c = scenario.library("lib_c", "0.1.0").expect("lib_c").id();
        scenario
            .test_require(&lib_c, &lib_a, range)
            .expect("lib_c -> lib_a");
        scenario
            .test_require(&lib_c, &util, direct)
            .expect("lib_c -> util");
        scenario
    }

    #[test]
    fn baseline_succeeds_under_both_policies() {
        let scenario = baseline("[>=0.1.0]");
        for policy in [ResolutionPolicy::Pinned, ResolutionPolicy::Ranged] {
            let report = predict(&scenario, policy);
            assert!(report.all_success(), "policy {:?}", policy);
        }
    }

    #[test]
    fn shared_transitive_with_identical_ranges_succeeds_under_ranged() {
        let scenario = with_shared_transitive("[>=0.1.0]", "[>=0.1.0]");
        let report = predict(&scenario, ResolutionPolicy::Ranged);
        assert!(report.all_success());
        // Identical literals also satisfy the pinned policy's textual rule.
        let report = predict(&scenario, ResolutionPolicy::Pinned);
        assert!(report.all_success());
    }

    #[test]
    fn identical_literal_pins_succeed_under_pinned() {
        let scenario = with_shared_transitive("0.1.0", "0.1.0");
        let report = predict(&scenario, ResolutionPolicy::Pinned);
        assert!(report.all_success());
    }

    #[test]
    fn differing_pins_conflict_under_both_policies() {
        let mut scenario = Scenario::new();
        let util = scenario.library("util", "0.1.0").expect("util").id();
        let lib_a = scenario
            .library("lib_a", "0.1.0")
            .expect("lib_a")
            .requires(&util, "0.1.0")
            .expect("edge")
            .id();
        let lib_c = scenario.library("lib_c", "0.1.0").expect("lib_c").id();
        scenario
            .test_require(&lib_c, &lib_a, "0.1.0")
            .expect("lib_c -> lib_a");
        scenario
            .test_require(&lib_c, &util, "0.2.0")
            .expect("lib_c -> util");

        for policy in [ResolutionPolicy::Pinned, ResolutionPolicy::Ranged] {
            let report = predict(&scenario, policy);
            match outcome(&report, "lib_c") {
                Outcome::Conflict(conflict) => {
                    assert_eq!(conflict.dependency.as_str(), "util");
                }
                other => panic!("expected conflict under {:?}, got {:?}", policy, other),
            }
            assert!(outcome(&report, "lib_a").is_success());
            assert!(outcome(&report, "util").is_success());
        }
    }

    #[test]
    fn textually_distinct_but_overlapping_ranges_conflict_only_under_pinned() {
        let scenario = with_shared_transitive("[>=0.1.0]", "[>=0.1.0 <2.0.0]");
        let report = predict(&scenario, ResolutionPolicy::Ranged);
        assert!(report.all_success());
        let report = predict(&scenario, ResolutionPolicy::Pinned);
        assert!(matches!(outcome(&report, "lib_c"), Outcome::Conflict(_)));
    }

    #[test]
    fn conflict_reports_first_pair_in_declaration_order() {
        let mut scenario = Scenario::new();
        let util = scenario.library("util", "0.1.0").expect("util").id();
        let app = scenario.library("app", "0.1.0").expect("app").id();
        scenario.require(&app, &util, "0.1.0").expect("app -> util");
        scenario
            .test_require(&app, &util, "0.2.0")
            .expect("app test -> util");

        let report = predict(&scenario, ResolutionPolicy::Pinned);
        match outcome(&report, "app") {
            Outcome::Conflict(conflict) => {
                assert_eq!(conflict.first.constraint.raw, "0.1.0");
                assert!(!conflict.first.test_only);
                assert_eq!(conflict.second.constraint.raw, "0.2.0");
                assert!(conflict.second.test_only);
                assert!(conflict.first.order < conflict.second.order);
            }
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[test]
    fn other_packages_test_edges_never_contaminate_a_universe() {
        // lib_b's test edge pins a different util than lib_a's requirement;
        // lib_a must stay clean because test edges are not exported.
        let mut scenario = Scenario::new();
        let util = scenario.library("util", "0.1.0").expect("util").id();
        let lib_a = scenario
            .library("lib_a", "0.1.0")
            .expect("lib_a")
            .requires(&util, "0.1.0")
            .expect("edge")
            .id();
        let lib_b = scenario.library("lib_b", "0.1.0").expect("lib_b").id();
        scenario
            .test_require(&lib_b, &util, "0.2.0")
            .expect("lib_b test -> util");
        scenario
            .require(&lib_b, &lib_a, "0.1.0")
            .expect("lib_b -> lib_a");

        let report = predict(&scenario, ResolutionPolicy::Pinned);
        assert!(outcome(&report, "lib_a").is_success());
        // lib_b's own universe does see both and conflicts.
        assert!(matches!(outcome(&report, "lib_b"), Outcome::Conflict(_)));
    }

    #[test]
    fn constraint_missing_the_declared_version_is_unsatisfied() {
        let mut scenario = Scenario::new();
        let util = scenario.library("util", "0.1.0").expect("util").id();
        let lib_a = scenario.library("lib_a", "0.1.0").expect("lib_a").id();
        scenario
            .require(&lib_a, &util, "[>=0.2.0]")
            .expect("edge above declared version");

        for policy in [ResolutionPolicy::Pinned, ResolutionPolicy::Ranged] {
            let report = predict(&scenario, policy);
            match outcome(&report, "lib_a") {
                Outcome::Unsatisfied(unsatisfied) => {
                    assert_eq!(unsatisfied.declared.raw, "0.1.0");
                    assert_eq!(unsatisfied.source.target.as_str(), "util");
                }
                other => panic!("expected unsatisfied, got {:?}", other),
            }
        }
    }

    #[test]
    fn policy_parse_accepts_known_names_only() {
        assert_eq!(
            ResolutionPolicy::parse("pinned"),
            Some(ResolutionPolicy::Pinned)
        );
        assert_eq!(
            ResolutionPolicy::parse("Ranged"),
            Some(ResolutionPolicy::Ranged)
        );
        assert_eq!(ResolutionPolicy::parse("loose"), None);
    }
}
