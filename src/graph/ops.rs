use std::collections::{HashMap, HashSet, VecDeque};

use crate::core::package::{FlagDefaults, PackageId, Requirement};
use crate::core::scenario::Scenario;
use crate::graph::DependencyGraph;

/// Packages reachable from `package` through requirement edges. Test edges
/// never propagate, so they are not followed. Sorted by name.
pub fn transitive_closure(graph: &DependencyGraph, package: &PackageId) -> Vec<PackageId> {
    gated_closure(graph, package, |_| true)
}

/// Packages whose public interface the queried package must also expose:
/// reachable through requirement edges whose `transitive_headers` resolves
/// to true. The first hop is gated like every other hop.
pub fn effective_headers_closure(
    graph: &DependencyGraph,
    package: &PackageId,
    defaults: FlagDefaults,
) -> Vec<PackageId> {
    gated_closure(graph, package, |edge| {
        edge.transitive_headers.resolve(defaults.transitive_headers)
    })
}

/// Same as the headers closure, gated on `transitive_libs`.
pub fn effective_link_closure(
    graph: &DependencyGraph,
    package: &PackageId,
    defaults: FlagDefaults,
) -> Vec<PackageId> {
    gated_closure(graph, package, |edge| {
        edge.transitive_libs.resolve(defaults.transitive_libs)
    })
}

fn gated_closure(
    graph: &DependencyGraph,
    package: &PackageId,
    follow: impl Fn(&Requirement) -> bool,
) -> Vec<PackageId> {
    let mut seen = HashSet::new();
    let mut stack = Vec::new();
    for edge in graph.requirements_for(package) {
        if follow(edge) {
            stack.push(edge.target.clone());
        }
    }
    while let Some(current) = stack.pop() {
        if !seen.insert(current.clone()) {
            continue;
        }
        for edge in graph.requirements_for(&current) {
            if follow(edge) {
                stack.push(edge.target.clone());
            }
        }
    }
    let mut out: Vec<_> = seen.into_iter().collect();
    out.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    out
}

/// Direct reverse requirement edges, in declaration order of the dependents.
pub fn dependents_of(scenario: &Scenario, package: &PackageId) -> Vec<PackageId> {
    scenario
        .packages()
        .iter()
        .filter(|candidate| {
            scenario
                .graph()
                .requirements_for(&candidate.id)
                .iter()
                .any(|edge| &edge.target == package)
        })
        .map(|candidate| candidate.id.clone())
        .collect()
}

/// Dependency-first order over all packages. Kahn's algorithm; declaration
/// order breaks ties so the output is deterministic. The graph is acyclic by
/// construction, so every package appears.
pub fn build_order(scenario: &Scenario) -> Vec<PackageId> {
    let graph = scenario.graph();
    let mut unbuilt_deps: HashMap<PackageId, usize> = HashMap::new();
    let mut dependents: HashMap<PackageId, Vec<PackageId>> = HashMap::new();

    for package in scenario.packages() {
        let deps = graph.requirements_for(&package.id);
        unbuilt_deps.insert(package.id.clone(), deps.len());
        for edge in deps {
            dependents
                .entry(edge.target.clone())
                .or_default()
                .push(package.id.clone());
        }
    }

    let mut queue: VecDeque<PackageId> = scenario
        .packages()
        .iter()
        .filter(|package| unbuilt_deps[&package.id] == 0)
        .map(|package| package.id.clone())
        .collect();
    let mut order = Vec::new();

    while let Some(package) = queue.pop_front() {
        order.push(package.clone());
        if let Some(next) = dependents.get(&package) {
            for dependent in next {
                if let Some(count) = unbuilt_deps.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        queue.push_back(dependent.clone());
                    }
                }
            }
        }
    }

    order
}
