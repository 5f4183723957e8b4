use std::collections::HashMap;

use crate::config::FixtureConfig;
use crate::core::package::{FlagValue, Package, PackageId, Requirement, TestRequirement};
use crate::core::version::{Constraint, Version};
use crate::graph::{DependencyGraph, GraphError};

/// Owns every package and edge of one test topology. Packages are created
/// through `library`, edges through the returned handle or the `require*`
/// methods; all construction invariants (identifier validity, edge
/// uniqueness, acyclicity) are enforced here, so a built scenario is always
/// safe to traverse.
#[derive(Debug, Default)]
pub struct Scenario {
    packages: Vec<Package>,
    index: HashMap<PackageId, usize>,
    graph: DependencyGraph,
    next_order: usize,
}

impl Scenario {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replays a fixture definition through the builder so config-defined
    /// scenarios enforce the same invariants as code-defined ones. Edges may
    /// only name packages declared earlier in the file.
    pub fn from_config(config: &FixtureConfig) -> Result<Self, GraphError> {
        let mut scenario = Self::new();
        for entry in &config.packages {
            let id = scenario.library(&entry.name, &entry.version)?.id();
            for require in &entry.requires {
                let target = scenario.lookup(&require.package)?;
                scenario.require_with(
                    &id,
                    &target,
                    &require.constraint,
                    FlagValue::from_option(require.transitive_headers),
                    FlagValue::from_option(require.transitive_libs),
                )?;
            }
            for require in &entry.test_requires {
                let target = scenario.lookup(&require.package)?;
                scenario.test_require(&id, &target, &require.constraint)?;
            }
        }
        Ok(scenario)
    }

    pub fn library(&mut self, name: &str, version: &str) -> Result<PackageHandle<'_>, GraphError> {
        if !is_valid_identifier(name) {
            return Err(GraphError::InvalidIdentifier(name.to_string()));
        }
        let id = PackageId::new(name);
        if self.index.contains_key(&id) {
            return Err(GraphError::InvalidIdentifier(name.to_string()));
        }
        let version = Version::parse(version).map_err(|source| GraphError::InvalidVersion {
            package: name.to_string(),
            source,
        })?;
        self.index.insert(id.clone(), self.packages.len());
        self.packages.push(Package {
            id: id.clone(),
            version,
        });
        Ok(PackageHandle { scenario: self, id })
    }

    pub fn require(
        &mut self,
        from: &PackageId,
        to: &PackageId,
        constraint: &str,
    ) -> Result<(), GraphError> {
        self.require_with(from, to, constraint, FlagValue::Unset, FlagValue::Unset)
    }

    pub fn require_with(
        &mut self,
        from: &PackageId,
        to: &PackageId,
        constraint: &str,
        transitive_headers: FlagValue,
        transitive_libs: FlagValue,
    ) -> Result<(), GraphError> {
        self.check_endpoints(from, to)?;
        if self
            .graph
            .requirements_for(from)
            .iter()
            .any(|edge| &edge.target == to)
        {
            return Err(GraphError::DuplicateEdge {
                from: from.clone(),
                to: to.clone(),
            });
        }
        if from == to || self.reaches(to, from) {
            return Err(GraphError::CycleDetected {
                from: from.clone(),
                to: to.clone(),
            });
        }
        let constraint = self.parse_constraint(from, to, constraint)?;
        let order = self.stamp();
        self.graph
            .requirements
            .entry(from.clone())
            .or_default()
            .push(Requirement {
                target: to.clone(),
                constraint,
                transitive_headers,
                transitive_libs,
                order,
            });
        Ok(())
    }

    pub fn test_require(
        &mut self,
        from: &PackageId,
        to: &PackageId,
        constraint: &str,
    ) -> Result<(), GraphError> {
        self.check_endpoints(from, to)?;
        if self
            .graph
            .test_requirements_for(from)
            .iter()
            .any(|edge| &edge.target == to)
        {
            return Err(GraphError::DuplicateEdge {
                from: from.clone(),
                to: to.clone(),
            });
        }
        let constraint = self.parse_constraint(from, to, constraint)?;
        let order = self.stamp();
        self.graph
            .test_requirements
            .entry(from.clone())
            .or_default()
            .push(TestRequirement {
                target: to.clone(),
                constraint,
                order,
            });
        Ok(())
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    pub fn package(&self, id: &PackageId) -> Option<&Package> {
        self.index.get(id).map(|&idx| &self.packages[idx])
    }

    pub fn contains(&self, id: &PackageId) -> bool {
        self.index.contains_key(id)
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    fn lookup(&self, name: &str) -> Result<PackageId, GraphError> {
        let id = PackageId::new(name);
        if !self.index.contains_key(&id) {
            return Err(GraphError::UnknownPackage(name.to_string()));
        }
        Ok(id)
    }

    fn check_endpoints(&self, from: &PackageId, to: &PackageId) -> Result<(), GraphError> {
        for id in [from, to] {
            if !self.index.contains_key(id) {
                return Err(GraphError::UnknownPackage(id.as_str().to_string()));
            }
        }
        Ok(())
    }

    fn parse_constraint(
        &self,
        from: &PackageId,
        to: &PackageId,
        constraint: &str,
    ) -> Result<Constraint, GraphError> {
        Constraint::parse(constraint).map_err(|source| GraphError::InvalidConstraint {
            from: from.clone(),
            to: to.clone(),
            source,
        })
    }

    fn stamp(&mut self) -> usize {
        let order = self.next_order;
        self.next_order += 1;
        order
    }

    /// Whether `to` is reachable from `from` through requirement edges.
    fn reaches(&self, from: &PackageId, to: &PackageId) -> bool {
        let mut stack = vec![from.clone()];
        let mut seen = std::collections::HashSet::new();
        while let Some(current) = stack.pop() {
            if &current == to {
                return true;
            }
            if !seen.insert(current.clone()) {
                continue;
            }
            for edge in self.graph.requirements_for(&current) {
                stack.push(edge.target.clone());
            }
        }
        false
    }
}

/// Mutable view onto a freshly created package, allowing fluent chained edge
/// declarations. The scenario stays the single owner of all nodes.
#[derive(Debug)]
pub struct PackageHandle<'a> {
    scenario: &'a mut Scenario,
    id: PackageId,
}

impl PackageHandle<'_> {
    pub fn id(&self) -> PackageId {
        self.id.clone()
    }

    pub fn requires(self, target: &PackageId, constraint: &str) -> Result<Self, GraphError> {
        let id = self.id.clone();
        self.scenario.require(&id, target, constraint)?;
        Ok(self)
    }

    pub fn requires_with(
        self,
        target: &PackageId,
        constraint: &str,
        transitive_headers: FlagValue,
        transitive_libs: FlagValue,
    ) -> Result<Self, GraphError> {
        let id = self.id.clone();
        self.scenario
            .require_with(&id, target, constraint, transitive_headers, transitive_libs)?;
        Ok(self)
    }

    pub fn test_requires(self, target: &PackageId, constraint: &str) -> Result<Self, GraphError> {
        let id = self.id.clone();
        self.scenario.test_require(&id, target, constraint)?;
        Ok(self)
    }
}

/// Names are embedded into C++ namespaces and CMake project names, so only
/// lowercase identifiers are accepted.
fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() || first == '_' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_')
}
