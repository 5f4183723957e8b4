use crate::core::version::{Constraint, Version};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageId(String);

impl PackageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PackageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A buildable unit in a fixture. Identity is the name; immutable once
/// created, edges live in the owning scenario's graph.
#[derive(Debug, Clone)]
pub struct Package {
    pub id: PackageId,
    pub version: Version,
}

/// Tri-state transitivity flag. `Unset` means "inherit the consuming tool's
/// default" and is a distinct value, never coerced to a bool in the model;
/// `resolve` is the one place the default is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagValue {
    Enabled,
    Disabled,
    Unset,
}

impl FlagValue {
    pub fn from_option(value: Option<bool>) -> Self {
        match value {
            Some(true) => FlagValue::Enabled,
            Some(false) => FlagValue::Disabled,
            None => FlagValue::Unset,
        }
    }

    pub fn as_option(self) -> Option<bool> {
        match self {
            FlagValue::Enabled => Some(true),
            FlagValue::Disabled => Some(false),
            FlagValue::Unset => None,
        }
    }

    pub fn resolve(self, default: bool) -> bool {
        match self {
            FlagValue::Enabled => true,
            FlagValue::Disabled => false,
            FlagValue::Unset => default,
        }
    }
}

/// What unset transitivity flags resolve to for closure queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlagDefaults {
    pub transitive_headers: bool,
    pub transitive_libs: bool,
}

/// Directed requirement edge, stored on the dependent side. `order` is the
/// global declaration stamp used for deterministic conflict reporting and
/// emitted artifact ordering.
#[derive(Debug, Clone)]
pub struct Requirement {
    pub target: PackageId,
    pub constraint: Constraint,
    pub transitive_headers: FlagValue,
    pub transitive_libs: FlagValue,
    pub order: usize,
}

/// Build/test-only edge. Carries no transitivity flags: by definition it is
/// visible only within the owning package's own build, never exported.
#[derive(Debug, Clone)]
pub struct TestRequirement {
    pub target: PackageId,
    pub constraint: Constraint,
    pub order: usize,
}
