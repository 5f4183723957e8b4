pub mod fixture;
pub mod package;
pub mod scenario;
pub mod version;

pub use fixture::Fixture;
pub use package::{FlagDefaults, FlagValue, Package, PackageId, Requirement, TestRequirement};
pub use scenario::{PackageHandle, Scenario};
pub use version::{Constraint, ConstraintKind, Version, VersionError, VersionResult};
