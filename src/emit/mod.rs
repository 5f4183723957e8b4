use std::fs;
use std::path::Path;

use serde_json::json;

use crate::core::package::{FlagValue, Package, Requirement, TestRequirement};
use crate::core::scenario::Scenario;
use crate::error::Result;
use crate::util::template::render_template;

pub mod templates;

/// The shared python-require bootstrap package every emitted library extends.
pub const PYREQ_NAME: &str = "pyreq";
pub const PYREQ_VERSION: &str = "0.1.0";

/// Writes the full descriptor tree for a scenario: the pyreq base once, then
/// one directory per package with its conanfile, CMake file, and C++ probe
/// sources. Statement order inside every file follows edge declaration order.
pub fn write_fixture(scenario: &Scenario, root: &Path) -> Result<()> {
    fs::create_dir_all(root)?;

    let pyreq_dir = root.join(PYREQ_NAME);
    fs::create_dir_all(&pyreq_dir)?;
    fs::write(pyreq_dir.join("conanfile.py"), pyreq_source()?)?;

    for package in scenario.packages() {
        let name = package.id.as_str();
        let dir = root.join(name);
        fs::create_dir_all(&dir)?;
        fs::write(
            dir.join("conanfile.py"),
            conanfile_source(scenario, package)?,
        )?;
        fs::write(dir.join("CMakeLists.txt"), cmake_source(scenario, package)?)?;
        fs::write(
            dir.join(format!("{name}.hpp")),
            header_source(scenario, package)?,
        )?;
        fs::write(
            dir.join(format!("{name}.cpp")),
            impl_source(scenario, package)?,
        )?;
        fs::write(
            dir.join(format!("{name}_test.cpp")),
            test_source(scenario, package)?,
        )?;
    }

    Ok(())
}

pub fn pyreq_source() -> Result<String> {
    render_template(
        templates::PYREQ_CONANFILE,
        &json!({
            "name": PYREQ_NAME,
            "version": PYREQ_VERSION,
        }),
    )
}

pub fn conanfile_source(scenario: &Scenario, package: &Package) -> Result<String> {
    let graph = scenario.graph();
    let requires: Vec<String> = graph
        .requirements_for(&package.id)
        .iter()
        .map(requires_statement)
        .collect();
    let test_requires: Vec<String> = graph
        .test_requirements_for(&package.id)
        .iter()
        .map(test_requires_statement)
        .collect();

    render_template(
        templates::LIBRARY_CONANFILE,
        &json!({
            "name": package.id.as_str(),
            "version": package.version.raw,
            "pyreq_name": PYREQ_NAME,
            "pyreq_version": PYREQ_VERSION,
            "requires_block": statement_block(&requires, "        "),
            "test_requires_block": statement_block(&test_requires, "        "),
        }),
    )
}

pub fn cmake_source(scenario: &Scenario, package: &Package) -> Result<String> {
    let graph = scenario.graph();
    let requirements = graph.requirements_for(&package.id);
    let test_requirements = graph.test_requirements_for(&package.id);

    let find_packages: Vec<String> = requirements
        .iter()
        .map(|edge| edge.target.as_str())
        .chain(test_requirements.iter().map(|edge| edge.target.as_str()))
        .map(|target| format!("find_package({target} REQUIRED)"))
        .collect();
    let link_targets: String = requirements
        .iter()
        .map(|edge| cmake_target(&edge.target))
        .collect();
    let test_link_targets: String = test_requirements
        .iter()
        .map(|edge| cmake_target(&edge.target))
        .collect();

    render_template(
        templates::LIBRARY_CMAKE,
        &json!({
            "name": package.id.as_str(),
            "find_packages": statement_block(&find_packages, ""),
            "link_targets": link_targets,
            "test_link_targets": test_link_targets,
        }),
    )
}

/// The public header includes and chains `probe_headers()` through exactly
/// the requirements whose `transitive_headers` is explicitly enabled; unset
/// stays private, so "default" and "disabled" emit identically here while
/// the conanfile still distinguishes them.
pub fn header_source(scenario: &Scenario, package: &Package) -> Result<String> {
    let requirements = scenario.graph().requirements_for(&package.id);
    let transitive: Vec<&Requirement> = requirements
        .iter()
        .filter(|edge| edge.transitive_headers == FlagValue::Enabled)
        .collect();

    let includes: Vec<String> = transitive
        .iter()
        .map(|edge| format!("#include <{}.hpp>", edge.target))
        .collect();
    let chain: String = transitive
        .iter()
        .map(|edge| probe_call(&edge.target, "probe_headers"))
        .collect();

    render_template(
        templates::LIBRARY_HEADER,
        &json!({
            "name": package.id.as_str(),
            "transitive_includes": statement_block(&includes, ""),
            "header_probe_chain": chain,
        }),
    )
}

pub fn impl_source(scenario: &Scenario, package: &Package) -> Result<String> {
    let requirements = scenario.graph().requirements_for(&package.id);
    let includes: Vec<String> = requirements
        .iter()
        .filter(|edge| edge.transitive_headers != FlagValue::Enabled)
        .map(|edge| format!("#include <{}.hpp>", edge.target))
        .collect();
    let chain: String = requirements
        .iter()
        .map(|edge| probe_call(&edge.target, "probe_link"))
        .collect();

    render_template(
        templates::LIBRARY_IMPL,
        &json!({
            "name": package.id.as_str(),
            "private_includes": statement_block(&includes, ""),
            "link_probe_chain": chain,
        }),
    )
}

pub fn test_source(scenario: &Scenario, package: &Package) -> Result<String> {
    let test_requirements = scenario.graph().test_requirements_for(&package.id);
    let includes: Vec<String> = test_requirements
        .iter()
        .map(|edge| format!("#include <{}.hpp>", edge.target))
        .collect();
    let probes: Vec<String> = test_requirements
        .iter()
        .flat_map(|edge| {
            [
                format!("{}::probe_headers();", edge.target),
                format!("{}::probe_link();", edge.target),
            ]
        })
        .collect();

    render_template(
        templates::LIBRARY_TEST,
        &json!({
            "name": package.id.as_str(),
            "test_includes": statement_block(&includes, ""),
            "test_probe_block": statement_block(&probes, "    "),
        }),
    )
}

/// `self.requires("target/constraint", ...)` with transitivity keywords only
/// for explicitly set flags: an absent keyword is how "unset" reaches the
/// tool, and it must stay distinguishable from `=False`.
fn requires_statement(edge: &Requirement) -> String {
    let mut args = vec![format!("\"{}/{}\"", edge.target, edge.constraint.raw)];
    if let Some(flag) = python_flag("transitive_headers", edge.transitive_headers) {
        args.push(flag);
    }
    if let Some(flag) = python_flag("transitive_libs", edge.transitive_libs) {
        args.push(flag);
    }
    format!("self.requires({})", args.join(", "))
}

fn test_requires_statement(edge: &TestRequirement) -> String {
    format!(
        "self.test_requires(\"{}/{}\")",
        edge.target, edge.constraint.raw
    )
}

fn python_flag(name: &str, value: FlagValue) -> Option<String> {
    value
        .as_option()
        .map(|set| format!("{}={}", name, if set { "True" } else { "False" }))
}

fn cmake_target(target: &crate::core::package::PackageId) -> String {
    format!("\n    {target}::{target}")
}

fn probe_call(target: &crate::core::package::PackageId, probe: &str) -> String {
    format!("\n        + \" \" + {target}::{probe}()")
}

fn statement_block(lines: &[String], indent: &str) -> String {
    lines
        .iter()
        .map(|line| format!("{indent}{line}\n"))
        .collect()
}
