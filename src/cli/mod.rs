use std::collections::HashMap;
use std::path::PathBuf;
use std::{env, fs};

use clap::{Args, Parser, Subcommand};
use console::style;
use serde::Serialize;

use crate::config::resolve::resolve_fixture_with_overrides;
use crate::core::fixture::Fixture;
use crate::core::package::PackageId;
use crate::driver::conan::ConanCli;
use crate::driver::pipeline::{self, VerifyReport, VerifyVerdict};
use crate::emit;
use crate::error::{ArachneError, Result};
use crate::graph::oracle::{self, Outcome, ResolutionPolicy, ResolutionReport};
use crate::graph::{ops, viz};
use crate::util::output;

#[derive(Parser, Debug)]
#[command(name = "arachne")]
#[command(about = "Transitive-dependency fixture generator", long_about = None)]
pub struct Cli {
    #[arg(short, long)]
    pub root: Option<PathBuf>,
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    #[arg(short, long)]
    pub output: Option<String>,
    #[arg(long)]
    pub no_color: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scaffold a fixture definition in a directory
    Init(InitArgs),
    /// Emit build descriptors for every package
    Generate(GenerateArgs),
    /// Emit descriptors and drive the package manager over them
    Build(BuildArgs),
    /// Render the package manager's graph report per package
    Render,
    /// Predict per-package resolution verdicts
    Check(CheckArgs),
    /// Compare oracle predictions against actual build outcomes
    Verify(VerifyArgs),
    /// Inspect the dependency graph
    Graph(GraphArgs),
}

#[derive(Args, Debug)]
pub struct InitArgs {
    pub directory: Option<PathBuf>,
    #[arg(short = 'n', long)]
    pub name: Option<String>,
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[arg(short = 'y', long)]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    #[arg(short = 'y', long)]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    #[arg(long)]
    pub policy: Option<String>,
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    #[arg(long)]
    pub policy: Option<String>,
    #[arg(short = 'y', long)]
    pub yes: bool,
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct GraphArgs {
    #[command(subcommand)]
    pub command: Option<GraphCommand>,
}

#[derive(Subcommand, Debug)]
pub enum GraphCommand {
    Show(GraphShowArgs),
    Closure(GraphClosureArgs),
    Order(GraphOrderArgs),
}

#[derive(Args, Debug)]
pub struct GraphShowArgs {
    #[arg(long, default_value = "tree")]
    pub format: String,
}

#[derive(Args, Debug)]
pub struct GraphClosureArgs {
    pub package: String,
    #[arg(long, default_value = "requires")]
    pub edges: String,
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct GraphOrderArgs {
    #[arg(long)]
    pub json: bool,
}

pub fn run() {
    let cli = Cli::parse();
    if cli.no_color {
        console::set_colors_enabled(false);
    }
    if let Err(err) = dispatch(cli) {
        output::error(&err.to_string());
        std::process::exit(1);
    }
}

fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init(args) => handle_init(args),
        Commands::Generate(args) => {
            let fixture = load_fixture(cli.root, cli.config, cli.output)?;
            handle_generate(args, &fixture)
        }
        Commands::Build(args) => {
            let fixture = load_fixture(cli.root, cli.config, cli.output)?;
            handle_build(args, &fixture)
        }
        Commands::Render => {
            let fixture = load_fixture(cli.root, cli.config, cli.output)?;
            handle_render(&fixture)
        }
        Commands::Check(args) => {
            let fixture = load_fixture(cli.root, cli.config, cli.output)?;
            handle_check(args, &fixture)
        }
        Commands::Verify(args) => {
            let fixture = load_fixture(cli.root, cli.config, cli.output)?;
            handle_verify(args, &fixture)
        }
        Commands::Graph(args) => {
            let fixture = load_fixture(cli.root, cli.config, cli.output)?;
            handle_graph(args, &fixture)
        }
    }
}

fn load_fixture(
    root: Option<PathBuf>,
    config: Option<PathBuf>,
    output: Option<String>,
) -> Result<Fixture> {
    let start = env::current_dir()?;
    let resolved = resolve_fixture_with_overrides(start, root, config)?;
    let mut fixture = Fixture::load_from(resolved.root, resolved.config_path)?;
    if let Some(output_dir) = output {
        fixture.config.fixture.output_dir = output_dir;
    }
    Ok(fixture)
}

fn handle_init(args: InitArgs) -> Result<()> {
    let target_dir = match args.directory {
        Some(dir) => dir,
        None => env::current_dir()?,
    };
    if !target_dir.exists() {
        fs::create_dir_all(&target_dir)?;
    }

    let config_path = target_dir.join(crate::config::fixture::CONFIG_FILE);
    if config_path.exists() {
        return Err(ArachneError::Other(anyhow::anyhow!(
            "fixture config already exists at {}",
            config_path.display()
        )));
    }

    let name = args
        .name
        .or_else(|| {
            target_dir
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
        })
        .unwrap_or_else(|| "fixture".to_string());

    fs::write(&config_path, init_config(&name))?;
    ensure_gitignore(&target_dir)?;
    output::info(&format!(
        "initialized fixture '{}' at {}",
        name,
        target_dir.display()
    ));
    Ok(())
}

fn init_config(name: &str) -> String {
    format!(
        r#"[fixture]
name = "{name}"
output_dir = "build"

[defaults]
transitive_headers = false
transitive_libs = false
policy = "ranged"

[conan]
bin = "conan"

[[packages]]
name = "util"
version = "0.1.0"

[[packages]]
name = "lib_a"
version = "0.1.0"
requires = [{{ package = "util", constraint = "[>=0.1.0]" }}]

[[packages]]
name = "lib_b"
version = "0.1.0"
test_requires = [
    {{ package = "util", constraint = "[>=0.1.0]" }},
    {{ package = "lib_a", constraint = "[>=0.1.0]" }},
]

[[packages]]
name = "lib_c"
version = "0.1.0"
test_requires = [
    {{ package = "lib_a", constraint = "[>=0.1.0]" }},
    {{ package = "util", constraint = "[>=0.1.0]" }},
]
"#
    )
}

fn ensure_gitignore(root: &std::path::Path) -> Result<()> {
    let path = root.join(".gitignore");
    if path.exists() {
        return Ok(());
    }
    fs::write(path, "/build/\n")?;
    Ok(())
}

fn handle_generate(args: GenerateArgs, fixture: &Fixture) -> Result<()> {
    if !regenerate(fixture, args.yes)? {
        return Ok(());
    }
    output::info(&format!(
        "generated {} packages in {}",
        fixture.scenario.packages().len(),
        fixture.output_dir().display()
    ));
    Ok(())
}

/// Wipes and re-emits the descriptor tree. Returns false when the user
/// declines to replace an existing tree.
fn regenerate(fixture: &Fixture, assume_yes: bool) -> Result<bool> {
    let out = fixture.output_dir();
    if out.exists() {
        let prompt = format!("replace fixture output at {}?", out.display());
        let confirmed = output::confirm(&prompt, assume_yes)
            .map_err(|err| ArachneError::Other(anyhow::Error::new(err)))?;
        if !confirmed {
            output::info("aborted");
            return Ok(false);
        }
        fs::remove_dir_all(&out)?;
    }
    emit::write_fixture(&fixture.scenario, &out)?;
    Ok(true)
}

fn handle_build(args: BuildArgs, fixture: &Fixture) -> Result<()> {
    if !regenerate(fixture, args.yes)? {
        return Ok(());
    }
    let manager = conan_for(fixture);
    pipeline::run(fixture, &manager)?;
    output::info(&format!(
        "built and exported {} packages",
        fixture.scenario.packages().len()
    ));
    Ok(())
}

fn handle_render(fixture: &Fixture) -> Result<()> {
    if !fixture.output_dir().is_dir() {
        return Err(ArachneError::Other(anyhow::anyhow!(
            "fixture output missing at {} (run `arachne build` first)",
            fixture.output_dir().display()
        )));
    }
    let manager = conan_for(fixture);
    pipeline::render(fixture, &manager)?;
    output::info("graph reports written next to each package's descriptors");
    Ok(())
}

fn conan_for(fixture: &Fixture) -> ConanCli {
    ConanCli::new(fixture.config.conan.bin.clone(), fixture.conan_home())
}

fn resolve_policy(requested: Option<&str>, fixture: &Fixture) -> Result<ResolutionPolicy> {
    match requested {
        Some(input) => ResolutionPolicy::parse(input).ok_or_else(|| {
            ArachneError::Other(anyhow::anyhow!("unknown resolution policy '{}'", input))
        }),
        None => fixture.default_policy(),
    }
}

fn handle_check(args: CheckArgs, fixture: &Fixture) -> Result<()> {
    let policy = resolve_policy(args.policy.as_deref(), fixture)?;
    let report = oracle::predict(&fixture.scenario, policy);

    if args.json {
        println!("{}", to_pretty_json(&check_json(fixture, &report))?);
        return Ok(());
    }

    print_resolution_report(fixture, &report);
    Ok(())
}

fn print_resolution_report(fixture: &Fixture, report: &ResolutionReport) {
    println!("policy: {}", report.policy.as_str());
    for verdict in &report.verdicts {
        let version = fixture
            .scenario
            .package(&verdict.package)
            .map(|package| package.version.raw.as_str())
            .unwrap_or("?");
        match &verdict.outcome {
            Outcome::Success => {
                println!(
                    "{} {}: {}",
                    verdict.package,
                    version,
                    style("ok").green()
                );
            }
            Outcome::Conflict(conflict) => {
                println!(
                    "{} {}: {} on {}",
                    verdict.package,
                    version,
                    style("conflict").red(),
                    conflict.dependency
                );
                println!("  {}", describe_source(&conflict.first));
                println!("  {}", describe_source(&conflict.second));
            }
            Outcome::Unsatisfied(unsatisfied) => {
                println!(
                    "{} {}: {} ({} declares only {})",
                    verdict.package,
                    version,
                    style("unsatisfied").yellow(),
                    unsatisfied.source.target,
                    unsatisfied.declared
                );
                println!("  {}", describe_source(&unsatisfied.source));
            }
        }
    }
}

fn describe_source(source: &oracle::ConstraintSource) -> String {
    let kind = if source.test_only {
        "test-requires"
    } else {
        "requires"
    };
    format!(
        "{} {} {} at {}",
        source.from, kind, source.target, source.constraint
    )
}

fn handle_verify(args: VerifyArgs, fixture: &Fixture) -> Result<()> {
    let policy = resolve_policy(args.policy.as_deref(), fixture)?;
    if !regenerate(fixture, args.yes)? {
        return Ok(());
    }
    let manager = conan_for(fixture);
    let report = pipeline::verify(fixture, &manager, policy)?;

    if args.json {
        println!("{}", to_pretty_json(&verify_json(&report))?);
    } else {
        print_resolution_report(fixture, &report.predictions);
        for package in &report.skipped {
            output::info(&format!("{package}: skipped after expected abort"));
        }
    }

    match report.verdict {
        VerifyVerdict::Confirmed => {
            output::info("verdict: oracle predictions match the build outcomes");
            Ok(())
        }
        VerifyVerdict::UnexpectedFailure { package, code } => {
            Err(ArachneError::Other(anyhow::anyhow!(
                "package '{}' failed (exit {:?}) where the oracle predicted success",
                package,
                code
            )))
        }
        VerifyVerdict::MissingFailure { package } => Err(ArachneError::Other(anyhow::anyhow!(
            "package '{}' built although the oracle predicted failure",
            package
        ))),
    }
}

fn handle_graph(args: GraphArgs, fixture: &Fixture) -> Result<()> {
    let command = args.command.unwrap_or(GraphCommand::Show(GraphShowArgs {
        format: "tree".to_string(),
    }));

    match command {
        GraphCommand::Show(show) => handle_graph_show(show, fixture),
        GraphCommand::Closure(closure) => handle_graph_closure(closure, fixture),
        GraphCommand::Order(order) => handle_graph_order(order, fixture),
    }
}

fn handle_graph_show(args: GraphShowArgs, fixture: &Fixture) -> Result<()> {
    let scenario = &fixture.scenario;
    let nodes: Vec<PackageId> = scenario
        .packages()
        .iter()
        .map(|package| package.id.clone())
        .collect();
    let mut edges: HashMap<PackageId, Vec<PackageId>> = HashMap::new();
    for package in scenario.packages() {
        let targets = scenario
            .graph()
            .requirements_for(&package.id)
            .iter()
            .map(|edge| edge.target.clone())
            .collect();
        edges.insert(package.id.clone(), targets);
    }
    let mut labels = HashMap::new();
    for package in scenario.packages() {
        labels.insert(
            package.id.clone(),
            format!("{} ({})", package.id, package.version),
        );
    }
    let roots: Vec<PackageId> = nodes
        .iter()
        .filter(|node| ops::dependents_of(scenario, node).is_empty())
        .cloned()
        .collect();

    match args.format.to_ascii_lowercase().as_str() {
        "tree" => {
            print!("{}", viz::render_tree(&roots, &edges, &labels));
            Ok(())
        }
        "flat" => {
            print!("{}", viz::render_flat(&roots, &edges, &labels));
            Ok(())
        }
        "dot" => {
            print!("{}", viz::render_dot(&nodes, &edges, &labels));
            Ok(())
        }
        "json" => {
            println!("{}", to_pretty_json(&graph_json(fixture))?);
            Ok(())
        }
        other => Err(ArachneError::Other(anyhow::anyhow!(
            "unknown graph format '{}'",
            other
        ))),
    }
}

fn handle_graph_closure(args: GraphClosureArgs, fixture: &Fixture) -> Result<()> {
    let package = PackageId::new(args.package.clone());
    if !fixture.scenario.contains(&package) {
        return Err(ArachneError::Other(anyhow::anyhow!(
            "unknown package '{}'",
            args.package
        )));
    }

    let graph = fixture.scenario.graph();
    let defaults = fixture.flag_defaults();
    let members = match args.edges.to_ascii_lowercase().as_str() {
        "requires" => ops::transitive_closure(graph, &package),
        "headers" => ops::effective_headers_closure(graph, &package, defaults),
        "libs" => ops::effective_link_closure(graph, &package, defaults),
        other => {
            return Err(ArachneError::Other(anyhow::anyhow!(
                "unknown edge kind '{}' (expected requires, headers, or libs)",
                other
            )))
        }
    };

    if args.json {
        let json = ClosureJson {
            package: args.package,
            edges: args.edges,
            members: members.iter().map(|id| id.as_str().to_string()).collect(),
        };
        println!("{}", to_pretty_json(&json)?);
        return Ok(());
    }

    for member in members {
        println!("{}", member);
    }
    Ok(())
}

fn handle_graph_order(args: GraphOrderArgs, fixture: &Fixture) -> Result<()> {
    let order: Vec<String> = ops::build_order(&fixture.scenario)
        .into_iter()
        .map(|id| id.as_str().to_string())
        .collect();

    if args.json {
        println!("{}", to_pretty_json(&order)?);
    } else {
        for package in order {
            println!("{}", package);
        }
    }
    Ok(())
}

fn to_pretty_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|err| ArachneError::Other(anyhow::Error::new(err)))
}

#[derive(Serialize)]
struct GraphJson {
    nodes: Vec<GraphNodeJson>,
    edges: Vec<GraphEdgeJson>,
}

#[derive(Serialize)]
struct GraphNodeJson {
    name: String,
    version: String,
}

#[derive(Serialize)]
struct GraphEdgeJson {
    from: String,
    to: String,
    constraint: String,
    kind: String,
    /// `null` is "unset": distinct from an explicit `false`.
    transitive_headers: Option<bool>,
    transitive_libs: Option<bool>,
}

#[derive(Serialize)]
struct CheckJson {
    policy: String,
    packages: Vec<CheckEntryJson>,
}

#[derive(Serialize)]
struct CheckEntryJson {
    package: String,
    version: String,
    outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    conflict: Option<ConflictJson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unsatisfied: Option<UnsatisfiedJson>,
}

#[derive(Serialize)]
struct ConflictJson {
    dependency: String,
    first: ConstraintSourceJson,
    second: ConstraintSourceJson,
}

#[derive(Serialize)]
struct ConstraintSourceJson {
    from: String,
    target: String,
    constraint: String,
    test_only: bool,
}

#[derive(Serialize)]
struct UnsatisfiedJson {
    source: ConstraintSourceJson,
    declared: String,
}

#[derive(Serialize)]
struct ClosureJson {
    package: String,
    edges: String,
    members: Vec<String>,
}

#[derive(Serialize)]
struct VerifyJson {
    policy: String,
    verdict: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    package: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exit_code: Option<i32>,
    skipped: Vec<String>,
}

fn graph_json(fixture: &Fixture) -> GraphJson {
    let scenario = &fixture.scenario;
    let nodes = scenario
        .packages()
        .iter()
        .map(|package| GraphNodeJson {
            name: package.id.as_str().to_string(),
            version: package.version.raw.clone(),
        })
        .collect();

    let mut edges = Vec::new();
    for package in scenario.packages() {
        for edge in scenario.graph().requirements_for(&package.id) {
            edges.push(GraphEdgeJson {
                from: package.id.as_str().to_string(),
                to: edge.target.as_str().to_string(),
                constraint: edge.constraint.raw.clone(),
                kind: "requires".to_string(),
                transitive_headers: edge.transitive_headers.as_option(),
                transitive_libs: edge.transitive_libs.as_option(),
            });
        }
        for edge in scenario.graph().test_requirements_for(&package.id) {
            edges.push(GraphEdgeJson {
                from: package.id.as_str().to_string(),
                to: edge.target.as_str().to_string(),
                constraint: edge.constraint.raw.clone(),
                kind: "test_requires".to_string(),
                transitive_headers: None,
                transitive_libs: None,
            });
        }
    }

    GraphJson { nodes, edges }
}

fn check_json(fixture: &Fixture, report: &ResolutionReport) -> CheckJson {
    let packages = report
        .verdicts
        .iter()
        .map(|verdict| {
            let version = fixture
                .scenario
                .package(&verdict.package)
                .map(|package| package.version.raw.clone())
                .unwrap_or_default();
            let (outcome, conflict, unsatisfied) = match &verdict.outcome {
                Outcome::Success => ("success".to_string(), None, None),
                Outcome::Conflict(conflict) => (
                    "conflict".to_string(),
                    Some(ConflictJson {
                        dependency: conflict.dependency.as_str().to_string(),
                        first: source_json(&conflict.first),
                        second: source_json(&conflict.second),
                    }),
                    None,
                ),
                Outcome::Unsatisfied(unsatisfied) => (
                    "unsatisfied".to_string(),
                    None,
                    Some(UnsatisfiedJson {
                        source: source_json(&unsatisfied.source),
                        declared: unsatisfied.declared.raw.clone(),
                    }),
                ),
            };
            CheckEntryJson {
                package: verdict.package.as_str().to_string(),
                version,
                outcome,
                conflict,
                unsatisfied,
            }
        })
        .collect();

    CheckJson {
        policy: report.policy.as_str().to_string(),
        packages,
    }
}

fn source_json(source: &oracle::ConstraintSource) -> ConstraintSourceJson {
    ConstraintSourceJson {
        from: source.from.as_str().to_string(),
        target: source.target.as_str().to_string(),
        constraint: source.constraint.raw.clone(),
        test_only: source.test_only,
    }
}

fn verify_json(report: &VerifyReport) -> VerifyJson {
    let (verdict, package, exit_code) = match &report.verdict {
        VerifyVerdict::Confirmed => ("confirmed".to_string(), None, None),
        VerifyVerdict::UnexpectedFailure { package, code } => (
            "unexpected_failure".to_string(),
            Some(package.as_str().to_string()),
            *code,
        ),
        VerifyVerdict::MissingFailure { package } => (
            "missing_failure".to_string(),
            Some(package.as_str().to_string()),
            None,
        ),
    };

    VerifyJson {
        policy: report.predictions.policy.as_str().to_string(),
        verdict,
        package,
        exit_code,
        skipped: report
            .skipped
            .iter()
            .map(|id| id.as_str().to_string())
            .collect(),
    }
}
