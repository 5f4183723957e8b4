use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

struct Fixture {
    root: PathBuf,
}

impl Fixture {
    fn new(prefix: &str, config: &str) -> Self {
        let root = unique_temp_dir(prefix);
        fs::create_dir_all(&root).expect("create fixture root");
        fs::write(root.join("arachne.toml"), config).expect("write arachne.toml");
        Self { root }
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}

fn arachne_bin() -> PathBuf {
    PathBuf::from(
        std::env::var("CARGO_BIN_EXE_arachne")
            .expect("CARGO_BIN_EXE_arachne is not set for integration test"),
    )
}

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_nanos();
    let pid = std::process::id();
    std::env::temp_dir().join(format!("arachne-{prefix}-{pid}-{nanos}"))
}

fn run_arachne(current_dir: &PathBuf, args: &[&str]) -> std::process::Output {
    let mut cmd = Command::new(arachne_bin());
    cmd.current_dir(current_dir).args(args);
    for var in [
        "ARACHNE_ROOT",
        "ARACHNE_CONFIG",
        "ARACHNE_OUTPUT_DIR",
        "ARACHNE_CONAN_BIN",
    ] {
        cmd.env_remove(var);
    }
    cmd.output().expect("run arachne")
}

fn assert_success(output: &std::process::Output, context: &str) {
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    assert!(
        output.status.success(),
        "{context} failed\nstdout:\n{stdout}\nstderr:\n{stderr}"
    );
}

const FLAGGED_CONFIG: &str = r#"[fixture]
name = "flagged"

[[packages]]
name = "util"
version = "0.1.0"

[[packages]]
name = "lib_a"
version = "0.1.0"
requires = [
    { package = "util", constraint = "[>=0.1.0]", transitive_headers = true, transitive_libs = false },
]

[[packages]]
name = "lib_b"
version = "0.1.0"
requires = [{ package = "util", constraint = "[>=0.1.0]" }]
test_requires = [{ package = "lib_a", constraint = "[>=0.1.0]" }]
"#;

#[test]
fn generate_emits_the_full_descriptor_tree() {
    let fixture = Fixture::new("generate-tree", FLAGGED_CONFIG);
    let output = run_arachne(&fixture.root, &["generate", "--yes"]);
    assert_success(&output, "generate");

    let build = fixture.root.join("build");
    assert!(build.join("pyreq").join("conanfile.py").is_file());
    for name in ["util", "lib_a", "lib_b"] {
        let dir = build.join(name);
        assert!(dir.join("conanfile.py").is_file(), "{name} conanfile");
        assert!(dir.join("CMakeLists.txt").is_file(), "{name} cmake");
        assert!(dir.join(format!("{name}.hpp")).is_file(), "{name} header");
        assert!(dir.join(format!("{name}.cpp")).is_file(), "{name} impl");
        assert!(dir.join(format!("{name}_test.cpp")).is_file(), "{name} test");
    }
}

#[test]
fn generated_conanfile_carries_only_explicit_transitivity_keywords() {
    let fixture = Fixture::new("generate-flags", FLAGGED_CONFIG);
    let output = run_arachne(&fixture.root, &["generate", "--yes"]);
    assert_success(&output, "generate");

    let lib_a = fs::read_to_string(
        fixture
            .root
            .join("build")
            .join("lib_a")
            .join("conanfile.py"),
    )
    .expect("read lib_a conanfile");
    assert!(lib_a.contains(
        "self.requires(\"util/[>=0.1.0]\", transitive_headers=True, transitive_libs=False)"
    ));
    assert!(lib_a.contains("python_requires = \"pyreq/0.1.0\""));

    // lib_b's edge has no explicit flags, so no keywords may appear.
    let lib_b = fs::read_to_string(
        fixture
            .root
            .join("build")
            .join("lib_b")
            .join("conanfile.py"),
    )
    .expect("read lib_b conanfile");
    assert!(lib_b.contains("self.requires(\"util/[>=0.1.0]\")"));
    assert!(!lib_b.contains("transitive_headers"));
    assert!(lib_b.contains("self.test_requires(\"lib_a/[>=0.1.0]\")"));
}

#[test]
fn generated_probe_sources_follow_the_header_gate() {
    let fixture = Fixture::new("generate-probes", FLAGGED_CONFIG);
    let output = run_arachne(&fixture.root, &["generate", "--yes"]);
    assert_success(&output, "generate");

    let build = fixture.root.join("build");
    let lib_a_hpp =
        fs::read_to_string(build.join("lib_a").join("lib_a.hpp")).expect("read lib_a header");
    assert!(lib_a_hpp.contains("#include <util.hpp>"));
    assert!(lib_a_hpp.contains("util::probe_headers()"));

    // lib_b does not expose util's headers, so the include is private.
    let lib_b_hpp =
        fs::read_to_string(build.join("lib_b").join("lib_b.hpp")).expect("read lib_b header");
    assert!(!lib_b_hpp.contains("util.hpp"));
    let lib_b_cpp =
        fs::read_to_string(build.join("lib_b").join("lib_b.cpp")).expect("read lib_b impl");
    assert!(lib_b_cpp.contains("#include <util.hpp>"));
    assert!(lib_b_cpp.contains("util::probe_link()"));
}

#[test]
fn generate_replaces_a_stale_tree_when_confirmed() {
    let fixture = Fixture::new("generate-replace", FLAGGED_CONFIG);
    let output = run_arachne(&fixture.root, &["generate", "--yes"]);
    assert_success(&output, "first generate");

    let stale = fixture.root.join("build").join("stale.txt");
    fs::write(&stale, "leftover").expect("write stale file");

    let output = run_arachne(&fixture.root, &["generate", "--yes"]);
    assert_success(&output, "second generate");
    assert!(!stale.exists(), "stale file must be wiped");
    assert!(fixture
        .root
        .join("build")
        .join("util")
        .join("conanfile.py")
        .is_file());
}

#[test]
fn output_flag_redirects_the_descriptor_tree() {
    let fixture = Fixture::new("generate-output", FLAGGED_CONFIG);
    let output = run_arachne(
        &fixture.root,
        &["--output", "elsewhere", "generate", "--yes"],
    );
    assert_success(&output, "generate with --output");
    assert!(fixture
        .root
        .join("elsewhere")
        .join("util")
        .join("conanfile.py")
        .is_file());
    assert!(!fixture.root.join("build").exists());
}
