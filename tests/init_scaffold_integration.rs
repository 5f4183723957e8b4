use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

struct TempRoot {
    root: PathBuf,
}

impl TempRoot {
    fn new(prefix: &str) -> Self {
        let root = unique_temp_dir(prefix);
        fs::create_dir_all(&root).expect("create temp root");
        Self { root }
    }
}

impl Drop for TempRoot {
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

#[test]
fn init_scaffolds_a_loadable_fixture() {
    let temp = TempRoot::new("init-scaffold");
    let output = run_arachne(&temp.root, &["init", "--name", "sample"]);
    assert_success(&output, "init");

    let config = fs::read_to_string(temp.root.join("arachne.toml")).expect("read arachne.toml");
    assert!(config.contains("name = \"sample\""));
    assert!(config.contains("[[packages]]"));
    assert!(temp.root.join(".gitignore").is_file());

    // The scaffolded definition must replay cleanly through the loader.
    let output = run_arachne(&temp.root, &["graph", "order"]);
    assert_success(&output, "graph order on scaffold");
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let order: Vec<&str> = stdout.lines().collect();
    assert_eq!(order, vec!["util", "lib_a", "lib_b", "lib_c"]);
}

#[test]
fn init_creates_the_target_directory_when_missing() {
    let temp = TempRoot::new("init-mkdir");
    let nested = temp.root.join("nested").join("fixture");
    let nested_str = nested.to_string_lossy().to_string();
    let output = run_arachne(&temp.root, &["init", &nested_str]);
    assert_success(&output, "init into missing directory");
    assert!(nested.join("arachne.toml").is_file());
}

#[test]
fn init_refuses_to_overwrite_an_existing_definition() {
    let temp = TempRoot::new("init-existing");
    let output = run_arachne(&temp.root, &["init"]);
    assert_success(&output, "first init");

    let output = run_arachne(&temp.root, &["init"]);
    assert!(!output.status.success(), "second init must fail");
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    assert!(
        stderr.contains("already exists"),
        "unexpected stderr:\n{stderr}"
    );
}
