use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::driver::{PackageManager, ProcessFailure};
use crate::util::output;

/// Drives the Conan 2.x CLI. Every invocation pins `CONAN_HOME` to the
/// fixture's own cache directory so runs stay hermetic.
pub struct ConanCli {
    bin: String,
    home: PathBuf,
}

impl ConanCli {
    pub fn new(bin: impl Into<String>, home: PathBuf) -> Self {
        Self {
            bin: bin.into(),
            home,
        }
    }

    fn command(&self, dir: &Path, args: &[&str]) -> Command {
        let mut command = Command::new(&self.bin);
        command
            .args(args)
            .current_dir(dir)
            .env("CONAN_HOME", &self.home);
        command
    }

    fn run(&self, dir: &Path, args: &[&str]) -> Result<(), ProcessFailure> {
        output::conan_op(&args.join(" "));
        let command_line = self.command_line(args);
        let status = self
            .command(dir, args)
            .status()
            .map_err(|source| ProcessFailure::Spawn {
                command: command_line.clone(),
                source,
            })?;
        check_status(status, command_line)
    }

    fn command_line(&self, args: &[&str]) -> String {
        let mut line = self.bin.clone();
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

fn check_status(status: std::process::ExitStatus, command: String) -> Result<(), ProcessFailure> {
    if status.success() {
        return Ok(());
    }
    match status.code() {
        Some(code) => Err(ProcessFailure::Exited { command, code }),
        None => Err(ProcessFailure::Terminated { command }),
    }
}

impl PackageManager for ConanCli {
    fn prepare(&self, root: &Path) -> Result<(), ProcessFailure> {
        self.run(root, &["profile", "detect", "-f"])?;
        self.run(root, &["remote", "disable", "conancenter"])
    }

    fn export_base(&self, dir: &Path) -> Result<(), ProcessFailure> {
        self.run(dir, &["create", "."])
    }

    fn build(&self, dir: &Path) -> Result<(), ProcessFailure> {
        self.run(dir, &["build", "."])
    }

    fn export(&self, dir: &Path) -> Result<(), ProcessFailure> {
        self.run(dir, &["export-pkg", "."])
    }

    fn render_graph(&self, dir: &Path, out: &Path) -> Result<(), ProcessFailure> {
        let args = ["graph", "info", ".", "-f", "html"];
        output::conan_op(&args.join(" "));
        let command_line = self.command_line(&args);
        let report = File::create(out).map_err(|source| ProcessFailure::Capture {
            command: command_line.clone(),
            source,
        })?;
        let status = self
            .command(dir, &args)
            .stdout(Stdio::from(report))
            .status()
            .map_err(|source| ProcessFailure::Spawn {
                command: command_line.clone(),
                source,
            })?;
        check_status(status, command_line)
    }
}
