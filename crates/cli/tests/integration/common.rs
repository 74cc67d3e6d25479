//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use tempfile::TempDir;

/// Isolated test environment.
///
/// Each test gets its own temporary directory to write assemblies into.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn new() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  /// Assembly output directory (isolated per test).
  pub fn out_path(&self) -> PathBuf {
    let p = self.temp.path().join("cdk.out");
    std::fs::create_dir_all(&p).unwrap();
    dunce::canonicalize(&p).unwrap_or(p)
  }

  /// Get a pre-configured Command for the vttcloud binary.
  ///
  /// Clears `STAGE`, `PROJECT` and `FOUNDRY_SECRET_ARN` so the defaults
  /// apply unless a test sets them.
  pub fn vtt_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("vttcloud");
    cmd.env_remove("STAGE");
    cmd.env_remove("PROJECT");
    cmd.env_remove("FOUNDRY_SECRET_ARN");
    cmd.current_dir(self.temp.path());
    cmd
  }

  /// Run `synth` with extra args into [`TestEnv::out_path`].
  pub fn synth(&self, args: &[&str]) {
    self
      .vtt_cmd()
      .arg("synth")
      .args(args)
      .arg("--out")
      .arg(self.out_path())
      .assert()
      .success();
  }
}

pub fn read_json(path: &Path) -> Value {
  let content = std::fs::read_to_string(path).unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));
  serde_json::from_str(&content).unwrap()
}
