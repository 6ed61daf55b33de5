//! test-support: helpers for the jenkins-weekly-report integration tests.
//!
//! Add as a dev-dependency in your top-level `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test_support = { path = "tests/support" }
//! ```
//!
//! Then in tests:
//! ```rust,ignore
//! use test_support::{History, report_cmd};
//!
//! let fixture = History::new().job("api", &[(3, "SUCCESS")]).write();
//! let out = report_cmd(&fixture).args(["--out", "-"]).output().unwrap();
//! ```

use std::path::{Path, PathBuf};

use chrono::{TimeZone, Utc};
use once_cell::sync::Lazy;
use tracing_subscriber::{EnvFilter, fmt};

pub const BIN: &str = "jenkins-weekly-report";

/// The fixed "now" every CLI test runs at: Friday 2025-08-15 12:00 UTC.
pub const NOW: &str = "2025-08-15T12:00:00Z";

/// Epoch millis of Monday 2025-08-11 00:00 UTC, the week start for `NOW`.
pub fn week_start_ms() -> i64 {
  Utc.with_ymd_and_hms(2025, 8, 11, 0, 0, 0).single().unwrap().timestamp_millis()
}

/// Initialize `tracing` once, honoring `RUST_LOG` and writing via the test writer.
pub fn init_tracing() {
  static INIT: Lazy<()> = Lazy::new(|| {
    let filter = EnvFilter::try_from_default_env()
      .or_else(|_| EnvFilter::try_new("warn"))
      .unwrap();
    let _ = fmt().with_env_filter(filter).with_test_writer().try_init();
  });
  Lazy::force(&INIT);
}

/// A build-history fixture; builds are given as (minutes after the week start, result),
/// negative minutes land in the previous week. Newest first, as Jenkins returns them.
pub struct History {
  dir: tempfile::TempDir,
  jobs: Vec<serde_json::Value>,
}

impl Default for History {
  fn default() -> Self {
    Self::new()
  }
}

impl History {
  pub fn new() -> Self {
    Self {
      dir: tempfile::TempDir::new().expect("create tempdir"),
      jobs: Vec::new(),
    }
  }

  pub fn job(mut self, name: &str, builds: &[(i64, &str)]) -> Self {
    let start = week_start_ms();
    let n = builds.len() as u64;
    let builds: Vec<serde_json::Value> = builds
      .iter()
      .enumerate()
      .map(|(i, (minutes, result))| {
        let result = if *result == "RUNNING" {
          serde_json::Value::Null
        } else {
          serde_json::Value::String(result.to_string())
        };
        serde_json::json!({
          "number": n - i as u64,
          "timestamp": start + minutes * 60_000,
          "result": result,
        })
      })
      .collect();
    self.jobs.push(serde_json::json!({ "name": name, "builds": builds }));
    self
  }

  /// A job whose every fetch fails.
  pub fn broken_job(mut self, name: &str, error: &str) -> Self {
    self.jobs.push(serde_json::json!({ "name": name, "error": error }));
    self
  }

  /// A job carrying raw build objects, e.g. to exercise malformed pages.
  pub fn raw_job(mut self, name: &str, builds: serde_json::Value) -> Self {
    self.jobs.push(serde_json::json!({ "name": name, "builds": builds }));
    self
  }

  /// Write the fixture and hand back its owner (keeps the temp dir alive).
  pub fn write(self) -> Fixture {
    let path = self.dir.path().join("history.json");
    let doc = serde_json::json!({ "jobs": self.jobs });
    std::fs::write(&path, serde_json::to_vec_pretty(&doc).unwrap()).expect("write fixture");
    Fixture { dir: self.dir, path }
  }
}

pub struct Fixture {
  dir: tempfile::TempDir,
  path: PathBuf,
}

impl Fixture {
  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Scratch directory next to the fixture, for report output.
  pub fn dir(&self) -> &Path {
    self.dir.path()
  }
}

/// The report binary wired to a fixture, a fixed clock and UTC.
pub fn report_cmd(fixture: &Fixture) -> assert_cmd::Command {
  init_tracing();
  let mut cmd = assert_cmd::Command::cargo_bin(BIN).expect("binary target not found");
  cmd
    .env("JENKINS_REPORT_FIXTURE", fixture.path())
    .env_remove("JENKINS_URL")
    .env_remove("JENKINS_USER")
    .env_remove("JENKINS_TOKEN")
    .env_remove("RUST_LOG")
    .args(["--now-override", NOW, "--tz", "utc"]);
  cmd
}

/// The report binary with no fixture and a clean environment.
pub fn bare_cmd() -> assert_cmd::Command {
  init_tracing();
  let mut cmd = assert_cmd::Command::cargo_bin(BIN).expect("binary target not found");
  cmd
    .env_remove("JENKINS_REPORT_FIXTURE")
    .env_remove("JENKINS_URL")
    .env_remove("JENKINS_USER")
    .env_remove("JENKINS_TOKEN");
  cmd
}
