// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Offline stand-in for a Jenkins server, backed by a JSON document (tests and dry runs)
// role: source/fixture
// inputs: JSON `{ "jobs": [ { "name", "builds": [...], "error"? } ] }`
// outputs: job names in document order; pages sliced from each job's builds
// invariants: builds pass through the same validation as the HTTP client
// errors: FetchError::Transport for jobs flagged with `error`; FetchError::Status 404 for unknown jobs
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use super::{BuildPageSource, FetchError, JobDirectory, parse_builds};
use crate::model::BuildRecord;

/// Environment variable naming a fixture file; when set it replaces the HTTP client.
pub const FIXTURE_ENV: &str = "JENKINS_REPORT_FIXTURE";

#[derive(Debug, Deserialize)]
struct FixtureJob {
  name: String,
  #[serde(default)]
  builds: Vec<serde_json::Value>,
  #[serde(default)]
  error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FixtureDoc {
  jobs: Vec<FixtureJob>,
}

pub struct FixtureSource {
  jobs: Vec<FixtureJob>,
}

impl FixtureSource {
  pub fn from_json(doc: serde_json::Value) -> Result<Self> {
    let doc: FixtureDoc = serde_json::from_value(doc).context("parsing build history fixture")?;
    Ok(Self { jobs: doc.jobs })
  }

  pub fn from_path(path: &Path) -> Result<Self> {
    let raw = std::fs::read(path).with_context(|| format!("reading fixture {}", path.display()))?;
    let doc: serde_json::Value =
      serde_json::from_slice(&raw).with_context(|| format!("parsing fixture {}", path.display()))?;
    Self::from_json(doc)
  }

  fn job(&self, name: &str) -> Option<&FixtureJob> {
    self.jobs.iter().find(|j| j.name == name)
  }
}

impl JobDirectory for FixtureSource {
  fn list_jobs(&self) -> Result<Vec<String>, FetchError> {
    Ok(self.jobs.iter().map(|j| j.name.clone()).collect())
  }
}

impl BuildPageSource for FixtureSource {
  fn fetch_page(&self, job: &str, offset: usize, limit: usize) -> Result<Vec<BuildRecord>, FetchError> {
    let url = format!("fixture://job/{}", job);

    let Some(entry) = self.job(job) else {
      return Err(FetchError::Status { url, status: 404 });
    };
    if let Some(msg) = &entry.error {
      return Err(FetchError::Transport {
        url,
        detail: msg.clone(),
      });
    }

    let start = offset.min(entry.builds.len());
    let end = offset.saturating_add(limit).min(entry.builds.len());
    parse_builds(&entry.builds[start..end])
  }
}
