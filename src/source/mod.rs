// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Seams to the CI server: list job names and fetch newest-first pages of build summaries
// role: source/traits
// inputs: job name, offset, limit
// outputs: Vec<BuildRecord> (newest-first; empty = end of history), Vec<String> job names
// invariants:
// - a page with any build missing number/timestamp/result is rejected whole
// - a present-but-null result is a running build, not a malformed one
// errors: FetchError (transport, status, decode, malformed)
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use thiserror::Error;

use crate::ext::serde_json::JsonFetch;
use crate::model::BuildRecord;

pub mod fixture;
pub mod jenkins;

pub use fixture::FixtureSource;
pub use jenkins::JenkinsClient;

#[derive(Debug, Error)]
pub enum FetchError {
  #[error("request to {url} failed: {detail}")]
  Transport { url: String, detail: String },
  #[error("{url} answered with HTTP {status}")]
  Status { url: String, status: u16 },
  #[error("could not decode response from {url}: {detail}")]
  Decode { url: String, detail: String },
  #[error("build #{index} on the page is missing `{field}`")]
  Malformed { index: usize, field: &'static str },
}

/// A reverse-chronological, page-based view of one job's build history.
pub trait BuildPageSource {
  /// Return builds `[offset, offset + limit)` newest-first. An empty page means
  /// the history is exhausted.
  fn fetch_page(&self, job: &str, offset: usize, limit: usize) -> Result<Vec<BuildRecord>, FetchError>;
}

pub trait JobDirectory {
  fn list_jobs(&self) -> Result<Vec<String>, FetchError>;
}

/// Both the HTTP client and the fixture source; what the CLI drives.
pub trait CiServer: BuildPageSource + JobDirectory + Sync {}

impl<T: BuildPageSource + JobDirectory + Sync> CiServer for T {}

/// Validate one page worth of raw build objects.
pub fn parse_builds(items: &[serde_json::Value]) -> Result<Vec<BuildRecord>, FetchError> {
  let mut out = Vec::with_capacity(items.len());

  for (index, item) in items.iter().enumerate() {
    let number = item
      .fetch("number")
      .to::<u64>()
      .ok_or(FetchError::Malformed { index, field: "number" })?;
    let timestamp_ms = item
      .fetch("timestamp")
      .to::<i64>()
      .ok_or(FetchError::Malformed { index, field: "timestamp" })?;

    let result = item.fetch("result");
    if !result.is_present() {
      return Err(FetchError::Malformed { index, field: "result" });
    }
    let result = if result.is_null() {
      None
    } else {
      Some(result.to::<String>().ok_or(FetchError::Malformed { index, field: "result" })?)
    };

    out.push(BuildRecord::new(number, timestamp_ms, result));
  }

  Ok(out)
}

/// Pull the `jobs[].name` list out of a Jenkins root listing.
pub fn parse_job_names(url: &str, body: &serde_json::Value) -> Result<Vec<String>, FetchError> {
  let jobs = body.fetch("jobs").as_array().ok_or_else(|| FetchError::Decode {
    url: url.to_string(),
    detail: "missing `jobs` array".into(),
  })?;

  jobs
    .iter()
    .map(|j| {
      j.fetch("name").to::<String>().ok_or_else(|| FetchError::Decode {
        url: url.to_string(),
        detail: "job entry without `name`".into(),
      })
    })
    .collect()
}
