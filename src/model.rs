// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Define the report model (builds, per-job tallies, failures, aggregate) shared by scanning and rendering
// role: model/types
// outputs: Serializable structs with stable field names
// invariants: total_success/total_failure equal the sums over jobs; builds are newest-first
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BuildOutcome {
  Success,
  Other,
}

impl BuildOutcome {
  /// Jenkins reports `"SUCCESS"` for green builds; everything else (including a
  /// running build's `null`) counts against the job.
  pub fn from_result(result: Option<&str>) -> Self {
    match result {
      Some("SUCCESS") => BuildOutcome::Success,
      _ => BuildOutcome::Other,
    }
  }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct BuildRecord {
  pub number: u64,
  pub timestamp_ms: i64,
  pub outcome: BuildOutcome,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub result: Option<String>,
}

impl BuildRecord {
  pub fn new(number: u64, timestamp_ms: i64, result: Option<String>) -> Self {
    Self {
      number,
      timestamp_ms,
      outcome: BuildOutcome::from_result(result.as_deref()),
      result,
    }
  }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct JobTally {
  pub job: String,
  pub success: u64,
  pub failure: u64,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub builds: Vec<BuildRecord>,
}

impl JobTally {
  pub fn total(&self) -> u64 {
    self.success + self.failure
  }
}

/// A job whose history could not be read. Kept apart from `jobs` so it is never
/// mistaken for a job with no builds this period.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct JobFailure {
  pub job: String,
  pub error: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ReportAggregate {
  pub period_start_ms: i64,
  pub jobs: Vec<JobTally>,
  pub total_success: u64,
  pub total_failure: u64,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub failed_jobs: Vec<JobFailure>,
}

impl ReportAggregate {
  pub fn new(period_start_ms: i64) -> Self {
    Self {
      period_start_ms,
      jobs: Vec::new(),
      total_success: 0,
      total_failure: 0,
      failed_jobs: Vec::new(),
    }
  }

  /// Fold one job into the report. Inactive jobs are dropped.
  pub fn push_tally(&mut self, tally: JobTally) -> bool {
    if tally.total() == 0 {
      return false;
    }
    self.total_success += tally.success;
    self.total_failure += tally.failure;
    self.jobs.push(tally);
    true
  }

  pub fn total(&self) -> u64 {
    self.total_success + self.total_failure
  }
}
