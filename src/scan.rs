// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Walk one job's newest-first build history page by page and tally builds inside the period
// role: core/scanner
// inputs: BuildPageSource, job name, PeriodBoundary, ScanOptions (page size, keep builds)
// outputs: JobTally (possibly total == 0)
// side_effects: Read calls to the page source only
// invariants:
// - a build at exactly the boundary is counted; one older stops the scan
// - no page is fetched after the page holding the first out-of-period build
// - tallies do not depend on page size
// errors: ScanError::Fetch / ScanError::MalformedPage with job and offset; never swallowed
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use thiserror::Error;

use crate::model::{BuildOutcome, BuildRecord, JobTally};
use crate::source::{BuildPageSource, FetchError};
use crate::window::PeriodBoundary;

pub const DEFAULT_PAGE_SIZE: usize = 5;

#[derive(Debug, Error)]
pub enum ScanError {
  #[error("could not read build history of `{job}` (offset {offset})")]
  Fetch {
    job: String,
    offset: usize,
    #[source]
    source: FetchError,
  },
  #[error("malformed build page for `{job}` at offset {offset}: build {index} has no `{field}`")]
  MalformedPage {
    job: String,
    offset: usize,
    index: usize,
    field: &'static str,
  },
}

impl ScanError {
  fn from_fetch(job: &str, offset: usize, err: FetchError) -> Self {
    match err {
      FetchError::Malformed { index, field } => ScanError::MalformedPage {
        job: job.to_string(),
        offset,
        index,
        field,
      },
      other => ScanError::Fetch {
        job: job.to_string(),
        offset,
        source: other,
      },
    }
  }

  pub fn job(&self) -> &str {
    match self {
      ScanError::Fetch { job, .. } | ScanError::MalformedPage { job, .. } => job,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
  pub page_size: usize,
  pub keep_builds: bool,
}

impl Default for ScanOptions {
  fn default() -> Self {
    Self {
      page_size: DEFAULT_PAGE_SIZE,
      keep_builds: false,
    }
  }
}

/// Fold state threaded through the pagination loop.
#[derive(Debug, Default)]
struct ScanState {
  offset: usize,
  success: u64,
  failure: u64,
  builds: Vec<BuildRecord>,
}

enum Step {
  Continue(ScanState),
  Done(ScanState),
}

fn fold_page(mut state: ScanState, page: Vec<BuildRecord>, boundary: PeriodBoundary, keep_builds: bool) -> Step {
  for build in page {
    if !boundary.includes(build.timestamp_ms) {
      return Step::Done(state);
    }
    match build.outcome {
      BuildOutcome::Success => state.success += 1,
      BuildOutcome::Other => state.failure += 1,
    }
    if keep_builds {
      state.builds.push(build);
    }
  }
  Step::Continue(state)
}

/// Tally the builds of `job` at or after `boundary`.
///
/// Pages are requested strictly in sequence; the scan ends on an empty page or
/// on the first build older than the boundary.
pub fn scan_job<S>(source: &S, job: &str, boundary: PeriodBoundary, opts: &ScanOptions) -> Result<JobTally, ScanError>
where
  S: BuildPageSource + ?Sized,
{
  let page_size = opts.page_size.max(1);
  let mut state = ScanState::default();
  let mut pages = 0usize;

  let state = loop {
    let offset = state.offset;
    let page = source
      .fetch_page(job, offset, page_size)
      .map_err(|e| ScanError::from_fetch(job, offset, e))?;
    pages += 1;
    tracing::trace!(job, offset, len = page.len(), "fetched build page");

    if page.is_empty() {
      break state;
    }

    match fold_page(state, page, boundary, opts.keep_builds) {
      Step::Done(s) => break s,
      Step::Continue(mut s) => {
        s.offset += page_size;
        state = s;
      }
    }
  };

  tracing::debug!(job, pages, success = state.success, failure = state.failure, "scanned job");

  Ok(JobTally {
    job: job.to_string(),
    success: state.success,
    failure: state.failure,
    builds: state.builds,
  })
}
