// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Scan every job (optionally on a bounded worker pool) and merge tallies into one ReportAggregate
// role: core/aggregator
// inputs: BuildPageSource (Sync), ordered job names, PeriodBoundary, AggregateOptions
// outputs: ReportAggregate (active jobs only, input order preserved)
// side_effects: Spawns a rayon pool when workers > 1
// invariants:
// - every job is scanned; there is no early exit after the first active job
// - totals are summed only over included jobs; inactive jobs are omitted
// - merging happens in one pass after all scans finish, in input order
// - a job whose history could not be read is never reported as 0/0
// errors: Abort policy returns the first ScanError in input order; Record policy lists failures
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use anyhow::{Context, Result};
use clap::ValueEnum;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::model::{JobFailure, JobTally, ReportAggregate};
use crate::scan::{ScanError, ScanOptions, scan_job};
use crate::source::BuildPageSource;
use crate::window::PeriodBoundary;

/// What to do when a job's history cannot be read.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
#[value(rename_all = "lowercase")]
pub enum FailurePolicy {
  /// Fail the whole run.
  #[default]
  Abort,
  /// Keep going and list the job under failed jobs.
  Record,
}

#[derive(Debug, Clone, Copy)]
pub struct AggregateOptions {
  pub scan: ScanOptions,
  pub workers: usize,
  pub on_fetch_error: FailurePolicy,
}

impl Default for AggregateOptions {
  fn default() -> Self {
    Self {
      scan: ScanOptions::default(),
      workers: 1,
      on_fetch_error: FailurePolicy::Abort,
    }
  }
}

type JobResult = std::result::Result<JobTally, ScanError>;

fn scan_all<S>(source: &S, jobs: &[String], boundary: PeriodBoundary, opts: &AggregateOptions) -> Result<Vec<JobResult>>
where
  S: BuildPageSource + Sync + ?Sized,
{
  let scan_one = |job: &String| scan_job(source, job, boundary, &opts.scan);

  if opts.workers <= 1 || jobs.len() <= 1 {
    return Ok(jobs.iter().map(scan_one).collect());
  }

  let pool = rayon::ThreadPoolBuilder::new()
    .num_threads(opts.workers)
    .thread_name(|i| format!("scan-{}", i))
    .build()
    .context("building scan worker pool")?;

  // Indexed collect keeps results in job order.
  Ok(pool.install(|| jobs.par_iter().map(scan_one).collect()))
}

/// Merge per-job results in input order.
fn merge(period_start_ms: i64, results: Vec<JobResult>, policy: FailurePolicy) -> std::result::Result<ReportAggregate, ScanError> {
  let mut agg = ReportAggregate::new(period_start_ms);

  for result in results {
    match result {
      Ok(tally) => {
        let job = tally.job.clone();
        let (s, f) = (tally.success, tally.failure);
        if agg.push_tally(tally) {
          tracing::info!(job = %job, success = s, failure = f, "job active this period");
        } else {
          tracing::debug!(job = %job, "no builds this period");
        }
      }
      Err(err) => match policy {
        FailurePolicy::Abort => return Err(err),
        FailurePolicy::Record => {
          let error = error_chain(&err);
          tracing::warn!(job = err.job(), error = %error, "recording failed job");
          agg.failed_jobs.push(JobFailure {
            job: err.job().to_string(),
            error,
          });
        }
      },
    }
  }

  Ok(agg)
}

fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
  let mut out = err.to_string();
  let mut cur = err.source();
  while let Some(e) = cur {
    out.push_str(": ");
    out.push_str(&e.to_string());
    cur = e.source();
  }
  out
}

/// Scan `jobs` against `boundary` and fold the results into a report.
pub fn aggregate<S>(source: &S, jobs: &[String], boundary: PeriodBoundary, opts: &AggregateOptions) -> Result<ReportAggregate>
where
  S: BuildPageSource + Sync + ?Sized,
{
  tracing::info!(jobs = jobs.len(), workers = opts.workers, period_start = boundary.millis(), "scanning jobs");

  let results = scan_all(source, jobs, boundary, opts)?;
  let agg = merge(boundary.millis(), results, opts.on_fetch_error)?;

  tracing::info!(
    active = agg.jobs.len(),
    failed = agg.failed_jobs.len(),
    success = agg.total_success,
    failure = agg.total_failure,
    "aggregate ready"
  );
  Ok(agg)
}
