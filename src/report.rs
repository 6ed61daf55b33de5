// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Orchestrate one report run: pick the source, resolve jobs and boundary, aggregate, render, write
// role: processing/orchestrator
// inputs: EffectiveConfig
// outputs: REPORT-<date>.<ext> under --dir, the --out file, or stdout
// side_effects: Network/file reads through the source; creates directories; writes the report; prints the path
// invariants:
// - nothing is written when aggregation fails
// - file date is "now" in the report timezone; label comes from the boundary
// - stdout carries either the report itself (--out -) or the written path, never logs
// errors: Propagates source, aggregation, and IO errors with context
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::aggregate::{AggregateOptions, aggregate};
use crate::cli::{EffectiveConfig, SourceSpec};
use crate::model::ReportAggregate;
use crate::scan::ScanOptions;
use crate::source::{CiServer, FixtureSource, JenkinsClient};
use crate::util;
use crate::window::{PeriodBoundary, parse_now_override, period_label, resolve_boundary};

/// Where the rendered report ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
  Stdout,
  File(PathBuf),
}

pub fn build_source(cfg: &EffectiveConfig) -> Result<Box<dyn CiServer>> {
  match &cfg.source {
    SourceSpec::Fixture { path } => {
      tracing::info!(path = %path, "reading build history from fixture");
      Ok(Box::new(FixtureSource::from_path(Path::new(path))?))
    }
    SourceSpec::Jenkins { url } => {
      let creds = cfg.user.as_deref().zip(cfg.token.as_deref());
      Ok(Box::new(JenkinsClient::new(url.clone(), creds, Duration::from_secs(cfg.timeout_secs))))
    }
  }
}

/// Jobs named with `--job`, else every job the server lists.
pub fn resolve_jobs(server: &dyn CiServer, cfg: &EffectiveConfig) -> Result<Vec<String>> {
  if !cfg.only_jobs.is_empty() {
    return Ok(cfg.only_jobs.clone());
  }
  let jobs = server.list_jobs().context("listing jobs")?;
  if jobs.is_empty() {
    tracing::warn!("server lists no jobs; the report will be empty");
  }
  Ok(jobs)
}

pub fn destination(cfg: &EffectiveConfig, now: DateTime<Utc>) -> Destination {
  match cfg.out.as_deref() {
    Some("-") => Destination::Stdout,
    Some(path) => Destination::File(PathBuf::from(path)),
    None => {
      let date = cfg.tz.date_of(now).format("%Y-%m-%d");
      Destination::File(Path::new(&cfg.dir).join(format!("REPORT-{}.{}", date, cfg.format.extension())))
    }
  }
}

pub fn write_report(dest: &Destination, bytes: &[u8]) -> Result<()> {
  match dest {
    Destination::Stdout => {
      use std::io::Write;
      let mut stdout = std::io::stdout().lock();
      stdout.write_all(bytes).context("writing report to stdout")?;
      stdout.flush()?;
    }
    Destination::File(path) => {
      if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
      }
      std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
      tracing::info!(path = %path.display(), "report written");
      println!("{}", path.display());
    }
  }
  Ok(())
}

pub fn collect(server: &dyn CiServer, cfg: &EffectiveConfig, boundary: PeriodBoundary) -> Result<ReportAggregate> {
  let jobs = resolve_jobs(server, cfg)?;
  let opts = AggregateOptions {
    scan: ScanOptions {
      page_size: cfg.page_size,
      keep_builds: cfg.keep_builds,
    },
    workers: cfg.workers,
    on_fetch_error: cfg.on_fetch_error,
  };
  aggregate(server, &jobs, boundary, &opts)
}

pub fn run(cfg: &EffectiveConfig) -> Result<()> {
  let now = util::effective_now(parse_now_override(cfg.now_override.as_deref(), &cfg.tz)?);
  let boundary = resolve_boundary(cfg.since.as_deref(), now, &cfg.tz)?;
  let label = period_label(boundary, &cfg.tz);
  tracing::info!(label = %label, boundary = boundary.millis(), tz = %cfg.tz, "report period");

  let server = build_source(cfg)?;
  let agg = collect(server.as_ref(), cfg, boundary)?;

  let bytes = cfg.format.render(&agg, &label, &cfg.tz)?;
  write_report(&destination(cfg, now), &bytes)
}
