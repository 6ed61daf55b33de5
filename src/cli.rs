use anyhow::{Result, bail};
use clap::builder::TypedValueParser;
use clap::{ArgAction, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::aggregate::FailurePolicy;
use crate::render::ReportFormat;
use crate::scan::DEFAULT_PAGE_SIZE;
use crate::source::jenkins::parse_base_url;
use crate::util;
use crate::window::ReportTz;

#[derive(Parser, Debug)]
#[command(
    name = "jenkins-weekly-report",
    version,
    about = "Summarize this week's Jenkins builds per job (success vs. not success)",
    long_about = None
)]
pub struct Cli {
  /// Jenkins base URL, e.g. https://ci.example.com
  #[arg(long, env = "JENKINS_URL")]
  pub url: Option<String>,

  /// Jenkins user for basic auth (pair with --token)
  #[arg(long, env = "JENKINS_USER")]
  pub user: Option<String>,

  /// Jenkins API token for basic auth (pair with --user)
  #[arg(long, env = "JENKINS_TOKEN", hide_env_values = true)]
  pub token: Option<String>,

  /// Directory for REPORT-<date>.<ext>
  #[arg(long, default_value = ".")]
  pub dir: PathBuf,

  /// Explicit output file; "-" prints to stdout (overrides --dir)
  #[arg(long)]
  pub out: Option<String>,

  /// Output format
  #[arg(long, value_enum, default_value_t = ReportFormat::Csv)]
  pub format: ReportFormat,

  /// Keep per-build detail in the report (always on for html)
  #[arg(long)]
  pub detailed: bool,

  /// Builds requested per history page
  #[arg(long, default_value_t = DEFAULT_PAGE_SIZE, value_parser = clap::value_parser!(u32).range(1..=1000).map(|v| v as usize))]
  pub page_size: usize,

  /// Number of jobs scanned concurrently
  #[arg(long = "jobs", short = 'j', default_value_t = 4, value_parser = clap::value_parser!(u32).range(1..=64).map(|v| v as usize))]
  pub workers: usize,

  /// Only report these jobs (repeatable; order is kept). Default: every job on the server
  #[arg(long = "job", value_name = "NAME")]
  pub only_jobs: Vec<String>,

  /// HTTP timeout per request, in seconds
  #[arg(long, default_value_t = 30)]
  pub timeout_secs: u64,

  /// What to do when a job's history cannot be read
  #[arg(long, value_enum, default_value_t = FailurePolicy::Abort)]
  pub on_fetch_error: FailurePolicy,

  /// Timezone for the week boundary and timestamps: local, utc or an IANA name
  #[arg(long, default_value = "local")]
  pub tz: String,

  /// Period start as YYYY-MM-DD instead of this week's Monday
  #[arg(long)]
  pub since: Option<String>,

  /// More logging (-v info, -vv debug); RUST_LOG wins when set
  #[arg(short, long, action = ArgAction::Count)]
  pub verbose: u8,

  /// Emit a troff man page to stdout (internal; for packaging)
  #[arg(long, hide = true)]
  pub gen_man: bool,

  /// Override the "now" instant (hidden; tests only)
  #[arg(long = "now-override", hide = true)]
  pub now_override: Option<String>,
}

/// Where the job history comes from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum SourceSpec {
  Jenkins { url: url::Url },
  Fixture { path: String },
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EffectiveConfig {
  pub source: SourceSpec,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub user: Option<String>,
  #[serde(skip)]
  pub token: Option<String>,
  pub dir: String,
  pub out: Option<String>,
  pub format: ReportFormat,
  pub keep_builds: bool,
  pub page_size: usize,
  pub workers: usize,
  pub only_jobs: Vec<String>,
  pub timeout_secs: u64,
  pub on_fetch_error: FailurePolicy,
  pub tz: ReportTz,
  pub since: Option<String>,
  pub now_override: Option<String>,
}

pub fn normalize(cli: Cli, fixture: Option<String>) -> Result<EffectiveConfig> {
  let source = match (fixture, &cli.url) {
    (Some(path), _) => SourceSpec::Fixture { path },
    (None, Some(url)) if !url.trim().is_empty() => SourceSpec::Jenkins {
      url: parse_base_url(url)?,
    },
    (None, _) => bail!("Provide --url (or set JENKINS_URL)"),
  };

  if cli.user.is_some() != cli.token.is_some() {
    bail!("--user and --token must be given together");
  }

  let tz: ReportTz = cli.tz.parse()?;

  // Preserve first occurrence order, drop repeats.
  let mut only_jobs: Vec<String> = Vec::with_capacity(cli.only_jobs.len());
  for j in cli.only_jobs {
    if !only_jobs.contains(&j) {
      only_jobs.push(j);
    }
  }

  Ok(EffectiveConfig {
    source,
    user: cli.user,
    token: cli.token,
    dir: util::canonicalize_lossy(&cli.dir),
    out: cli.out,
    keep_builds: cli.detailed || cli.format.wants_build_detail(),
    format: cli.format,
    page_size: cli.page_size,
    workers: cli.workers,
    only_jobs,
    timeout_secs: cli.timeout_secs,
    on_fetch_error: cli.on_fetch_error,
    tz,
    since: cli.since,
    now_override: cli.now_override,
  })
}
