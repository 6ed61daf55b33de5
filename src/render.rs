// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Serialize a ReportAggregate into CSV, HTML or JSON bytes
// role: rendering/emitter
// inputs: ReportAggregate, period label, ReportTz for timestamps
// outputs: Vec<u8> ready to be written
// invariants:
// - CSV keeps the `JOB_NAME, SUCCESS, NOT_SUCCESS, TOTAL` header and one row per reported job
// - HTML escapes every server-provided string
// - rendering never touches scan state; same aggregate ⇒ same bytes
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::fmt::Write as _;

use anyhow::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::model::{BuildOutcome, ReportAggregate};
use crate::window::ReportTz;

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
#[value(rename_all = "lowercase")]
pub enum ReportFormat {
  Csv,
  Html,
  Json,
}

impl ReportFormat {
  pub fn extension(&self) -> &'static str {
    match self {
      ReportFormat::Csv => "csv",
      ReportFormat::Html => "html",
      ReportFormat::Json => "json",
    }
  }

  /// Per-build rows only make sense in HTML.
  pub fn wants_build_detail(&self) -> bool {
    matches!(self, ReportFormat::Html)
  }

  pub fn render(&self, agg: &ReportAggregate, label: &str, tz: &ReportTz) -> Result<Vec<u8>> {
    match self {
      ReportFormat::Csv => Ok(render_csv(agg).into_bytes()),
      ReportFormat::Html => Ok(render_html(agg, label, tz).into_bytes()),
      ReportFormat::Json => render_json(agg, label, tz),
    }
  }
}

pub fn render_csv(agg: &ReportAggregate) -> String {
  let mut out = String::from("JOB_NAME, SUCCESS, NOT_SUCCESS, TOTAL\n");
  for job in &agg.jobs {
    let _ = writeln!(out, "{}, {}, {}, {}", csv_field(&job.job), job.success, job.failure, job.total());
  }
  out
}

fn csv_field(s: &str) -> String {
  if s.contains([',', '"', '\n', '\r']) {
    format!("\"{}\"", s.replace('"', "\"\""))
  } else {
    s.to_string()
  }
}

pub fn render_json(agg: &ReportAggregate, label: &str, tz: &ReportTz) -> Result<Vec<u8>> {
  let doc = serde_json::json!({
    "label": label,
    "period_start": tz.format_millis(agg.period_start_ms, "%Y-%m-%dT%H:%M:%S%:z"),
    "timezone": tz.to_string(),
    "aggregate": agg,
  });
  Ok(serde_json::to_vec_pretty(&doc)?)
}

fn escape_html(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for c in s.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      _ => out.push(c),
    }
  }
  out
}

pub fn render_html(agg: &ReportAggregate, label: &str, tz: &ReportTz) -> String {
  let title = escape_html(label);
  let mut out = String::new();

  let _ = writeln!(out, "<!DOCTYPE html>");
  let _ = writeln!(out, "<html lang=\"en\">");
  let _ = writeln!(out, "<head>");
  let _ = writeln!(out, "<meta charset=\"utf-8\">");
  let _ = writeln!(out, "<title>{}</title>", title);
  let _ = writeln!(
    out,
    "<style>table{{border-collapse:collapse}}td,th{{border:1px solid #ccc;padding:2px 8px}}.other{{color:#b00}}</style>"
  );
  let _ = writeln!(out, "</head>");
  let _ = writeln!(out, "<body>");
  let _ = writeln!(out, "<h1>{}</h1>", title);
  let _ = writeln!(
    out,
    "<p>Builds since {} ({})</p>",
    escape_html(&tz.format_millis(agg.period_start_ms, "%Y-%m-%d %H:%M")),
    escape_html(&tz.to_string())
  );

  let _ = writeln!(out, "<table>");
  let _ = writeln!(out, "<tr><th>Job</th><th>Success</th><th>Not success</th><th>Total</th></tr>");
  for job in &agg.jobs {
    let _ = writeln!(
      out,
      "<tr class=\"job\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
      escape_html(&job.job),
      job.success,
      job.failure,
      job.total()
    );
    for b in &job.builds {
      let class = match b.outcome {
        BuildOutcome::Success => "success",
        BuildOutcome::Other => "other",
      };
      let _ = writeln!(
        out,
        "<tr class=\"build {}\"><td>#{}</td><td colspan=\"2\">{}</td><td>{}</td></tr>",
        class,
        b.number,
        escape_html(&tz.format_millis(b.timestamp_ms, "%Y-%m-%d %H:%M")),
        escape_html(b.result.as_deref().unwrap_or("RUNNING"))
      );
    }
  }
  let _ = writeln!(
    out,
    "<tr class=\"totals\"><th>Total</th><th>{}</th><th>{}</th><th>{}</th></tr>",
    agg.total_success,
    agg.total_failure,
    agg.total()
  );
  let _ = writeln!(out, "</table>");

  if !agg.failed_jobs.is_empty() {
    let _ = writeln!(out, "<h2>Jobs that could not be read</h2>");
    let _ = writeln!(out, "<ul>");
    for f in &agg.failed_jobs {
      let _ = writeln!(out, "<li><b>{}</b>: {}</li>", escape_html(&f.job), escape_html(&f.error));
    }
    let _ = writeln!(out, "</ul>");
  }

  let _ = writeln!(out, "</body>");
  let _ = writeln!(out, "</html>");
  out
}
