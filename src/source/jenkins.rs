// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Jenkins JSON API client implementing JobDirectory and BuildPageSource
// role: source/jenkins-http
// inputs: server base URL, optional user + API token, request timeout
// outputs: job names; validated build pages
// side_effects: Network calls to the Jenkins server
// invariants:
// - build pages use the tree range {offset,offset+limit}
// - basic auth header is sent only when both user and token are configured
// errors: FetchError; never retried here
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::time::Duration;

use anyhow::{Context, Result, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use url::Url;

use super::{BuildPageSource, FetchError, JobDirectory, parse_builds, parse_job_names};
use crate::ext::serde_json::JsonFetch;
use crate::model::BuildRecord;

/// Parse and check a Jenkins base URL (`--url`). Only http(s) URLs that can
/// carry a path are accepted.
pub fn parse_base_url(raw: &str) -> Result<Url> {
  let url = Url::parse(raw.trim()).with_context(|| format!("invalid --url `{}`", raw))?;
  if !matches!(url.scheme(), "http" | "https") {
    bail!("invalid --url `{}`: expected an http or https URL", raw);
  }
  if url.cannot_be_a_base() {
    bail!("invalid --url `{}`: not a base URL", raw);
  }
  Ok(url)
}

pub struct JenkinsClient {
  base_url: Url,
  auth_header: Option<String>,
  agent: ureq::Agent,
}

impl JenkinsClient {
  pub fn new(base_url: Url, credentials: Option<(&str, &str)>, timeout: Duration) -> Self {
    let agent = ureq::AgentBuilder::new()
      .timeout(timeout)
      .user_agent(concat!("jenkins-weekly-report/", env!("CARGO_PKG_VERSION")))
      .build();

    Self {
      base_url,
      auth_header: credentials.map(|(user, token)| basic_auth(user, token)),
      agent,
    }
  }

  // Segments are percent-encoded by `url`; a job name never splits the path.
  fn endpoint(&self, segments: &[&str]) -> Result<Url, FetchError> {
    let mut url = self.base_url.clone();
    url
      .path_segments_mut()
      .map_err(|()| FetchError::Transport {
        url: self.base_url.to_string(),
        detail: "base URL cannot carry a path".into(),
      })?
      .pop_if_empty()
      .extend(segments);
    Ok(url)
  }

  pub fn jobs_url(&self) -> Result<Url, FetchError> {
    self.endpoint(&["api", "json"])
  }

  pub fn job_url(&self, job: &str) -> Result<Url, FetchError> {
    self.endpoint(&["job", job, "api", "json"])
  }

  fn get_json(&self, url: &Url, tree: &str) -> Result<serde_json::Value, FetchError> {
    let mut req = self.agent.request_url("GET", url).query("tree", tree);
    if let Some(auth) = &self.auth_header {
      req = req.set("Authorization", auth);
    }

    tracing::trace!(url = %url, tree, "GET");

    let resp = match req.call() {
      Ok(r) => r,
      Err(ureq::Error::Status(status, _)) => {
        return Err(FetchError::Status {
          url: url.to_string(),
          status,
        });
      }
      Err(e) => {
        return Err(FetchError::Transport {
          url: url.to_string(),
          detail: e.to_string(),
        });
      }
    };

    resp.into_json::<serde_json::Value>().map_err(|e| FetchError::Decode {
      url: url.to_string(),
      detail: e.to_string(),
    })
  }
}

/// Jenkins range selector for the `tree` parameter: `{start,end}`, end exclusive.
pub fn builds_tree(offset: usize, limit: usize) -> String {
  format!("builds[number,timestamp,result]{{{},{}}}", offset, offset + limit)
}

fn basic_auth(user: &str, token: &str) -> String {
  format!("Basic {}", STANDARD.encode(format!("{}:{}", user, token)))
}

impl JobDirectory for JenkinsClient {
  fn list_jobs(&self) -> Result<Vec<String>, FetchError> {
    let url = self.jobs_url()?;
    let body = self.get_json(&url, "jobs[name]")?;
    parse_job_names(url.as_str(), &body)
  }
}

impl BuildPageSource for JenkinsClient {
  fn fetch_page(&self, job: &str, offset: usize, limit: usize) -> Result<Vec<BuildRecord>, FetchError> {
    let url = self.job_url(job)?;
    let body = self.get_json(&url, &builds_tree(offset, limit))?;

    let items = body.fetch("builds").as_array().ok_or_else(|| FetchError::Decode {
      url: url.to_string(),
      detail: "missing `builds` array".into(),
    })?;

    parse_builds(items)
  }
}
