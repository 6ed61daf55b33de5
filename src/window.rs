use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Datelike, Days, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

// Period-boundary types live here to keep main focused.

/// Timezone used to place the week boundary and to label timestamps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportTz {
  Local,
  Zone(chrono_tz::Tz),
}

impl FromStr for ReportTz {
  type Err = anyhow::Error;

  fn from_str(s: &str) -> Result<Self> {
    if s.eq_ignore_ascii_case("local") {
      return Ok(ReportTz::Local);
    }
    if s.eq_ignore_ascii_case("utc") {
      return Ok(ReportTz::Zone(chrono_tz::UTC));
    }
    s.parse::<chrono_tz::Tz>()
      .map(ReportTz::Zone)
      .map_err(|_| anyhow!("unknown timezone `{}` (use local, utc or an IANA name)", s))
  }
}

impl fmt::Display for ReportTz {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ReportTz::Local => f.write_str("local"),
      ReportTz::Zone(z) if *z == chrono_tz::UTC => f.write_str("utc"),
      ReportTz::Zone(z) => f.write_str(z.name()),
    }
  }
}

impl Serialize for ReportTz {
  fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for ReportTz {
  fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
  }
}

impl ReportTz {
  /// Format an epoch-millisecond instant in this timezone.
  pub fn format_millis(&self, millis: i64, fmt: &str) -> String {
    let Some(utc) = DateTime::<Utc>::from_timestamp_millis(millis) else {
      return millis.to_string();
    };
    match self {
      ReportTz::Local => utc.with_timezone(&Local).format(fmt).to_string(),
      ReportTz::Zone(z) => utc.with_timezone(z).format(fmt).to_string(),
    }
  }

  /// Calendar date of `now` in this timezone.
  pub fn date_of(&self, now: DateTime<Utc>) -> NaiveDate {
    match self {
      ReportTz::Local => now.with_timezone(&Local).date_naive(),
      ReportTz::Zone(z) => now.with_timezone(z).date_naive(),
    }
  }

  fn midnight_millis(&self, date: NaiveDate) -> Result<i64> {
    match self {
      ReportTz::Local => midnight_in(&Local, date),
      ReportTz::Zone(z) => midnight_in(z, date),
    }
  }
}

fn midnight_in<Z: TimeZone>(tz: &Z, date: NaiveDate) -> Result<i64> {
  let naive = date.and_hms_opt(0, 0, 0).context("building midnight")?;
  // A DST jump at midnight leaves no 00:00; take the earliest valid instant.
  let dt = tz
    .from_local_datetime(&naive)
    .earliest()
    .or_else(|| tz.from_local_datetime(&(naive + chrono::Duration::hours(1))).earliest())
    .with_context(|| format!("{} has no midnight in this timezone", date))?;
  Ok(dt.timestamp_millis())
}

/// Start of the reporting period, in epoch milliseconds. Builds strictly older
/// than this are out of scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeriodBoundary(i64);

impl PeriodBoundary {
  pub fn from_millis(millis: i64) -> Self {
    Self(millis)
  }

  pub fn millis(&self) -> i64 {
    self.0
  }

  pub fn includes(&self, timestamp_ms: i64) -> bool {
    timestamp_ms >= self.0
  }
}

/// Monday of the week containing `date` (the date itself on Mondays).
pub fn monday_of(date: NaiveDate) -> NaiveDate {
  let back = u64::from(date.weekday().num_days_from_monday());
  date.checked_sub_days(Days::new(back)).unwrap_or(date)
}

/// Local midnight of the most recent Monday, as seen from `now` in `tz`.
pub fn start_of_week(now: DateTime<Utc>, tz: &ReportTz) -> Result<PeriodBoundary> {
  let monday = monday_of(tz.date_of(now));
  tz.midnight_millis(monday).map(PeriodBoundary::from_millis)
}

/// Midnight of an explicit `YYYY-MM-DD` date in `tz`.
pub fn start_of_day(ymd: &str, tz: &ReportTz) -> Result<PeriodBoundary> {
  let date = NaiveDate::parse_from_str(ymd.trim(), "%Y-%m-%d")
    .with_context(|| format!("invalid --since `{}`, expected YYYY-MM-DD", ymd))?;
  tz.midnight_millis(date).map(PeriodBoundary::from_millis)
}

/// Resolve the boundary for a run: explicit `--since`, else start of this week.
pub fn resolve_boundary(since: Option<&str>, now: DateTime<Utc>, tz: &ReportTz) -> Result<PeriodBoundary> {
  match since {
    Some(ymd) => {
      let b = start_of_day(ymd, tz)?;
      if b.millis() > now.timestamp_millis() {
        bail!("--since {} lies in the future", ymd);
      }
      Ok(b)
    }
    None => start_of_week(now, tz),
  }
}

/// Human label for the period, e.g. "Week of 2025-08-11".
pub fn period_label(boundary: PeriodBoundary, tz: &ReportTz) -> String {
  format!("Week of {}", tz.format_millis(boundary.millis(), "%Y-%m-%d"))
}

/// Parse a `--now-override` string into a UTC instant.
/// Accepts RFC3339 (e.g. 2025-08-15T12:00:00Z) or a naive timestamp
/// formatted as `%Y-%m-%dT%H:%M:%S`, read in `tz`.
pub fn parse_now_override(s: Option<&str>, tz: &ReportTz) -> Result<Option<DateTime<Utc>>> {
  let Some(raw) = s else { return Ok(None) };

  if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
    return Ok(Some(dt.with_timezone(&Utc)));
  }

  let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
    .with_context(|| format!("invalid --now-override `{}`", raw))?;
  let local = match tz {
    ReportTz::Local => Local.from_local_datetime(&naive).earliest().map(|d| d.with_timezone(&Utc)),
    ReportTz::Zone(z) => z.from_local_datetime(&naive).earliest().map(|d| d.with_timezone(&Utc)),
  };
  local.map(Some).with_context(|| format!("--now-override `{}` does not exist in {}", raw, tz))
}
