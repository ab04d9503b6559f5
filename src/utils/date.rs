//! Front-matter date parsing.
//!
//! Dates are kept as naive UTC datetimes; the site has no notion of
//! timezones beyond what RFC 3339 input carries, which is normalized to UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

/// Accepted datetime layouts besides RFC 3339.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// A publication or update date from front matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PostDate(NaiveDateTime);

impl PostDate {
    /// Parse `YYYY-MM-DD`, `YYYY-MM-DD HH:MM[:SS]`, `YYYY-MM-DDTHH:MM:SS`
    /// or RFC 3339.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();

        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Some(Self(date.and_time(NaiveTime::MIN)));
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(Self(dt.with_timezone(&Utc).naive_utc()));
        }
        DATETIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
            .map(Self)
    }

    /// `YYYY-MM-DD`, used by the sitemap and as the template-facing value.
    pub fn ymd(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }

    /// e.g. `Mon, 15 Jan 2024 10:30:45 +0000`
    pub fn to_rfc2822(self) -> String {
        self.0.and_utc().to_rfc2822()
    }

    /// ISO 8601 with seconds, e.g. `2024-01-15T10:30:45Z`.
    pub fn to_rfc3339(self) -> String {
        self.0.and_utc().format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }

    /// Format with a chrono `strftime` pattern.
    ///
    /// Returns `None` for patterns chrono cannot render.
    pub fn format(&self, pattern: &str) -> Option<String> {
        use std::fmt::Write;
        let mut out = String::new();
        write!(out, "{}", self.0.format(pattern)).ok()?;
        Some(out)
    }
}

impl fmt::Display for PostDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.time() == NaiveTime::MIN {
            f.write_str(&self.ymd())
        } else {
            f.write_str(&self.to_rfc3339())
        }
    }
}

impl Serialize for PostDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
