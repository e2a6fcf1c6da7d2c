//! Serializable poll records and the views built from them.
//!
//! Field names match the persisted snapshot and the HTTP API; renaming one
//! breaks snapshots written by earlier versions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A multiple-choice question identified by a unique id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    /// External lookup key, also embedded in share links.
    pub id: String,
    pub title: String,
    pub question: String,
    /// Display and tally order.
    pub options: Vec<String>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created: DateTime<Utc>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(
        default,
        deserialize_with = "tag::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub course: Option<String>,
    #[serde(
        default,
        deserialize_with = "tag::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub week: Option<String>,
}

fn default_active() -> bool {
    true
}

/// One submitted answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub response: String,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub timestamp: DateTime<Utc>,
}

/// Caller-supplied fields for creating a poll.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollDraft {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub question: String,
    pub options: Vec<String>,
}

/// Poll plus the number of stored responses, for listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollSummary {
    #[serde(flatten)]
    pub poll: Poll,
    pub responses: usize,
}

/// Count for one option of a poll.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionTally {
    pub option: String,
    pub count: usize,
    /// `count / total * 100`, one decimal place.
    pub percentage: f64,
}

/// Results of a poll in option order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollResults {
    pub poll: Poll,
    pub tally: Vec<OptionTally>,
    /// Every stored response, matching an option or not.
    pub total: usize,
    /// Responses that matched an option; never exceeds `total`.
    pub matched: usize,
}

impl PollResults {
    pub fn count_for(&self, option: &str) -> Option<usize> {
        self.tally
            .iter()
            .find(|entry| entry.option == option)
            .map(|entry| entry.count)
    }

    pub fn percentage_for(&self, option: &str) -> Option<f64> {
        self.tally
            .iter()
            .find(|entry| entry.option == option)
            .map(|entry| entry.percentage)
    }
}

/// Whether a submitted response matched one of the poll's options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitOutcome {
    Matched,
    /// Stored, but excluded from the tally.
    Unmatched,
}

/// Outcome of a bulk seed or import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    /// Ids created by this batch, in input order.
    pub created: Vec<String>,
    /// Ids that already existed and were left untouched.
    pub skipped: Vec<String>,
    /// Ids whose definitions failed validation, with the reason.
    pub rejected: Vec<(String, String)>,
}

/// Timestamps are written as RFC 3339. Older data files carry naive ISO 8601
/// local times without an offset; those are read as UTC.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        parse(&text).ok_or_else(|| D::Error::custom(format!("invalid timestamp '{text}'")))
    }

    pub(super) fn parse(text: &str) -> Option<DateTime<Utc>> {
        if let Ok(at) = DateTime::parse_from_rfc3339(text) {
            return Some(at.with_timezone(&Utc));
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
            .map(|naive| naive.and_utc())
    }
}

/// Course and week tags may be written as strings or numbers; blank text is
/// the same as no tag.
pub(crate) mod tag {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Tag {
        Text(String),
        Integer(i64),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let tag = Option::<Tag>::deserialize(deserializer)?;
        Ok(tag
            .map(|tag| match tag {
                Tag::Text(text) => text.trim().to_string(),
                Tag::Integer(n) => n.to_string(),
            })
            .filter(|text| !text.is_empty()))
    }
}
