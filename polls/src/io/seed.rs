//! Seed files: poll definitions applied without overwriting existing polls.
//!
//! ```toml
//! [polls.anxiety]
//! title = "Statistics Anxiety"
//! question = "How nervous are you?"
//! options = ["Very", "Somewhat", "Not at all"]
//! course = "PH3130 Statistics"
//! week = 3
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use crate::core::ids::composite_id;
use crate::error::{ParseSeedSnafu, ReadSeedSnafu, Result};
use crate::model::PollDraft;

/// One poll definition from a seed file or an import request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollDefinition {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default, deserialize_with = "crate::model::tag::deserialize")]
    pub course: Option<String>,
    #[serde(default, deserialize_with = "crate::model::tag::deserialize")]
    pub week: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

impl PollDefinition {
    /// Store id for this definition, including course/week when both are set.
    pub fn poll_id(&self) -> String {
        composite_id(
            self.id.trim(),
            self.course.as_deref(),
            self.week.as_deref(),
        )
    }

    /// Draft for the composite id. An absent title stays keyed on the bare id.
    pub fn to_draft(&self) -> PollDraft {
        PollDraft {
            id: self.poll_id(),
            title: Some(
                self.title
                    .clone()
                    .unwrap_or_else(|| self.id.trim().to_string()),
            ),
            question: self.question.clone(),
            options: self.options.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SeedFile {
    #[serde(default)]
    polls: BTreeMap<String, SeedEntry>,
}

#[derive(Debug, Deserialize)]
struct SeedEntry {
    title: Option<String>,
    #[serde(default)]
    question: String,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default, deserialize_with = "crate::model::tag::deserialize")]
    course: Option<String>,
    #[serde(default, deserialize_with = "crate::model::tag::deserialize")]
    week: Option<String>,
    active: Option<bool>,
}

/// Read every definition in a seed file, ordered by table key.
pub fn load_seed_file(path: &Path) -> Result<Vec<PollDefinition>> {
    let contents = fs::read_to_string(path).context(ReadSeedSnafu {
        path: path.to_path_buf(),
    })?;
    parse_seed(&contents).context(ParseSeedSnafu {
        path: path.to_path_buf(),
    })
}

fn parse_seed(contents: &str) -> Result<Vec<PollDefinition>, toml::de::Error> {
    let file: SeedFile = toml::from_str(contents)?;
    Ok(file
        .polls
        .into_iter()
        .map(|(id, entry)| PollDefinition {
            id,
            title: entry.title,
            question: entry.question,
            options: entry.options,
            course: entry.course,
            week: entry.week,
            active: entry.active,
        })
        .collect())
}
