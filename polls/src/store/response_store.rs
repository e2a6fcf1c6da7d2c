use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::PollStore;
use crate::core::tally::tally;
use crate::error::{NotFoundSnafu, Result};
use crate::model::{OptionTally, Response};

/// Append-only response collections keyed by poll id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseStore {
    responses: BTreeMap<String, Vec<Response>>,
}

impl ResponseStore {
    /// Create an empty collection for `poll_id` unless one exists.
    pub fn ensure(&mut self, poll_id: &str) {
        self.responses.entry(poll_id.to_string()).or_default();
    }

    /// Replace the collection for `poll_id` with an empty one.
    pub fn reset(&mut self, poll_id: &str) {
        self.responses.insert(poll_id.to_string(), Vec::new());
    }

    pub fn remove(&mut self, poll_id: &str) -> Option<Vec<Response>> {
        self.responses.remove(poll_id)
    }

    /// Append one response. The collection must already exist.
    pub fn append(&mut self, poll_id: &str, response: Response) -> Result<()> {
        let collection = self
            .responses
            .get_mut(poll_id)
            .ok_or_else(|| NotFoundSnafu { id: poll_id }.build())?;
        collection.push(response);
        Ok(())
    }

    /// Truncate the collection to empty.
    pub fn clear(&mut self, poll_id: &str) -> Result<()> {
        let collection = self
            .responses
            .get_mut(poll_id)
            .ok_or_else(|| NotFoundSnafu { id: poll_id }.build())?;
        collection.clear();
        Ok(())
    }

    pub fn get(&self, poll_id: &str) -> Option<&[Response]> {
        self.responses.get(poll_id).map(Vec::as_slice)
    }

    /// Per-option counts for `poll_id` against the canonical option list.
    pub fn tally(&self, poll_id: &str, options: &[String]) -> Vec<OptionTally> {
        tally(options, self.get(poll_id).unwrap_or_default())
    }

    /// Stored responses for `poll_id`, valid or not.
    pub fn count(&self, poll_id: &str) -> usize {
        self.get(poll_id).map_or(0, <[Response]>::len)
    }

    pub fn total(&self) -> usize {
        self.responses.values().map(Vec::len).sum()
    }

    /// Ids with a collection but no poll.
    pub(crate) fn orphans(&self, polls: &PollStore) -> Vec<String> {
        self.responses
            .keys()
            .filter(|id| polls.get(id).is_none())
            .cloned()
            .collect()
    }
}
