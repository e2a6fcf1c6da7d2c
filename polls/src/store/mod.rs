//! In-memory poll and response stores and the combined state they form.

mod poll_store;
mod response_store;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub use poll_store::PollStore;
pub use response_store::ResponseStore;

use crate::model::Poll;

/// Persisted form of the whole state: `{polls: {id -> Poll}, responses: {id -> [Response]}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub polls: PollStore,
    #[serde(default)]
    pub responses: ResponseStore,
}

/// Both stores, mutated together.
///
/// Every poll id has exactly one response collection; the methods here are
/// the only way to add or remove a poll so the pairing cannot drift.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollState {
    polls: PollStore,
    responses: ResponseStore,
}

impl PollState {
    /// Rebuild state from a loaded snapshot, restoring the one-to-one pairing
    /// between polls and response collections.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let Snapshot {
            polls,
            mut responses,
        } = snapshot;
        for orphan in responses.orphans(&polls) {
            warn!(poll_id = %orphan, "dropping responses for unknown poll");
            responses.remove(&orphan);
        }
        for poll in polls.iter() {
            responses.ensure(&poll.id);
        }
        Self { polls, responses }
    }

    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            polls: self.polls.clone(),
            responses: self.responses.clone(),
        }
    }

    pub fn polls(&self) -> &PollStore {
        &self.polls
    }

    pub fn responses(&self) -> &ResponseStore {
        &self.responses
    }

    pub fn responses_mut(&mut self) -> &mut ResponseStore {
        &mut self.responses
    }

    pub fn contains(&self, id: &str) -> bool {
        self.polls.get(id).is_some()
    }

    /// Insert or overwrite a poll and reset its responses to empty.
    ///
    /// Returns true when an existing poll was replaced.
    pub fn create_or_replace(&mut self, poll: Poll) -> bool {
        let id = poll.id.clone();
        let replaced = self.polls.create_or_replace(poll).is_some();
        self.responses.reset(&id);
        replaced
    }

    /// Remove a poll and its responses. Returns true if the poll existed.
    pub fn delete(&mut self, id: &str) -> bool {
        let existed = self.polls.delete(id).is_some();
        self.responses.remove(id);
        existed
    }
}
