use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::Poll;

/// Poll definitions keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PollStore {
    polls: BTreeMap<String, Poll>,
}

impl PollStore {
    /// Insert `poll`, returning the definition it replaced.
    pub fn create_or_replace(&mut self, poll: Poll) -> Option<Poll> {
        self.polls.insert(poll.id.clone(), poll)
    }

    pub fn get(&self, id: &str) -> Option<&Poll> {
        self.polls.get(id)
    }

    /// Remove a poll. Absent ids are a no-op.
    pub fn delete(&mut self, id: &str) -> Option<Poll> {
        self.polls.remove(id)
    }

    /// All polls ordered by `(created, id)`.
    pub fn list(&self) -> Vec<&Poll> {
        let mut polls: Vec<&Poll> = self.polls.values().collect();
        polls.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));
        polls
    }

    pub fn iter(&self) -> impl Iterator<Item = &Poll> {
        self.polls.values()
    }

    pub fn len(&self) -> usize {
        self.polls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Utc};

    use super::*;

    fn poll_at(id: &str, seconds: i64) -> Poll {
        Poll {
            id: id.to_string(),
            title: id.to_string(),
            question: "Q?".to_string(),
            options: vec!["A".to_string()],
            created: DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(seconds),
            active: true,
            course: None,
            week: None,
        }
    }

    #[test]
    fn list_orders_by_creation_then_id() {
        let mut store = PollStore::default();
        store.create_or_replace(poll_at("zeta", 1));
        store.create_or_replace(poll_at("beta", 2));
        store.create_or_replace(poll_at("alpha", 2));

        let ids: Vec<&str> = store.list().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["zeta", "alpha", "beta"]);
    }

    #[test]
    fn delete_missing_is_noop() {
        let mut store = PollStore::default();
        store.create_or_replace(poll_at("q", 0));
        assert!(store.delete("other").is_none());
        assert_eq!(store.len(), 1);
    }
}
