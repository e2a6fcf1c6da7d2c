//! Poll service: the operations exposed to the CLI and HTTP boundary.
//!
//! All state lives behind one `RwLock`. A mutation holds the write lock for
//! its whole duration: it edits a copy of the state, saves that copy through
//! the [`SnapshotStore`], and only then swaps it in. Readers therefore never
//! observe a change that did not reach storage, and a failed save leaves the
//! in-memory state untouched. Concurrent submissions to one poll are
//! serialized by the lock, so no append is lost.

use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use snafu::ensure;
use tracing::{debug, info, warn};

use crate::core::tally::matches_option;
use crate::core::validate::normalize_draft;
use crate::error::{InvalidOptionSnafu, NotFoundSnafu, PollInactiveSnafu, Result, ValidationSnafu};
use crate::io::seed::PollDefinition;
use crate::io::snapshot::SnapshotStore;
use crate::model::{Poll, PollDraft, PollResults, PollSummary, Response, SeedReport, SubmitOutcome};
use crate::store::{PollState, Snapshot};

/// Handling of responses whose text matches none of the poll's options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidResponsePolicy {
    /// Store the response (it is left out of the tally) and log a warning.
    #[default]
    Accept,
    /// Refuse the response with [`crate::error::PollError::InvalidOption`].
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServicePolicy {
    pub invalid_responses: InvalidResponsePolicy,
    /// Refuse responses to polls whose `active` flag is false.
    pub enforce_active: bool,
}

impl Default for ServicePolicy {
    fn default() -> Self {
        Self {
            invalid_responses: InvalidResponsePolicy::Accept,
            enforce_active: true,
        }
    }
}

pub struct PollService {
    state: RwLock<PollState>,
    store: Box<dyn SnapshotStore>,
    policy: ServicePolicy,
}

impl PollService {
    /// Load the stored snapshot (or start empty) and wrap it in a service.
    pub fn open(store: Box<dyn SnapshotStore>, policy: ServicePolicy) -> Result<Self> {
        let state = match store.load()? {
            Some(snapshot) => PollState::from_snapshot(snapshot),
            None => PollState::default(),
        };
        info!(
            polls = state.polls().len(),
            responses = state.responses().total(),
            "poll state loaded"
        );
        Ok(Self {
            state: RwLock::new(state),
            store,
            policy,
        })
    }

    /// Create a poll, replacing any poll with the same id.
    ///
    /// Replacing discards every response recorded for the old definition.
    pub fn create_poll(&self, draft: &PollDraft) -> Result<Poll> {
        let normalized = normalize_draft(draft)?;
        let poll = Poll {
            id: normalized.id,
            title: normalized.title,
            question: normalized.question,
            options: normalized.options,
            created: Utc::now(),
            active: true,
            course: None,
            week: None,
        };
        let replaced = self.mutate(|state| Ok(state.create_or_replace(poll.clone())))?;
        if replaced {
            warn!(poll_id = %poll.id, "poll replaced; previous responses discarded");
        } else {
            info!(poll_id = %poll.id, options = poll.options.len(), "poll created");
        }
        Ok(poll)
    }

    pub fn delete_poll(&self, id: &str) -> Result<()> {
        self.mutate(|state| {
            ensure!(state.delete(id), NotFoundSnafu { id });
            Ok(())
        })?;
        info!(poll_id = %id, "poll deleted");
        Ok(())
    }

    /// Empty a poll's responses, keeping the poll.
    pub fn clear_responses(&self, id: &str) -> Result<()> {
        self.mutate(|state| {
            ensure!(state.contains(id), NotFoundSnafu { id });
            state.responses_mut().clear(id)
        })?;
        info!(poll_id = %id, "responses cleared");
        Ok(())
    }

    /// Record one response.
    ///
    /// Text that matches no option is stored and reported as
    /// [`SubmitOutcome::Unmatched`] unless the policy rejects it.
    pub fn submit_response(&self, poll_id: &str, text: &str) -> Result<SubmitOutcome> {
        ensure!(
            !text.is_empty(),
            ValidationSnafu {
                reason: "response must be non-empty"
            }
        );
        let policy = self.policy;
        let outcome = self.mutate(|state| {
            let poll = state
                .polls()
                .get(poll_id)
                .ok_or_else(|| NotFoundSnafu { id: poll_id }.build())?;
            ensure!(
                poll.active || !policy.enforce_active,
                PollInactiveSnafu { id: poll_id }
            );
            let outcome = if matches_option(&poll.options, text) {
                SubmitOutcome::Matched
            } else {
                ensure!(
                    policy.invalid_responses == InvalidResponsePolicy::Accept,
                    InvalidOptionSnafu {
                        poll_id,
                        response: text,
                    }
                );
                SubmitOutcome::Unmatched
            };
            state.responses_mut().append(
                poll_id,
                Response {
                    response: text.to_string(),
                    timestamp: Utc::now(),
                },
            )?;
            Ok(outcome)
        })?;
        match outcome {
            SubmitOutcome::Matched => debug!(poll_id = %poll_id, "response recorded"),
            SubmitOutcome::Unmatched => warn!(
                poll_id = %poll_id,
                response = %text,
                "response matches no option; stored but excluded from tally"
            ),
        }
        Ok(outcome)
    }

    pub fn get_poll(&self, id: &str) -> Result<Poll> {
        let state = self.state.read();
        state
            .polls()
            .get(id)
            .cloned()
            .ok_or_else(|| NotFoundSnafu { id }.build())
    }

    /// Every poll in creation order with its response count.
    pub fn list_polls(&self) -> Vec<PollSummary> {
        let state = self.state.read();
        state
            .polls()
            .list()
            .into_iter()
            .map(|poll| PollSummary {
                poll: poll.clone(),
                responses: state.responses().count(&poll.id),
            })
            .collect()
    }

    pub fn get_results(&self, id: &str) -> Result<PollResults> {
        let state = self.state.read();
        let poll = state
            .polls()
            .get(id)
            .ok_or_else(|| NotFoundSnafu { id }.build())?;
        let tally = state.responses().tally(id, &poll.options);
        let matched = tally.iter().map(|entry| entry.count).sum();
        Ok(PollResults {
            poll: poll.clone(),
            tally,
            total: state.responses().count(id),
            matched,
        })
    }

    /// Raw responses for a poll, in submission order.
    pub fn responses(&self, id: &str) -> Result<Vec<Response>> {
        let state = self.state.read();
        ensure!(state.contains(id), NotFoundSnafu { id });
        Ok(state.responses().get(id).unwrap_or_default().to_vec())
    }

    /// Create polls from definitions, skipping ids that already exist.
    ///
    /// Unlike [`PollService::create_poll`] this never replaces a poll or
    /// touches its responses. Invalid definitions are reported and skipped;
    /// the rest of the batch is still applied in a single save.
    pub fn seed_from_config(&self, definitions: &[PollDefinition]) -> Result<SeedReport> {
        let mut guard = self.state.write();
        let mut next = guard.clone();
        let mut report = SeedReport::default();

        for definition in definitions {
            let draft = definition.to_draft();
            let normalized = match normalize_draft(&draft) {
                Ok(normalized) => normalized,
                Err(err) => {
                    warn!(poll_id = %draft.id, error = %err, "seed definition rejected");
                    report.rejected.push((draft.id, err.to_string()));
                    continue;
                }
            };
            if next.contains(&normalized.id) {
                debug!(poll_id = %normalized.id, "seed skipped; poll exists");
                report.skipped.push(normalized.id);
                continue;
            }
            next.create_or_replace(Poll {
                id: normalized.id.clone(),
                title: normalized.title,
                question: normalized.question,
                options: normalized.options,
                created: Utc::now(),
                active: definition.active.unwrap_or(true),
                course: definition.course.clone(),
                week: definition.week.clone(),
            });
            report.created.push(normalized.id);
        }

        if !report.created.is_empty() {
            self.store.save(&next.to_snapshot()).inspect_err(|err| {
                warn!(error = %err, "snapshot save failed; seed batch rolled back");
            })?;
            *guard = next;
        }
        info!(
            created = report.created.len(),
            skipped = report.skipped.len(),
            rejected = report.rejected.len(),
            "seed applied"
        );
        Ok(report)
    }

    /// Copy of the full state in its persisted form.
    pub fn snapshot(&self) -> Snapshot {
        self.state.read().to_snapshot()
    }

    fn mutate<T>(&self, apply: impl FnOnce(&mut PollState) -> Result<T>) -> Result<T> {
        let mut guard = self.state.write();
        let mut next = guard.clone();
        let value = apply(&mut next)?;
        self.store.save(&next.to_snapshot()).inspect_err(|err| {
            warn!(error = %err, "snapshot save failed; mutation rolled back");
        })?;
        *guard = next;
        Ok(value)
    }
}

impl std::fmt::Debug for PollService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollService")
            .field("polls", &self.state.read().polls().len())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::io::snapshot::MemoryStore;
    use crate::test_support::{FailingStore, draft};

    fn service() -> PollService {
        PollService::open(Box::new(MemoryStore::new()), ServicePolicy::default()).expect("open")
    }

    #[test]
    fn worked_example_tally_and_percentages() {
        let service = service();
        service
            .create_poll(&draft("anxiety", "How nervous?", &["A", "B", "C"]))
            .expect("create");
        for vote in ["A", "A", "B"] {
            service.submit_response("anxiety", vote).expect("vote");
        }

        let results = service.get_results("anxiety").expect("results");
        assert_eq!(results.count_for("A"), Some(2));
        assert_eq!(results.count_for("B"), Some(1));
        assert_eq!(results.count_for("C"), Some(0));
        assert_eq!(results.total, 3);
        assert_eq!(results.percentage_for("A"), Some(66.7));
        assert_eq!(results.percentage_for("B"), Some(33.3));
        assert_eq!(results.percentage_for("C"), Some(0.0));

        let outcome = service.submit_response("anxiety", "Z").expect("stored");
        assert_eq!(outcome, SubmitOutcome::Unmatched);
        let results = service.get_results("anxiety").expect("results");
        assert_eq!(results.total, 4);
        assert_eq!(results.matched, 3);
        assert_eq!(results.count_for("A"), Some(2));
    }

    #[test]
    fn reject_policy_refuses_unmatched_responses() {
        let service = PollService::open(
            Box::new(MemoryStore::new()),
            ServicePolicy {
                invalid_responses: InvalidResponsePolicy::Reject,
                enforce_active: true,
            },
        )
        .expect("open");
        service
            .create_poll(&draft("q", "Q?", &["Yes", "No"]))
            .expect("create");

        let err = service.submit_response("q", "yes").expect_err("rejected");
        assert_eq!(err.kind(), ErrorKind::InvalidOption);
        assert_eq!(service.get_results("q").expect("results").total, 0);
    }

    #[test]
    fn failed_save_leaves_state_unchanged() {
        let store = FailingStore::new();
        let failing = store.switch();
        let service =
            PollService::open(Box::new(store), ServicePolicy::default()).expect("open");
        service
            .create_poll(&draft("q", "Q?", &["A"]))
            .expect("create");

        failing.fail_saves(true);
        let err = service.submit_response("q", "A").expect_err("save fails");
        assert_eq!(err.kind(), ErrorKind::Persistence);
        assert_eq!(service.get_results("q").expect("results").total, 0);

        let err = service.delete_poll("q").expect_err("save fails");
        assert_eq!(err.kind(), ErrorKind::Persistence);
        assert!(service.get_poll("q").is_ok());
    }

    #[test]
    fn failed_seed_save_creates_nothing() {
        let store = FailingStore::new();
        let failing = store.switch();
        let service =
            PollService::open(Box::new(store), ServicePolicy::default()).expect("open");
        failing.fail_saves(true);

        let definition = PollDefinition {
            id: "warmup".to_string(),
            question: "Ready?".to_string(),
            options: vec!["Yes".to_string()],
            ..PollDefinition::default()
        };
        let err = service.seed_from_config(&[definition]).expect_err("save fails");
        assert_eq!(err.kind(), ErrorKind::Persistence);
        assert!(service.list_polls().is_empty());
    }

    #[test]
    fn empty_response_text_is_invalid() {
        let service = service();
        service.create_poll(&draft("q", "Q?", &["A"])).expect("create");
        let err = service.submit_response("q", "").expect_err("empty");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn inactive_polls_refuse_responses_when_enforced() {
        let service = service();
        let definition = PollDefinition {
            id: "closed".to_string(),
            question: "Q?".to_string(),
            options: vec!["A".to_string()],
            active: Some(false),
            ..PollDefinition::default()
        };
        service.seed_from_config(&[definition]).expect("seed");

        let err = service.submit_response("closed", "A").expect_err("inactive");
        assert_eq!(err.kind(), ErrorKind::Inactive);
    }

    #[test]
    fn inactive_flag_ignored_when_not_enforced() {
        let service = PollService::open(
            Box::new(MemoryStore::new()),
            ServicePolicy {
                invalid_responses: InvalidResponsePolicy::Accept,
                enforce_active: false,
            },
        )
        .expect("open");
        let definition = PollDefinition {
            id: "closed".to_string(),
            question: "Q?".to_string(),
            options: vec!["A".to_string()],
            active: Some(false),
            ..PollDefinition::default()
        };
        service.seed_from_config(&[definition]).expect("seed");
        assert_eq!(
            service.submit_response("closed", "A").expect("vote"),
            SubmitOutcome::Matched
        );
    }

    #[test]
    fn open_repairs_snapshot_collections() {
        let snapshot: Snapshot = serde_json::from_str(
            r#"{
                "polls": {"q": {"id": "q", "title": "q", "question": "Q?",
                                "options": ["A"], "created": "2024-01-01T00:00:00Z"}},
                "responses": {"gone": [{"response": "A", "timestamp": "2024-01-01T00:00:00Z"}]}
            }"#,
        )
        .expect("parse");
        let service = PollService::open(
            Box::new(MemoryStore::with_snapshot(snapshot)),
            ServicePolicy::default(),
        )
        .expect("open");

        assert_eq!(service.submit_response("q", "A").expect("vote"), SubmitOutcome::Matched);
        let repaired = service.snapshot();
        assert_eq!(repaired.responses.count("q"), 1);
        assert_eq!(repaired.responses.count("gone"), 0);
    }

    #[test]
    fn seed_reports_rejected_definitions_without_aborting() {
        let service = service();
        let good = PollDefinition {
            id: "good".to_string(),
            question: "Q?".to_string(),
            options: vec!["A".to_string()],
            ..PollDefinition::default()
        };
        let bad = PollDefinition {
            id: "bad".to_string(),
            question: String::new(),
            options: vec!["A".to_string()],
            ..PollDefinition::default()
        };
        let report = service.seed_from_config(&[bad, good]).expect("seed");
        assert_eq!(report.created, vec!["good"]);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].0, "bad");
    }
}
