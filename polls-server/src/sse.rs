//! Server-Sent Events streams of poll changes.

use std::convert::Infallible;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use polls::error::ErrorKind;
use polls::model::PollResults;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::state::{AppState, ChangeEvent};

#[derive(Debug, Serialize)]
struct SsePayload {
    #[serde(rename = "type")]
    event_type: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    poll_ids: Vec<String>,
}

impl From<&ChangeEvent> for SsePayload {
    fn from(event: &ChangeEvent) -> Self {
        let (event_type, poll_ids) = match event {
            ChangeEvent::PollCreated { poll_id } => ("poll_created", vec![poll_id.clone()]),
            ChangeEvent::PollDeleted { poll_id } => ("poll_deleted", vec![poll_id.clone()]),
            ChangeEvent::ResponsesCleared { poll_id } => {
                ("responses_cleared", vec![poll_id.clone()])
            }
            ChangeEvent::ResponseSubmitted { poll_id } => {
                ("response_submitted", vec![poll_id.clone()])
            }
            ChangeEvent::PollsSeeded { poll_ids } => ("polls_seeded", poll_ids.clone()),
        };
        SsePayload {
            event_type,
            poll_ids,
        }
    }
}

fn keep_alive(state: &AppState) -> KeepAlive {
    KeepAlive::new().interval(state.keep_alive).text("ping")
}

fn results_event(results: &PollResults) -> Option<Event> {
    match serde_json::to_string(results) {
        Ok(json) => Some(Event::default().event("results").data(json)),
        Err(err) => {
            warn!(error = %err, "failed to encode results");
            None
        }
    }
}

/// GET /events - every change, as a type tag plus the poll ids involved.
pub async fn events_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.event_tx.subscribe();

    let stream = async_stream::stream! {
        yield Ok(Event::default().event("connected").data("{}"));

        loop {
            match rx.recv().await {
                Ok(change_event) => {
                    let payload = SsePayload::from(&change_event);
                    if let Ok(json) = serde_json::to_string(&payload) {
                        yield Ok(Event::default().event("change").data(json));
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "SSE client lagged, some events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(keep_alive(&state))
}

/// GET /api/polls/{id}/stream - current results, then fresh results after
/// every change to the poll. Ends with a `deleted` event if the poll goes
/// away.
pub async fn results_stream(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    // Subscribe before the first read so no change can slip in between.
    let mut rx = state.event_tx.subscribe();
    let poll_id = id.clone();
    let initial = state.run(move |service| service.get_results(&id)).await?;

    let service_state = state.clone();
    let stream = async_stream::stream! {
        if let Some(event) = results_event(&initial) {
            yield Ok(event);
        }

        loop {
            match rx.recv().await {
                Ok(change_event) if change_event.affects(&poll_id) => {}
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    debug!(poll_id = %poll_id, skipped = n, "results stream lagged, resyncing");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }

            let lookup = poll_id.clone();
            match service_state.run(move |service| service.get_results(&lookup)).await {
                Ok(results) => {
                    if let Some(event) = results_event(&results) {
                        yield Ok(event);
                    }
                }
                Err(ApiError::Poll(err)) if err.kind() == ErrorKind::NotFound => {
                    yield Ok(Event::default().event("deleted").data(poll_id.clone()));
                    break;
                }
                Err(err) => {
                    warn!(poll_id = %poll_id, error = ?err, "results stream read failed");
                }
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(keep_alive(&state)))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::BodyDataStream;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use futures::StreamExt;
    use polls::io::snapshot::MemoryStore;
    use polls::service::{PollService, ServicePolicy};
    use polls::test_support::draft;

    use super::*;

    fn app_state() -> AppState {
        let service = PollService::open(Box::new(MemoryStore::new()), ServicePolicy::default())
            .expect("open");
        AppState::new(
            service,
            "http://localhost:3000".to_string(),
            Duration::from_secs(15),
        )
    }

    #[test]
    fn seeded_payload_lists_every_poll() {
        let payload = SsePayload::from(&ChangeEvent::PollsSeeded {
            poll_ids: vec!["a".to_string(), "b".to_string()],
        });
        let json = serde_json::to_value(&payload).expect("serialize");
        assert_eq!(json["type"], "polls_seeded");
        assert_eq!(json["poll_ids"], serde_json::json!(["a", "b"]));
    }

    #[test]
    fn affects_matches_only_the_named_poll() {
        let event = ChangeEvent::ResponseSubmitted {
            poll_id: "q1".to_string(),
        };
        assert!(event.affects("q1"));
        assert!(!event.affects("q2"));
    }

    #[tokio::test]
    async fn stream_for_missing_poll_is_not_found() {
        let state = app_state();
        let err = results_stream(State(state), Path("nope".to_string()))
            .await
            .err()
            .expect("missing poll");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    fn body_of<S>(sse: Sse<S>) -> BodyDataStream
    where
        S: Stream<Item = Result<Event, Infallible>> + Send + 'static,
    {
        sse.into_response().into_body().into_data_stream()
    }

    /// Next SSE frame as text, or `None` once the stream has ended.
    async fn next_frame(body: &mut BodyDataStream) -> Option<String> {
        let chunk = tokio::time::timeout(Duration::from_secs(5), body.next())
            .await
            .expect("frame in time")?;
        let bytes = chunk.expect("body ok");
        Some(String::from_utf8(bytes.to_vec()).expect("utf8"))
    }

    #[tokio::test]
    async fn stream_body_starts_with_results() {
        let state = app_state();
        state
            .service
            .create_poll(&draft("q", "Q?", &["A", "B"]))
            .expect("create");
        state.service.submit_response("q", "A").expect("vote");

        let sse = results_stream(State(state), Path("q".to_string()))
            .await
            .expect("stream");
        let mut body = body_of(sse);
        let text = next_frame(&mut body).await.expect("first frame");
        assert!(text.starts_with("event: results"));
        assert!(text.contains("\"total\":1"));
    }

    #[tokio::test]
    async fn stream_pushes_fresh_results_after_a_vote() {
        let state = app_state();
        for id in ["q", "other"] {
            state
                .service
                .create_poll(&draft(id, "Q?", &["A", "B"]))
                .expect("create");
        }
        state.service.submit_response("q", "A").expect("vote");

        let sse = results_stream(State(state.clone()), Path("q".to_string()))
            .await
            .expect("stream");
        let mut body = body_of(sse);
        let first = next_frame(&mut body).await.expect("initial results");
        assert!(first.contains("\"total\":1"));

        state.service.submit_response("other", "B").expect("vote");
        state.notify(ChangeEvent::ResponseSubmitted {
            poll_id: "other".to_string(),
        });
        state.service.submit_response("q", "B").expect("vote");
        state.notify(ChangeEvent::ResponseSubmitted {
            poll_id: "q".to_string(),
        });

        let next = next_frame(&mut body).await.expect("pushed results");
        assert!(next.starts_with("event: results"));
        assert!(next.contains("\"id\":\"q\""));
        assert!(next.contains("\"total\":2"));
    }

    #[tokio::test]
    async fn deleting_the_poll_ends_its_stream() {
        let state = app_state();
        state
            .service
            .create_poll(&draft("q", "Q?", &["A"]))
            .expect("create");

        let sse = results_stream(State(state.clone()), Path("q".to_string()))
            .await
            .expect("stream");
        let mut body = body_of(sse);
        next_frame(&mut body).await.expect("initial results");

        state.service.delete_poll("q").expect("delete");
        state.notify(ChangeEvent::PollDeleted {
            poll_id: "q".to_string(),
        });

        let last = next_frame(&mut body).await.expect("deleted frame");
        assert!(last.starts_with("event: deleted"));
        assert!(next_frame(&mut body).await.is_none());
    }

    #[tokio::test]
    async fn events_feed_announces_connection_then_changes() {
        let state = app_state();
        let sse = events_handler(State(state.clone())).await;
        let mut body = body_of(sse);

        let hello = next_frame(&mut body).await.expect("connected frame");
        assert!(hello.starts_with("event: connected"));

        state.notify(ChangeEvent::PollCreated {
            poll_id: "q".to_string(),
        });
        let change = next_frame(&mut body).await.expect("change frame");
        assert!(change.starts_with("event: change"));
        assert!(change.contains("\"type\":\"poll_created\""));
        assert!(change.contains("\"poll_ids\":[\"q\"]"));
    }
}
