//! Job status poller
//!
//! Tracks one meeting job from its initial status to `done` or `failed`.
//! Status requests are strictly sequential: the next one is scheduled only
//! after the previous one resolved, and at most one tracking loop runs per
//! meeting id.

use super::progress::ProcessingIndicator;
use crate::cache::{MeetingQueries, QueryKey};
use crate::error::{ClientError, ClientResult};
use alex_common::events::{AlexEvent, EventBus};
use alex_common::models::{Meeting, MeetingStatus};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

pub const PROCESSING_FAILED_MESSAGE: &str = "Processing failed. Please try again.";

/// How a tracking loop ended
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Job reached `done`; navigation to `path` was requested
    Completed { meeting: Box<Meeting>, path: String },
    /// Job reached `failed`, or a status request failed
    Failed { meeting_id: i64, message: String },
    /// Cancelled by the owner; nothing further was emitted
    Cancelled,
}

/// Detail view path for a meeting
pub fn meeting_path(meeting_id: i64) -> String {
    format!("/meeting/{}", meeting_id)
}

/// Sequential, cancellable status poller
#[derive(Clone)]
pub struct JobPoller {
    queries: MeetingQueries,
    event_bus: EventBus,
    poll_interval: Duration,
    navigation_delay: Duration,
    active: Arc<Mutex<HashSet<i64>>>,
}

/// Releases a meeting id from the active set on drop
struct ActiveJob {
    active: Arc<Mutex<HashSet<i64>>>,
    meeting_id: i64,
}

impl Drop for ActiveJob {
    fn drop(&mut self) {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        active.remove(&self.meeting_id);
    }
}

impl JobPoller {
    pub fn new(
        queries: MeetingQueries,
        event_bus: EventBus,
        poll_interval: Duration,
        navigation_delay: Duration,
    ) -> Self {
        Self {
            queries,
            event_bus,
            poll_interval,
            navigation_delay,
            active: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Whether a tracking loop is running for `meeting_id`
    pub fn is_polling(&self, meeting_id: i64) -> bool {
        let active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        active.contains(&meeting_id)
    }

    fn claim(&self, meeting_id: i64) -> ClientResult<ActiveJob> {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if !active.insert(meeting_id) {
            return Err(ClientError::AlreadyPolling(meeting_id));
        }
        Ok(ActiveJob {
            active: Arc::clone(&self.active),
            meeting_id,
        })
    }

    /// Track a job until it is terminal or `cancel_token` fires
    ///
    /// The first status request is issued immediately. Returns
    /// [`ClientError::AlreadyPolling`] when the id is already tracked.
    pub async fn track(
        &self,
        meeting_id: i64,
        initial_status: MeetingStatus,
        indicator: &watch::Sender<ProcessingIndicator>,
        cancel_token: &CancellationToken,
    ) -> ClientResult<PollOutcome> {
        let _active = self.claim(meeting_id)?;
        if cancel_token.is_cancelled() {
            return Ok(self.cancelled(meeting_id));
        }

        tracing::info!(meeting_id, status = %initial_status, "Tracking meeting job");
        self.observe(meeting_id, initial_status, indicator);

        let mut polls: u32 = 0;
        loop {
            polls += 1;
            let result = tokio::select! {
                biased;
                _ = cancel_token.cancelled() => return Ok(self.cancelled(meeting_id)),
                result = self.queries.api().get_meeting(meeting_id) => result,
            };

            let meeting = match result {
                Ok(meeting) => meeting,
                Err(e) => {
                    let message = format!("Unable to fetch meeting status: {}", e);
                    tracing::warn!(meeting_id, polls, error = %e, "Status request failed");
                    self.observe(meeting_id, MeetingStatus::Failed, indicator);
                    return Ok(self.failed(meeting_id, message));
                }
            };

            tracing::debug!(meeting_id, polls, status = %meeting.status, "Polled meeting status");
            self.observe(meeting_id, meeting.status.clone(), indicator);

            match meeting.status {
                MeetingStatus::Done => return Ok(self.complete(meeting, cancel_token).await),
                MeetingStatus::Failed => {
                    let message = meeting
                        .error_message
                        .as_deref()
                        .map(str::trim)
                        .filter(|m| !m.is_empty())
                        .unwrap_or(PROCESSING_FAILED_MESSAGE)
                        .to_string();
                    return Ok(self.failed(meeting_id, message));
                }
                _ => {}
            }

            tokio::select! {
                biased;
                _ = cancel_token.cancelled() => return Ok(self.cancelled(meeting_id)),
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }

    fn observe(
        &self,
        meeting_id: i64,
        status: MeetingStatus,
        indicator: &watch::Sender<ProcessingIndicator>,
    ) {
        indicator.send_modify(|state| state.update(status.clone()));
        let state = indicator.borrow().clone();

        self.event_bus.emit_lossy(AlexEvent::JobStatusChanged {
            meeting_id,
            status,
            progress: state.progress,
            step_index: state.step_index,
            timestamp: Utc::now(),
        });
    }

    async fn complete(&self, meeting: Meeting, cancel_token: &CancellationToken) -> PollOutcome {
        let meeting_id = meeting.id;
        tracing::info!(meeting_id, "Meeting processing completed");

        self.event_bus.emit_lossy(AlexEvent::JobCompleted {
            meeting_id,
            timestamp: Utc::now(),
        });
        self.queries.invalidate(&QueryKey::MEETINGS).await;

        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => return self.cancelled(meeting_id),
            _ = tokio::time::sleep(self.navigation_delay) => {}
        }

        let path = meeting_path(meeting_id);
        self.event_bus.emit_lossy(AlexEvent::NavigationRequested {
            path: path.clone(),
            timestamp: Utc::now(),
        });

        PollOutcome::Completed {
            meeting: Box::new(meeting),
            path,
        }
    }

    fn failed(&self, meeting_id: i64, message: String) -> PollOutcome {
        tracing::warn!(meeting_id, message = %message, "Meeting processing failed");
        self.event_bus.emit_lossy(AlexEvent::JobFailed {
            meeting_id,
            message: message.clone(),
            timestamp: Utc::now(),
        });
        PollOutcome::Failed {
            meeting_id,
            message,
        }
    }

    fn cancelled(&self, meeting_id: i64) -> PollOutcome {
        tracing::debug!(meeting_id, "Status polling cancelled");
        PollOutcome::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MeetingsClient;

    fn poller() -> JobPoller {
        let api =
            MeetingsClient::with_base_url("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let event_bus = EventBus::new(16);
        let queries = MeetingQueries::new(api, Duration::from_secs(30), event_bus.clone());
        JobPoller::new(
            queries,
            event_bus,
            Duration::from_millis(2500),
            Duration::from_millis(500),
        )
    }

    #[test]
    fn test_meeting_path() {
        assert_eq!(meeting_path(9), "/meeting/9");
    }

    #[test]
    fn test_second_claim_is_refused_until_released() {
        let poller = poller();
        let first = poller.claim(9).unwrap();
        assert!(poller.is_polling(9));
        assert!(matches!(poller.claim(9), Err(ClientError::AlreadyPolling(9))));
        assert!(poller.claim(10).is_ok());

        drop(first);
        assert!(!poller.is_polling(9));
        assert!(poller.claim(9).is_ok());
    }

    #[tokio::test]
    async fn test_cancelled_before_tracking_leaves_indicator_idle() {
        let poller = poller();
        let mut rx = poller.event_bus.subscribe();
        let (indicator, _) = watch::channel(ProcessingIndicator::default());
        let token = CancellationToken::new();
        token.cancel();

        let outcome = poller
            .track(3, MeetingStatus::Pending, &indicator, &token)
            .await
            .unwrap();

        assert_eq!(outcome, PollOutcome::Cancelled);
        assert!(rx.try_recv().is_err());
        assert!(indicator.borrow().is_idle());
        assert!(!poller.is_polling(3));
    }

    #[tokio::test]
    async fn test_transport_error_is_terminal() {
        let poller = poller();
        let (indicator, _) = watch::channel(ProcessingIndicator::default());

        let outcome = poller
            .track(4, MeetingStatus::Pending, &indicator, &CancellationToken::new())
            .await
            .unwrap();

        match outcome {
            PollOutcome::Failed { meeting_id, message } => {
                assert_eq!(meeting_id, 4);
                assert!(message.starts_with("Unable to fetch meeting status: Network error"));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(indicator.borrow().status, Some(MeetingStatus::Failed));
    }
}
