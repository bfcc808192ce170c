//! Meeting processing workflow
//!
//! Submission → job creation → status polling → navigation to the detail
//! view. [`MeetingProcessor`] owns the processing indicator and the
//! cancellation token of the current job.

pub mod poller;
pub mod progress;
pub mod submission;

pub use poller::{JobPoller, PollOutcome};
pub use progress::{ProcessingIndicator, PROCESSING_STEPS};
pub use submission::{AudioFile, AudioSource, MeetingForm, Participant, ParticipantField, Recording};

use crate::cache::MeetingQueries;
use crate::error::ClientResult;
use alex_common::events::{AlexEvent, EventBus};
use alex_common::models::{CreateMeetingResponse, MeetingStatus};
use chrono::Utc;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Drives one meeting job at a time from submission to a terminal state
pub struct MeetingProcessor {
    queries: MeetingQueries,
    poller: JobPoller,
    event_bus: EventBus,
    indicator: watch::Sender<ProcessingIndicator>,
    cancel_token: Mutex<CancellationToken>,
}

impl MeetingProcessor {
    pub fn new(
        queries: MeetingQueries,
        event_bus: EventBus,
        poll_interval: Duration,
        navigation_delay: Duration,
    ) -> Self {
        let poller = JobPoller::new(
            queries.clone(),
            event_bus.clone(),
            poll_interval,
            navigation_delay,
        );
        let (indicator, _) = watch::channel(ProcessingIndicator::default());

        Self {
            queries,
            poller,
            event_bus,
            indicator,
            cancel_token: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn indicator(&self) -> ProcessingIndicator {
        self.indicator.borrow().clone()
    }

    /// Receiver that observes every indicator change
    pub fn watch_indicator(&self) -> watch::Receiver<ProcessingIndicator> {
        self.indicator.subscribe()
    }

    pub fn poller(&self) -> &JobPoller {
        &self.poller
    }

    fn current_token(&self) -> CancellationToken {
        self.cancel_token
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Validate the form and create the meeting job
    ///
    /// An invalid form fails without a request. A failed request resets the
    /// indicator to idle.
    pub async fn submit(&self, form: &MeetingForm) -> ClientResult<CreateMeetingResponse> {
        let body = match form.to_multipart() {
            Ok(body) => body,
            Err(e) => {
                self.emit_submission_failed(&e.to_string());
                return Err(e);
            }
        };

        self.indicator
            .send_modify(|state| state.update(MeetingStatus::Uploading));
        self.event_bus.emit_lossy(AlexEvent::SubmissionStarted {
            title: form.title.trim().to_string(),
            timestamp: Utc::now(),
        });
        tracing::info!(title = %form.title.trim(), "Submitting meeting");

        match self.queries.api().create_meeting(body).await {
            Ok(ack) => Ok(ack),
            Err(e) => {
                tracing::error!(error = %e, "Meeting submission failed");
                self.indicator.send_modify(ProcessingIndicator::reset);
                self.emit_submission_failed(&e.to_string());
                Err(e)
            }
        }
    }

    /// Submit, then track the job until it is terminal or reset
    pub async fn process(&self, form: &MeetingForm) -> ClientResult<PollOutcome> {
        let token = self.current_token();
        let ack = self.submit(form).await?;
        self.poller
            .track(ack.meeting_id, ack.status, &self.indicator, &token)
            .await
    }

    /// Track an already-created job
    pub async fn track(&self, meeting_id: i64, status: MeetingStatus) -> ClientResult<PollOutcome> {
        let token = self.current_token();
        self.poller
            .track(meeting_id, status, &self.indicator, &token)
            .await
    }

    /// Cancel any pending poll and return the indicator to idle
    pub fn reset(&self) {
        let mut token = self.cancel_token.lock().unwrap_or_else(|e| e.into_inner());
        token.cancel();
        *token = CancellationToken::new();
        drop(token);

        self.indicator.send_modify(ProcessingIndicator::reset);
        tracing::debug!("Meeting processor reset");
    }

    fn emit_submission_failed(&self, message: &str) {
        self.event_bus.emit_lossy(AlexEvent::SubmissionFailed {
            message: message.to_string(),
            timestamp: Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::services::MeetingsClient;

    fn processor(event_bus: EventBus) -> MeetingProcessor {
        let api =
            MeetingsClient::with_base_url("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let queries = MeetingQueries::new(api, Duration::from_secs(30), event_bus.clone());
        MeetingProcessor::new(
            queries,
            event_bus,
            Duration::from_millis(2500),
            Duration::from_millis(500),
        )
    }

    #[tokio::test]
    async fn test_invalid_form_makes_no_request() {
        let event_bus = EventBus::new(8);
        let mut rx = event_bus.subscribe();
        let processor = processor(event_bus);

        let err = processor.process(&MeetingForm::new()).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert_eq!(err.to_string(), "Please fill in all required fields");
        assert!(processor.indicator().is_idle());
        assert!(matches!(
            rx.try_recv().unwrap(),
            AlexEvent::SubmissionFailed { .. }
        ));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_reset_returns_indicator_to_idle() {
        let processor = processor(EventBus::default());
        processor
            .indicator
            .send_modify(|state| state.update(MeetingStatus::Processing));
        let before = processor.current_token();

        processor.reset();
        assert!(processor.indicator().is_idle());
        assert!(before.is_cancelled());
        assert!(!processor.current_token().is_cancelled());
    }
}
