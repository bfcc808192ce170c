//! Event types for the Alex meeting workflow
//!
//! Provides the shared event definitions and the EventBus used to report
//! submission progress, job status changes, cache invalidation and
//! navigation requests to whichever front end is attached.

use crate::models::MeetingStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Alex workflow events
///
/// Events are broadcast via [`EventBus`] and can be serialized for display
/// or forwarding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AlexEvent {
    /// Multipart upload of a new meeting started
    SubmissionStarted {
        title: String,
        timestamp: DateTime<Utc>,
    },

    /// Meeting creation request failed; the processing indicator is idle again
    SubmissionFailed {
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Job status observed (on creation or by a poll)
    JobStatusChanged {
        meeting_id: i64,
        status: MeetingStatus,
        /// Progress percentage 0-100
        progress: u8,
        /// Index into the four processing steps
        step_index: usize,
        timestamp: DateTime<Utc>,
    },

    /// Job reached `done`
    JobCompleted {
        meeting_id: i64,
        timestamp: DateTime<Utc>,
    },

    /// Job reached `failed`, or polling hit a transport error
    JobFailed {
        meeting_id: i64,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// A cached query was invalidated
    QueryInvalidated {
        /// Display form of the query key, e.g. `["meetings"]`
        key: String,
        timestamp: DateTime<Utc>,
    },

    /// The workflow asks the front end to show another view
    NavigationRequested {
        path: String,
        timestamp: DateTime<Utc>,
    },
}

/// Broadcast bus for [`AlexEvent`]s
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AlexEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Examples
    ///
    /// ```
    /// use alex_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// assert_eq!(event_bus.capacity(), 100);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<AlexEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: AlexEvent,
    ) -> Result<usize, broadcast::error::SendError<AlexEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: AlexEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}
