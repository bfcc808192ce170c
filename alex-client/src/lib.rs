//! alex-client library interface
//!
//! Client side of the Alex meeting workflow: backend REST client, query
//! cache, submission and status polling, and the read models consumed by
//! the `alex` CLI. Exposed as a library for integration testing.

pub mod cache;
pub mod error;
pub mod services;
pub mod views;
pub mod workflow;

pub use crate::error::{ClientError, ClientResult};

use alex_common::config::ClientSettings;
use alex_common::events::EventBus;
use cache::MeetingQueries;
use chrono::{DateTime, Utc};
use services::MeetingsClient;
use std::sync::Arc;
use workflow::MeetingProcessor;

/// Application state shared by every front-end command
#[derive(Clone)]
pub struct AppState {
    pub settings: ClientSettings,
    /// Workflow events (status changes, invalidation, navigation)
    pub event_bus: EventBus,
    pub queries: MeetingQueries,
    pub processor: Arc<MeetingProcessor>,
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(settings: ClientSettings, event_bus: EventBus) -> ClientResult<Self> {
        let api = MeetingsClient::new(&settings)?;
        let queries = MeetingQueries::new(api, settings.list_stale_time, event_bus.clone());
        let processor = MeetingProcessor::new(
            queries.clone(),
            event_bus.clone(),
            settings.poll_interval,
            settings.navigation_delay,
        );

        Ok(Self {
            settings,
            event_bus,
            queries,
            processor: Arc::new(processor),
            startup_time: Utc::now(),
        })
    }

    pub fn api(&self) -> &MeetingsClient {
        self.queries.api()
    }
}
