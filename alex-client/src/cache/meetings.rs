//! Meeting list and detail queries
//!
//! List entries (`["meetings"]`, `["meetings", limit]`) use the configured
//! staleness window. Detail entries (`["meeting", id]`) are stale as soon as
//! they land, so every read revalidates in the background.

use super::keys::QueryKey;
use super::query_cache::{QueryCache, QueryError, QuerySnapshot};
use crate::services::MeetingsClient;
use alex_common::events::{AlexEvent, EventBus};
use alex_common::models::Meeting;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

/// Shared, cloneable meeting query layer
#[derive(Clone)]
pub struct MeetingQueries {
    api: MeetingsClient,
    lists: QueryCache<Option<u32>, Arc<Vec<Meeting>>>,
    details: QueryCache<i64, Arc<Meeting>>,
    event_bus: EventBus,
}

impl MeetingQueries {
    pub fn new(api: MeetingsClient, list_stale_time: Duration, event_bus: EventBus) -> Self {
        Self {
            api,
            lists: QueryCache::new(list_stale_time),
            details: QueryCache::new(Duration::ZERO),
            event_bus,
        }
    }

    pub fn api(&self) -> &MeetingsClient {
        &self.api
    }

    /// `["meetings"]`
    pub async fn meetings(&self) -> Result<Arc<Vec<Meeting>>, QueryError> {
        self.meetings_limited(None).await
    }

    /// `["meetings", limit]`, or `["meetings"]` when `limit` is `None`
    pub async fn meetings_limited(
        &self,
        limit: Option<u32>,
    ) -> Result<Arc<Vec<Meeting>>, QueryError> {
        let api = self.api.clone();
        self.lists
            .query(limit, move || async move {
                api.list_meetings(limit).await.map(Arc::new)
            })
            .await
    }

    /// `["meeting", id]`
    pub async fn meeting(&self, meeting_id: i64) -> Result<Arc<Meeting>, QueryError> {
        let api = self.api.clone();
        self.details
            .query(meeting_id, move || async move {
                api.get_meeting(meeting_id).await.map(Arc::new)
            })
            .await
    }

    /// Re-issue the list GET regardless of freshness
    pub async fn refetch_meetings(
        &self,
        limit: Option<u32>,
    ) -> Result<Arc<Vec<Meeting>>, QueryError> {
        let api = self.api.clone();
        self.lists
            .refetch(limit, move || async move {
                api.list_meetings(limit).await.map(Arc::new)
            })
            .await
    }

    /// Re-issue `GET /meetings/:id` (the retry affordance)
    pub async fn refetch_meeting(&self, meeting_id: i64) -> Result<Arc<Meeting>, QueryError> {
        let api = self.api.clone();
        self.details
            .refetch(meeting_id, move || async move {
                api.get_meeting(meeting_id).await.map(Arc::new)
            })
            .await
    }

    /// Invalidate every cached key starting with `prefix`
    ///
    /// Returns the number of entries marked. A [`AlexEvent::QueryInvalidated`]
    /// is emitted even when nothing was cached yet.
    pub async fn invalidate(&self, prefix: &QueryKey) -> usize {
        let count = match *prefix {
            QueryKey::Meetings { .. } => {
                self.lists
                    .invalidate_where(|limit| {
                        QueryKey::Meetings { limit: *limit }.starts_with(prefix)
                    })
                    .await
            }
            QueryKey::Meeting(meeting_id) => {
                usize::from(self.details.invalidate(&meeting_id).await)
            }
        };

        tracing::debug!(key = %prefix, count, "Invalidated queries");
        self.event_bus.emit_lossy(AlexEvent::QueryInvalidated {
            key: prefix.to_string(),
            timestamp: Utc::now(),
        });
        count
    }

    pub async fn meetings_snapshot(&self, limit: Option<u32>) -> QuerySnapshot<Arc<Vec<Meeting>>> {
        self.lists.snapshot(&limit).await
    }

    pub async fn meeting_snapshot(&self, meeting_id: i64) -> QuerySnapshot<Arc<Meeting>> {
        self.details.snapshot(&meeting_id).await
    }
}
