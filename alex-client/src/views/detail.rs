//! Meeting detail view
//!
//! Loads `["meeting", id]` and keeps a local copy for action-item toggles
//! and the summary draft. Nothing edited here is sent to the backend.

use super::action_items::{mark_all_completed, toggle_item};
use crate::cache::{MeetingQueries, QueryError};
use crate::error::{ClientError, ClientResult};
use alex_common::models::Meeting;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const SUMMARY_NOT_READY_MESSAGE: &str = "Summary is not ready yet";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailState {
    Loading,
    /// Literal server message; [`MeetingDetailView::retry`] re-issues the GET
    Error(String),
    Ready,
}

/// Plain-text summary export
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryExport {
    pub file_name: String,
    pub content: String,
}

/// Build the export for a meeting, preferring a non-blank draft
pub fn summary_export(meeting: &Meeting, draft: Option<&str>) -> ClientResult<SummaryExport> {
    let summary = draft
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .or_else(|| {
            meeting
                .summary
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
        })
        .ok_or_else(|| ClientError::Validation(SUMMARY_NOT_READY_MESSAGE.to_string()))?;

    Ok(SummaryExport {
        file_name: format!("meeting-{}-summary.txt", meeting.id),
        content: format!("Meeting: {} (ID {})\n\n{}", meeting.title, meeting.id, summary),
    })
}

pub struct MeetingDetailView {
    meeting_id: i64,
    queries: MeetingQueries,
    state: DetailState,
    meeting: Option<Meeting>,
    summary_draft: String,
}

impl MeetingDetailView {
    pub fn new(queries: MeetingQueries, meeting_id: i64) -> Self {
        Self {
            meeting_id,
            queries,
            state: DetailState::Loading,
            meeting: None,
            summary_draft: String::new(),
        }
    }

    pub fn meeting_id(&self) -> i64 {
        self.meeting_id
    }

    pub fn state(&self) -> &DetailState {
        &self.state
    }

    /// Local copy including any overlay edits
    pub fn meeting(&self) -> Option<&Meeting> {
        self.meeting.as_ref()
    }

    pub async fn load(&mut self) -> &DetailState {
        self.state = DetailState::Loading;
        let result = self.queries.meeting(self.meeting_id).await;
        self.apply(result)
    }

    pub async fn retry(&mut self) -> &DetailState {
        self.state = DetailState::Loading;
        let result = self.queries.refetch_meeting(self.meeting_id).await;
        self.apply(result)
    }

    fn apply(&mut self, result: Result<Arc<Meeting>, QueryError>) -> &DetailState {
        match result {
            Ok(meeting) => {
                self.summary_draft = meeting.summary.clone().unwrap_or_default();
                self.meeting = Some(meeting.as_ref().clone());
                self.state = DetailState::Ready;
            }
            Err(e) => {
                tracing::debug!(
                    meeting_id = self.meeting_id,
                    error = %e,
                    "Meeting detail failed to load"
                );
                self.state = DetailState::Error(e.message);
            }
        }
        &self.state
    }

    pub fn toggle_item(&mut self, item_id: i64) -> Option<String> {
        let meeting = self.meeting.as_mut()?;
        toggle_item(&mut meeting.action_items, item_id)
    }

    pub fn mark_all_completed(&mut self) -> usize {
        self.meeting
            .as_mut()
            .map_or(0, |m| mark_all_completed(&mut m.action_items))
    }

    pub fn summary_draft(&self) -> &str {
        &self.summary_draft
    }

    pub fn set_summary_draft(&mut self, draft: &str) {
        self.summary_draft = draft.to_string();
    }

    pub fn export_summary(&self) -> ClientResult<SummaryExport> {
        let meeting = self
            .meeting
            .as_ref()
            .ok_or_else(|| ClientError::Validation(SUMMARY_NOT_READY_MESSAGE.to_string()))?;
        summary_export(meeting, Some(&self.summary_draft))
    }

    /// Write the export into `dir`; returns the file path
    pub async fn write_summary(&self, dir: &Path) -> ClientResult<PathBuf> {
        let export = self.export_summary()?;
        let path = dir.join(&export.file_name);
        tokio::fs::write(&path, export.content)
            .await
            .map_err(|e| ClientError::Common(e.into()))?;

        tracing::info!(meeting_id = self.meeting_id, path = %path.display(), "Summary exported");
        Ok(path)
    }
}
