//! Dashboard summary and instant follow-up

use crate::error::{ClientError, ClientResult};
use crate::services::MeetingsClient;
use crate::workflow::submission::SOURCE_AGENT;
use alex_common::models::{FollowupRequest, FollowupResponse, Meeting};
use serde::Serialize;
use serde_json::{Map, Value};

/// Number of meetings shown as "recent"
pub const RECENT_MEETINGS: usize = 3;

pub const EMPTY_TRANSCRIPT_MESSAGE: &str = "Please provide a transcript for Alex to analyze";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_meetings: usize,
    pub total_action_items: usize,
    pub pending_action_items: usize,
}

pub fn dashboard_stats(meetings: &[Meeting]) -> DashboardStats {
    let items = meetings.iter().flat_map(|m| m.action_items.iter());
    let (total, pending) = items.fold((0, 0), |(total, pending), item| {
        (total + 1, pending + usize::from(!item.is_done()))
    });

    DashboardStats {
        total_meetings: meetings.len(),
        total_action_items: total,
        pending_action_items: pending,
    }
}

/// First [`RECENT_MEETINGS`] meetings of a newest-first list
pub fn recent_meetings(meetings: &[Meeting]) -> &[Meeting] {
    &meetings[..meetings.len().min(RECENT_MEETINGS)]
}

/// Trimmed transcript wrapped in a follow-up request
pub fn followup_request(transcript: &str) -> ClientResult<FollowupRequest> {
    let transcript = transcript.trim();
    if transcript.is_empty() {
        return Err(ClientError::Validation(EMPTY_TRANSCRIPT_MESSAGE.to_string()));
    }

    let mut metadata = Map::new();
    metadata.insert("source".to_string(), Value::String(SOURCE_AGENT.to_string()));

    Ok(FollowupRequest {
        transcript: transcript.to_string(),
        metadata: Some(metadata),
    })
}

/// Run the stateless follow-up agent; the result is never cached
pub async fn run_followup(
    api: &MeetingsClient,
    transcript: &str,
) -> ClientResult<FollowupResponse> {
    let request = followup_request(transcript)?;
    api.run_followup(&request).await
}
