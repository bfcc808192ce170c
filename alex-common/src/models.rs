//! Meeting data model
//!
//! Wire types exchanged with the meeting-processing backend. A [`Meeting`]
//! exclusively owns its [`ActionItem`]s; action items are only ever created
//! by backend processing and never exist on their own.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Processing status of a meeting job
///
/// Transitions are driven by the backend; the client only observes them.
/// Strings outside the known set are preserved in [`MeetingStatus::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MeetingStatus {
    /// Audio is being transferred to the backend
    Uploading,
    /// Queued for processing
    Pending,
    /// Transcription / summarization running
    Processing,
    /// Summary and action items are ready
    Done,
    /// Processing failed
    Failed,
    /// Any backend status this client does not know about
    Unknown(String),
}

impl MeetingStatus {
    pub fn as_str(&self) -> &str {
        match self {
            MeetingStatus::Uploading => "uploading",
            MeetingStatus::Pending => "pending",
            MeetingStatus::Processing => "processing",
            MeetingStatus::Done => "done",
            MeetingStatus::Failed => "failed",
            MeetingStatus::Unknown(raw) => raw,
        }
    }

    /// `done` and `failed` end a processing job
    pub fn is_terminal(&self) -> bool {
        matches!(self, MeetingStatus::Done | MeetingStatus::Failed)
    }
}

impl From<String> for MeetingStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "uploading" => MeetingStatus::Uploading,
            "pending" => MeetingStatus::Pending,
            "processing" => MeetingStatus::Processing,
            "done" => MeetingStatus::Done,
            "failed" => MeetingStatus::Failed,
            _ => MeetingStatus::Unknown(raw),
        }
    }
}

impl From<&str> for MeetingStatus {
    fn from(raw: &str) -> Self {
        MeetingStatus::from(raw.to_string())
    }
}

impl From<MeetingStatus> for String {
    fn from(status: MeetingStatus) -> Self {
        match status {
            MeetingStatus::Unknown(raw) => raw,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for MeetingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns true when an action item status counts as completed
///
/// Case-insensitive: exactly `"done"` or `"completed"`. Every other string,
/// including the empty string, is pending.
pub fn is_action_item_done(status: &str) -> bool {
    matches!(status.to_lowercase().as_str(), "done" | "completed")
}

/// Task extracted from a meeting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItem {
    pub id: i64,
    pub description: String,
    pub owner: Option<String>,
    /// ISO date or date-time; `None` means no due date
    pub due_date: Option<String>,
    #[serde(default)]
    pub status: String,
}

impl ActionItem {
    pub fn is_done(&self) -> bool {
        is_action_item_done(&self.status)
    }
}

/// One processed or in-progress meeting job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    /// Backend-assigned identifier
    pub id: i64,
    pub title: String,
    pub status: MeetingStatus,
    /// Creation timestamp (ISO 8601), immutable
    pub created_at: String,
    pub audio_url: Option<String>,
    pub transcript: Option<String>,
    pub summary: Option<String>,
    /// UI surface that created the meeting
    pub source_agent: Option<String>,
    /// Failure detail reported by the backend
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub action_items: Vec<ActionItem>,
}

/// Acknowledgement returned when a meeting job is created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateMeetingResponse {
    /// Key for subsequent status polling (the backend may send it as `id`)
    #[serde(alias = "id")]
    pub meeting_id: i64,
    #[serde(default = "pending_status", deserialize_with = "status_or_pending")]
    pub status: MeetingStatus,
}

fn pending_status() -> MeetingStatus {
    MeetingStatus::Pending
}

/// Missing, null or empty status reads as `pending`
fn status_or_pending<'de, D>(deserializer: D) -> Result<MeetingStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(s) if !s.is_empty() => MeetingStatus::from(s),
        _ => MeetingStatus::Pending,
    })
}

/// Request body for the stateless instant follow-up agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowupRequest {
    pub transcript: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

/// Action item produced by the follow-up agent (not persisted, no id)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowupActionItem {
    #[serde(default)]
    pub id: Option<i64>,
    pub description: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default = "default_item_status")]
    pub status: String,
}

fn default_item_status() -> String {
    "pending".to_string()
}

/// Ephemeral follow-up result; never written to the meeting cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowupResponse {
    pub summary: String,
    #[serde(default)]
    pub action_items: Vec<FollowupActionItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}
