//! Meeting-processing backend REST client
//!
//! Thin client for the four endpoints the workflow consumes:
//!
//! | Method | Path |
//! |---|---|
//! | GET | `/meetings?limit=N` |
//! | GET | `/meetings/:id` |
//! | POST | `/meetings` (multipart) |
//! | POST | `/agents/meeting-followup` (JSON) |
//!
//! Non-2xx responses carry a JSON body with an `error` string; when it is
//! missing the HTTP reason phrase is used instead.

use crate::error::{ClientError, ClientResult};
use alex_common::config::ClientSettings;
use alex_common::models::{CreateMeetingResponse, FollowupRequest, FollowupResponse, Meeting};
use reqwest::multipart::Form;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

const USER_AGENT: &str = concat!("alex-client/", env!("CARGO_PKG_VERSION"));

/// Message used when a 2xx body is not valid JSON
pub const PARSE_FAILURE_MESSAGE: &str = "Failed to parse server response";

/// Meeting-processing backend client
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct MeetingsClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl MeetingsClient {
    /// Build a client from resolved settings
    pub fn new(settings: &ClientSettings) -> ClientResult<Self> {
        Self::with_base_url(&settings.api_base_url, settings.request_timeout)
    }

    /// Build a client for an explicit base URL (trailing slashes ignored)
    pub fn with_base_url(base_url: &str, timeout: Duration) -> ClientResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /meetings`, newest first, optionally bounded by `limit`
    pub async fn list_meetings(&self, limit: Option<u32>) -> ClientResult<Vec<Meeting>> {
        let path = match limit {
            Some(limit) => format!("/meetings?limit={}", limit),
            None => "/meetings".to_string(),
        };
        let meetings: Vec<Meeting> = self.send(self.http_client.get(self.url(&path))).await?;

        tracing::debug!(count = meetings.len(), ?limit, "Fetched meetings list");
        Ok(meetings)
    }

    /// `GET /meetings/:id`
    pub async fn get_meeting(&self, meeting_id: i64) -> ClientResult<Meeting> {
        let meeting: Meeting = self
            .send(self.http_client.get(self.url(&format!("/meetings/{}", meeting_id))))
            .await?;

        tracing::debug!(meeting_id, status = %meeting.status, "Fetched meeting");
        Ok(meeting)
    }

    /// `POST /meetings` with a multipart form; returns the job acknowledgement
    pub async fn create_meeting(&self, form: Form) -> ClientResult<CreateMeetingResponse> {
        let ack: CreateMeetingResponse = self
            .send(self.http_client.post(self.url("/meetings")).multipart(form))
            .await?;

        tracing::info!(
            meeting_id = ack.meeting_id,
            status = %ack.status,
            "Meeting job created"
        );
        Ok(ack)
    }

    /// `POST /agents/meeting-followup`; the result is never cached
    pub async fn run_followup(&self, request: &FollowupRequest) -> ClientResult<FollowupResponse> {
        let response: FollowupResponse = self
            .send(
                self.http_client
                    .post(self.url("/agents/meeting-followup"))
                    .json(request),
            )
            .await?;

        tracing::info!(
            action_items = response.action_items.len(),
            "Follow-up generated"
        );
        Ok(response)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "Backend returned error status");
        }

        decode_response(status, &body)
    }
}

/// Apply the backend response convention to a raw status and body
///
/// - non-2xx: `Err(Api)` with the body's `error` field, else the reason
///   phrase, else `"Request failed"`;
/// - 2xx with an unparseable body: `Err(Parse)`;
/// - 2xx with an empty body: decoded from JSON `null`.
pub fn decode_response<T: DeserializeOwned>(status: StatusCode, body: &str) -> ClientResult<T> {
    let data: Option<Value> = if body.is_empty() {
        None
    } else {
        match serde_json::from_str::<Value>(body) {
            Ok(value) => Some(value),
            Err(_) if status.is_success() => {
                return Err(ClientError::Parse(PARSE_FAILURE_MESSAGE.to_string()));
            }
            Err(_) => None,
        }
    };

    if !status.is_success() {
        let message = data
            .as_ref()
            .and_then(|value| value.as_object())
            .and_then(|object| object.get("error"))
            .map(|error| match error {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_else(|| status.canonical_reason().unwrap_or_default().to_string());

        let message = if message.is_empty() {
            "Request failed".to_string()
        } else {
            message
        };

        return Err(ClientError::Api {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_value(data.unwrap_or(Value::Null))
        .map_err(|e| ClientError::Parse(format!("{}: {}", PARSE_FAILURE_MESSAGE, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation_trims_base_url() {
        let timeout = Duration::from_secs(5);
        let client = MeetingsClient::with_base_url("http://localhost:5000/", timeout).unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000");
        assert_eq!(client.url("/meetings"), "http://localhost:5000/meetings");
    }

    #[test]
    fn test_error_field_is_used_verbatim() {
        let err = decode_response::<Value>(StatusCode::NOT_FOUND, r#"{"error":"not found"}"#)
            .unwrap_err();
        assert_eq!(err.to_string(), "not found");
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_non_string_error_field_is_rendered_as_json() {
        let err = decode_response::<Value>(StatusCode::BAD_REQUEST, r#"{"error":{"code":7}}"#)
            .unwrap_err();
        assert_eq!(err.to_string(), r#"{"code":7}"#);
    }

    #[test]
    fn test_missing_error_field_falls_back_to_reason_phrase() {
        let err = decode_response::<Value>(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>")
            .unwrap_err();
        assert_eq!(err.to_string(), "Internal Server Error");

        let err = decode_response::<Value>(StatusCode::SERVICE_UNAVAILABLE, "").unwrap_err();
        assert_eq!(err.to_string(), "Service Unavailable");
    }

    #[test]
    fn test_unknown_status_without_reason_uses_generic_message() {
        let status = StatusCode::from_u16(599).unwrap();
        let err = decode_response::<Value>(status, "").unwrap_err();
        assert_eq!(err.to_string(), "Request failed");
    }

    #[test]
    fn test_unparseable_success_body() {
        let err = decode_response::<Value>(StatusCode::OK, "not json").unwrap_err();
        assert!(matches!(err, ClientError::Parse(_)));
        assert_eq!(err.to_string(), PARSE_FAILURE_MESSAGE);
    }

    #[test]
    fn test_empty_success_body_is_null() {
        let value: Option<Meeting> = decode_response(StatusCode::NO_CONTENT, "").unwrap();
        assert!(value.is_none());

        let err = decode_response::<Meeting>(StatusCode::OK, "").unwrap_err();
        assert!(matches!(err, ClientError::Parse(_)));
    }
}
