//! Meeting submission form
//!
//! Holds the fields of a new meeting job and turns them into the multipart
//! body for `POST /meetings`. The audio source is either an uploaded file or
//! a recorded clip, never both.

use crate::error::{ClientError, ClientResult};
use alex_common::dates::parse_form_date;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use std::path::Path;
use uuid::Uuid;

/// Tag sent as `source_agent` for meetings created here
pub const SOURCE_AGENT: &str = "alex-dashboard";

pub const REQUIRED_FIELDS_MESSAGE: &str = "Please fill in all required fields";
pub const INVALID_FILE_TYPE_MESSAGE: &str =
    "Invalid file type. Please upload MP3, WAV, M4A, or WebM files.";

const ALLOWED_MIME_TYPES: [&str; 5] = [
    "audio/mpeg",
    "audio/wav",
    "audio/mp3",
    "audio/m4a",
    "audio/webm",
];
const ALLOWED_EXTENSIONS: [&str; 4] = ["mp3", "wav", "m4a", "webm"];
const DEFAULT_RECORDING_MIME: &str = "audio/webm";

/// Audio file chosen from disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl AudioFile {
    /// MIME type sniffed from the content, falling back to the extension
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime_type = infer::get(&bytes)
            .map(|kind| normalize_mime(kind.mime_type()).to_string())
            .or_else(|| mime_from_extension(&file_name).map(str::to_string))
            .unwrap_or_else(|| "application/octet-stream".to_string());

        Self {
            file_name,
            mime_type,
            bytes,
        }
    }

    /// Explicit MIME type, as reported by a file picker
    pub fn with_mime(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub async fn from_path(path: &Path) -> ClientResult<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ClientError::Common(e.into()))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());
        Ok(Self::new(file_name, bytes))
    }

    /// Allowed MIME type, or an allowed extension (case-insensitive)
    pub fn is_supported(&self) -> bool {
        ALLOWED_MIME_TYPES.contains(&self.mime_type.as_str())
            || extension(&self.file_name)
                .is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
    }
}

/// Clip captured from the microphone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recording {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Recording {
    /// Named `recording-<epoch-ms>.webm`; MIME defaults to `audio/webm`
    pub fn new(bytes: Vec<u8>, mime_type: Option<String>) -> Self {
        Self {
            file_name: format!("recording-{}.webm", Utc::now().timestamp_millis()),
            mime_type: mime_type
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_RECORDING_MIME.to_string()),
            bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSource {
    File(AudioFile),
    Recording(Recording),
}

impl AudioSource {
    pub fn file_name(&self) -> &str {
        match self {
            AudioSource::File(file) => &file.file_name,
            AudioSource::Recording(recording) => &recording.file_name,
        }
    }

    pub fn mime_type(&self) -> &str {
        match self {
            AudioSource::File(file) => &file.mime_type,
            AudioSource::Recording(recording) => &recording.mime_type,
        }
    }

    fn bytes(&self) -> &[u8] {
        match self {
            AudioSource::File(file) => &file.bytes,
            AudioSource::Recording(recording) => &recording.bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Participant {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl Participant {
    fn blank() -> Self {
        Self {
            id: Uuid::new_v4(),
            name: String::new(),
            email: String::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty() && !self.email.trim().is_empty() && self.email.contains('@')
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantField {
    Name,
    Email,
}

/// New-meeting form state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingForm {
    pub title: String,
    /// `YYYY-MM-DD`
    pub meeting_date: String,
    participants: Vec<Participant>,
    audio: Option<AudioSource>,
}

impl Default for MeetingForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            meeting_date: String::new(),
            participants: vec![Participant::blank()],
            audio: None,
        }
    }
}

impl MeetingForm {
    /// Empty form with one blank participant
    pub fn new() -> Self {
        Self::default()
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn audio(&self) -> Option<&AudioSource> {
        self.audio.as_ref()
    }

    /// Append a blank participant and return its id
    pub fn add_participant(&mut self) -> Uuid {
        let participant = Participant::blank();
        let id = participant.id;
        self.participants.push(participant);
        id
    }

    /// Remove by id; refused when only one participant remains
    pub fn remove_participant(&mut self, id: Uuid) -> bool {
        if self.participants.len() <= 1 {
            return false;
        }
        let before = self.participants.len();
        self.participants.retain(|p| p.id != id);
        self.participants.len() != before
    }

    pub fn update_participant(&mut self, id: Uuid, field: ParticipantField, value: &str) -> bool {
        match self.participants.iter_mut().find(|p| p.id == id) {
            Some(participant) => {
                match field {
                    ParticipantField::Name => participant.name = value.to_string(),
                    ParticipantField::Email => participant.email = value.to_string(),
                }
                true
            }
            None => false,
        }
    }

    /// Select an uploaded file, replacing any recording
    ///
    /// An unsupported file is rejected and the previous selection kept.
    pub fn select_file(&mut self, file: AudioFile) -> ClientResult<()> {
        if !file.is_supported() {
            tracing::debug!(
                file_name = %file.file_name,
                mime = %file.mime_type,
                "Rejected audio file"
            );
            return Err(ClientError::Validation(INVALID_FILE_TYPE_MESSAGE.to_string()));
        }
        self.audio = Some(AudioSource::File(file));
        Ok(())
    }

    /// Attach a recorded clip, replacing any selected file
    pub fn attach_recording(&mut self, recording: Recording) {
        self.audio = Some(AudioSource::Recording(recording));
    }

    pub fn clear_audio(&mut self) {
        self.audio = None;
    }

    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty()
            && parse_form_date(&self.meeting_date).is_some()
            && self.audio.is_some()
            && !self.participants.is_empty()
            && self.participants.iter().all(Participant::is_valid)
    }

    pub fn validate(&self) -> ClientResult<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(ClientError::Validation(REQUIRED_FIELDS_MESSAGE.to_string()))
        }
    }

    /// Multipart body: `title`, `source_agent`, `audio`, `meeting_date`
    pub fn to_multipart(&self) -> ClientResult<Form> {
        self.validate()?;
        let audio = self
            .audio
            .as_ref()
            .ok_or_else(|| ClientError::Validation(REQUIRED_FIELDS_MESSAGE.to_string()))?;

        let part = Part::bytes(audio.bytes().to_vec())
            .file_name(audio.file_name().to_string())
            .mime_str(audio.mime_type())
            .map_err(|e| ClientError::Validation(e.to_string()))?;

        Ok(Form::new()
            .text("title", self.title.trim().to_string())
            .text("source_agent", SOURCE_AGENT)
            .part("audio", part)
            .text("meeting_date", self.meeting_date.clone()))
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

fn mime_from_extension(file_name: &str) -> Option<&'static str> {
    match extension(file_name)?.as_str() {
        "mp3" => Some("audio/mpeg"),
        "wav" => Some("audio/wav"),
        "m4a" => Some("audio/m4a"),
        "webm" => Some("audio/webm"),
        _ => None,
    }
}

fn normalize_mime(mime: &str) -> &str {
    match mime {
        "audio/x-wav" | "audio/wave" => "audio/wav",
        "video/webm" => "audio/webm",
        "audio/x-m4a" | "audio/mp4" => "audio/m4a",
        other => other,
    }
}
