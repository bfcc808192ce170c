//! Backend and platform services
//!
//! - `meetings_api`: REST client for the meeting-processing backend
//! - `dictation`: speech dictation session state

pub mod dictation;
pub mod meetings_api;

pub use dictation::{DictationSession, DictationStatus, SpeechRecognizer};
pub use meetings_api::MeetingsClient;
