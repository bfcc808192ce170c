//! Dictation session over a pluggable speech recognizer
//!
//! The recognizer itself is platform-provided and supplied by the embedding
//! front end; this module only tracks the session state. A missing recognizer
//! degrades to [`DictationStatus::Unsupported`] instead of failing. The `alex`
//! CLI ships without one, so `followup --dictate` reports it as unsupported.

use crate::error::{ClientError, ClientResult};
use serde::Serialize;

pub const DICTATION_UNSUPPORTED_MESSAGE: &str =
    "Speech recognition is not supported in this environment";

/// Platform speech recognizer
pub trait SpeechRecognizer: Send {
    fn start(&mut self) -> Result<(), String>;
    fn stop(&mut self) -> Result<(), String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DictationStatus {
    Idle,
    Listening,
    Unsupported,
    Error,
}

/// One dictation session; dropping it stops an active recognizer
pub struct DictationSession {
    recognizer: Option<Box<dyn SpeechRecognizer>>,
    status: DictationStatus,
    transcript: String,
    error: Option<String>,
}

impl DictationSession {
    pub fn new(recognizer: Option<Box<dyn SpeechRecognizer>>) -> Self {
        let status = if recognizer.is_some() {
            DictationStatus::Idle
        } else {
            DictationStatus::Unsupported
        };
        Self {
            recognizer,
            status,
            transcript: String::new(),
            error: None,
        }
    }

    pub fn status(&self) -> DictationStatus {
        self.status
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_supported(&self) -> bool {
        self.recognizer.is_some()
    }

    /// Begin listening; clears the previous transcript
    pub fn start(&mut self) {
        let Some(recognizer) = self.recognizer.as_mut() else {
            return;
        };
        self.transcript.clear();
        self.error = None;
        match recognizer.start() {
            Ok(()) => self.status = DictationStatus::Listening,
            Err(e) => self.fail(e, "Unable to start speech recognition"),
        }
    }

    /// Stop listening; the transcript is kept
    pub fn stop(&mut self) {
        let Some(recognizer) = self.recognizer.as_mut() else {
            return;
        };
        match recognizer.stop() {
            Ok(()) => self.status = DictationStatus::Idle,
            Err(e) => self.fail(e, "Unable to stop speech recognition"),
        }
    }

    /// Recognizer produced text; replaces the interim transcript
    pub fn on_result(&mut self, text: &str) {
        if self.status == DictationStatus::Listening {
            self.transcript = text.trim().to_string();
        }
    }

    /// Recognizer reported an error code
    pub fn on_error(&mut self, code: &str) {
        self.fail(code.to_string(), "speech-error");
    }

    /// Stop listening and hand over the transcript for analysis
    pub fn finish(&mut self) -> ClientResult<String> {
        if self.status == DictationStatus::Listening {
            self.stop();
        }
        match self.status {
            DictationStatus::Unsupported => Err(ClientError::Validation(
                DICTATION_UNSUPPORTED_MESSAGE.to_string(),
            )),
            DictationStatus::Error => Err(ClientError::Validation(
                self.error.clone().unwrap_or_else(|| "speech-error".to_string()),
            )),
            _ => Ok(self.transcript.clone()),
        }
    }

    pub fn reset(&mut self) {
        self.transcript.clear();
        self.error = None;
    }

    fn fail(&mut self, message: String, fallback: &str) {
        let message = if message.trim().is_empty() {
            fallback.to_string()
        } else {
            message
        };
        tracing::warn!(error = %message, "Dictation error");
        self.error = Some(message);
        self.status = DictationStatus::Error;
    }
}

impl Drop for DictationSession {
    fn drop(&mut self) {
        if self.status == DictationStatus::Listening {
            if let Some(recognizer) = self.recognizer.as_mut() {
                let _ = recognizer.stop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FakeRecognizer {
        stops: Arc<AtomicUsize>,
        fail_start: bool,
    }

    impl SpeechRecognizer for FakeRecognizer {
        fn start(&mut self) -> Result<(), String> {
            if self.fail_start {
                Err(String::new())
            } else {
                Ok(())
            }
        }

        fn stop(&mut self) -> Result<(), String> {
            self.stops.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn session(fail_start: bool) -> (DictationSession, Arc<AtomicUsize>) {
        let stops = Arc::new(AtomicUsize::new(0));
        let recognizer = FakeRecognizer {
            stops: Arc::clone(&stops),
            fail_start,
        };
        (DictationSession::new(Some(Box::new(recognizer))), stops)
    }

    #[test]
    fn test_missing_recognizer_is_unsupported() {
        let mut session = DictationSession::new(None);
        assert_eq!(session.status(), DictationStatus::Unsupported);
        session.start();
        assert_eq!(session.status(), DictationStatus::Unsupported);
        assert!(session.error().is_none());
    }

    #[test]
    fn test_listen_and_stop() {
        let (mut session, stops) = session(false);
        session.start();
        assert_eq!(session.status(), DictationStatus::Listening);
        session.on_result("  ACTION: send notes  ");
        assert_eq!(session.transcript(), "ACTION: send notes");
        session.stop();
        assert_eq!(session.status(), DictationStatus::Idle);
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_start_failure_uses_fallback_message() {
        let (mut session, _) = session(true);
        session.start();
        assert_eq!(session.status(), DictationStatus::Error);
        assert_eq!(session.error(), Some("Unable to start speech recognition"));
    }

    #[test]
    fn test_finish_stops_and_returns_transcript() {
        let (mut session, stops) = session(false);
        session.start();
        session.on_result("ACTION: book room");
        assert_eq!(session.finish().unwrap(), "ACTION: book room");
        assert_eq!(session.status(), DictationStatus::Idle);
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_finish_without_recognizer_is_a_validation_error() {
        let mut unsupported = DictationSession::new(None);
        unsupported.start();
        let err = unsupported.finish().unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert_eq!(err.to_string(), DICTATION_UNSUPPORTED_MESSAGE);

        let (mut failing, _) = session(true);
        failing.start();
        assert_eq!(
            failing.finish().unwrap_err().to_string(),
            "Unable to start speech recognition"
        );
    }

    #[test]
    fn test_drop_stops_active_session() {
        let (mut session, stops) = session(false);
        session.start();
        drop(session);
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }
}
