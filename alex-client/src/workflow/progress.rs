//! Four-stage processing indicator
//!
//! Maps backend job statuses onto a percentage and a step index into
//! [`PROCESSING_STEPS`].

use alex_common::models::MeetingStatus;
use serde::Serialize;

/// Steps shown by the indicator, in order
pub const PROCESSING_STEPS: [&str; 4] = ["uploading", "pending", "processing", "done"];

/// Progress percentage for a status
pub fn progress_for(status: &MeetingStatus) -> u8 {
    match status {
        MeetingStatus::Uploading => 20,
        MeetingStatus::Pending => 45,
        MeetingStatus::Processing => 80,
        MeetingStatus::Done | MeetingStatus::Failed => 100,
        MeetingStatus::Unknown(_) => 0,
    }
}

/// Step index for a status; `None` for statuses outside the step list
pub fn step_for(status: &MeetingStatus) -> Option<usize> {
    match status {
        MeetingStatus::Failed => Some(PROCESSING_STEPS.len() - 1),
        MeetingStatus::Unknown(_) => None,
        known => PROCESSING_STEPS.iter().position(|s| *s == known.as_str()),
    }
}

/// Indicator state; `status` is `None` while idle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessingIndicator {
    pub status: Option<MeetingStatus>,
    pub progress: u8,
    pub step_index: usize,
}

impl Default for ProcessingIndicator {
    fn default() -> Self {
        Self {
            status: None,
            progress: 0,
            step_index: 0,
        }
    }
}

impl ProcessingIndicator {
    pub fn is_idle(&self) -> bool {
        self.status.is_none()
    }

    /// Enter `status`; unknown statuses keep the current step
    pub fn update(&mut self, status: MeetingStatus) {
        self.progress = progress_for(&status);
        if let Some(step) = step_for(&status) {
            self.step_index = step;
        }
        self.status = Some(status);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
