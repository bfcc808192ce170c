//! # Alex Common Library
//!
//! Shared code for the Alex meeting workflow crates:
//! - Meeting and action item data model
//! - Event types (AlexEvent enum) and EventBus
//! - Configuration loading
//! - User preferences (theme, saved participants)
//! - Date helpers for due-date evaluation

pub mod config;
pub mod dates;
pub mod error;
pub mod events;
pub mod models;
pub mod preferences;

pub use error::{Error, Result};
pub use models::{ActionItem, Meeting, MeetingStatus};
