//! Read models over cached meeting data
//!
//! - `action_items`: cross-meeting aggregation, filters, local overlay
//! - `dashboard`: summary stats, recent meetings, instant follow-up
//! - `history`: search and filters for the meeting table
//! - `detail`: single meeting with retry, overlay and summary export

pub mod action_items;
pub mod dashboard;
pub mod detail;
pub mod history;

pub use action_items::{ActionItemBoard, ActionItemFilter, DueFilter, StatusFilter};
pub use dashboard::DashboardStats;
pub use detail::{DetailState, MeetingDetailView};
pub use history::HistoryFilter;
