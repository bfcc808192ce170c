//! Meeting history search and filters

use alex_common::models::{Meeting, MeetingStatus};

/// Source label for meetings without a `source_agent`
pub const UNKNOWN_SOURCE: &str = "Unknown";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    /// Case-insensitive match on title, summary or id
    pub search: String,
    pub status: Option<MeetingStatus>,
    pub source: Option<String>,
}

fn source_of(meeting: &Meeting) -> &str {
    meeting.source_agent.as_deref().unwrap_or(UNKNOWN_SOURCE)
}

impl HistoryFilter {
    pub fn matches(&self, meeting: &Meeting) -> bool {
        let needle = self.search.trim().to_lowercase();
        let search_ok = needle.is_empty()
            || meeting.title.to_lowercase().contains(&needle)
            || meeting
                .summary
                .as_deref()
                .is_some_and(|s| s.to_lowercase().contains(&needle))
            || meeting.id.to_string().contains(&needle);

        let status_ok = self.status.as_ref().map_or(true, |s| *s == meeting.status);
        let source_ok = self
            .source
            .as_deref()
            .map_or(true, |s| s == source_of(meeting));

        search_ok && status_ok && source_ok
    }

    pub fn apply<'a>(&self, meetings: &'a [Meeting]) -> Vec<&'a Meeting> {
        meetings.iter().filter(|m| self.matches(m)).collect()
    }
}

/// Distinct sources, sorted, with missing sources reported as `Unknown`
pub fn sources(meetings: &[Meeting]) -> Vec<String> {
    let mut sources: Vec<String> = meetings.iter().map(|m| source_of(m).to_string()).collect();
    sources.sort();
    sources.dedup();
    sources
}
