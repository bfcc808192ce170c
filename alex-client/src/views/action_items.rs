//! Action-item aggregation across meetings
//!
//! Flattens every meeting's action items and filters them by assignee,
//! completion and due bucket. Status toggles are local overlays: they are
//! never sent to the backend and are dropped when fresh meeting data is
//! loaded.

use alex_common::dates::parse_timestamp;
use alex_common::models::{is_action_item_done, ActionItem, Meeting};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::str::FromStr;

/// Action item annotated with its meeting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatedActionItem {
    pub meeting_id: i64,
    pub meeting_title: String,
    #[serde(flatten)]
    pub item: ActionItem,
}

impl AggregatedActionItem {
    pub fn is_done(&self) -> bool {
        self.item.is_done()
    }

    fn due(&self) -> Option<DateTime<Utc>> {
        self.item.due_date.as_deref().and_then(parse_timestamp)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
    Pending,
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "completed" => Ok(StatusFilter::Completed),
            "pending" => Ok(StatusFilter::Pending),
            other => Err(format!("unknown status filter '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DueFilter {
    #[default]
    All,
    Overdue,
    Today,
    Week,
}

impl FromStr for DueFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(DueFilter::All),
            "overdue" => Ok(DueFilter::Overdue),
            "today" => Ok(DueFilter::Today),
            "week" => Ok(DueFilter::Week),
            other => Err(format!("unknown due filter '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionItemFilter {
    /// Exact match on owner; `None` matches everyone
    pub assignee: Option<String>,
    pub status: StatusFilter,
    pub due: DueFilter,
}

impl ActionItemFilter {
    pub fn matches(&self, item: &AggregatedActionItem, now: DateTime<Utc>) -> bool {
        if let Some(assignee) = &self.assignee {
            if item.item.owner.as_deref() != Some(assignee.as_str()) {
                return false;
            }
        }

        let status_ok = match self.status {
            StatusFilter::All => true,
            StatusFilter::Completed => item.is_done(),
            StatusFilter::Pending => !item.is_done(),
        };

        status_ok && matches_due(item, self.due, now)
    }
}

/// Due-bucket rule; items without a parseable due date match only `All`
pub fn matches_due(item: &AggregatedActionItem, filter: DueFilter, now: DateTime<Utc>) -> bool {
    if filter == DueFilter::All {
        return true;
    }
    let Some(due) = item.due() else {
        return false;
    };

    match filter {
        DueFilter::All => true,
        DueFilter::Overdue => !item.is_done() && due < now,
        DueFilter::Today => due.date_naive() == now.date_naive(),
        DueFilter::Week => due <= now + Duration::days(7),
    }
}

/// Flatten meetings into annotated action items, in meeting order
pub fn aggregate(meetings: &[Meeting]) -> Vec<AggregatedActionItem> {
    meetings
        .iter()
        .flat_map(|meeting| {
            meeting.action_items.iter().map(|item| AggregatedActionItem {
                meeting_id: meeting.id,
                meeting_title: meeting.title.clone(),
                item: item.clone(),
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActionItemStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub overdue: usize,
}

pub fn stats(items: &[AggregatedActionItem], now: DateTime<Utc>) -> ActionItemStats {
    let completed = items.iter().filter(|i| i.is_done()).count();
    ActionItemStats {
        total: items.len(),
        completed,
        pending: items.len() - completed,
        overdue: items
            .iter()
            .filter(|i| matches_due(i, DueFilter::Overdue, now))
            .count(),
    }
}

/// Distinct non-blank owners in first-seen order
pub fn assignees(items: &[AggregatedActionItem]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for owner in items.iter().filter_map(|i| i.item.owner.as_deref()) {
        if !owner.trim().is_empty() && !seen.iter().any(|s| s == owner) {
            seen.push(owner.to_string());
        }
    }
    seen
}

/// Status an item takes when toggled
pub fn toggled_status(status: &str) -> &'static str {
    if is_action_item_done(status) {
        "pending"
    } else {
        "completed"
    }
}

/// Flip one item's status in place; returns the new status
pub fn toggle_item(items: &mut [ActionItem], item_id: i64) -> Option<String> {
    let item = items.iter_mut().find(|i| i.id == item_id)?;
    item.status = toggled_status(&item.status).to_string();
    Some(item.status.clone())
}

/// Mark every item completed; returns how many changed
pub fn mark_all_completed(items: &mut [ActionItem]) -> usize {
    let mut changed = 0;
    for item in items.iter_mut().filter(|i| !i.is_done()) {
        item.status = "completed".to_string();
        changed += 1;
    }
    changed
}

/// Aggregated items plus their local status overlay
#[derive(Debug, Clone, Default)]
pub struct ActionItemBoard {
    items: Vec<AggregatedActionItem>,
}

impl ActionItemBoard {
    pub fn from_meetings(meetings: &[Meeting]) -> Self {
        Self {
            items: aggregate(meetings),
        }
    }

    /// Replace everything, overlay included, with fresh meeting data
    pub fn reload(&mut self, meetings: &[Meeting]) {
        self.items = aggregate(meetings);
    }

    pub fn items(&self) -> &[AggregatedActionItem] {
        &self.items
    }

    pub fn filtered(
        &self,
        filter: &ActionItemFilter,
        now: DateTime<Utc>,
    ) -> Vec<&AggregatedActionItem> {
        self.items.iter().filter(|i| filter.matches(i, now)).collect()
    }

    pub fn stats(&self, now: DateTime<Utc>) -> ActionItemStats {
        stats(&self.items, now)
    }

    pub fn assignees(&self) -> Vec<String> {
        assignees(&self.items)
    }

    /// Toggle one item of one meeting; returns the new status
    pub fn toggle(&mut self, meeting_id: i64, item_id: i64) -> Option<String> {
        let entry = self
            .items
            .iter_mut()
            .find(|i| i.meeting_id == meeting_id && i.item.id == item_id)?;
        entry.item.status = toggled_status(&entry.item.status).to_string();
        Some(entry.item.status.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alex_common::models::MeetingStatus;
    use chrono::TimeZone;

    fn item(id: i64, owner: Option<&str>, due: Option<&str>, status: &str) -> ActionItem {
        ActionItem {
            id,
            description: format!("item {}", id),
            owner: owner.map(str::to_string),
            due_date: due.map(str::to_string),
            status: status.to_string(),
        }
    }

    fn meeting(id: i64, items: Vec<ActionItem>) -> Meeting {
        Meeting {
            id,
            title: format!("Meeting {}", id),
            status: MeetingStatus::Done,
            created_at: "2025-06-01T09:00:00".to_string(),
            audio_url: None,
            transcript: None,
            summary: None,
            source_agent: None,
            error_message: None,
            action_items: items,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap()
    }

    fn single(i: ActionItem) -> AggregatedActionItem {
        aggregate(&[meeting(1, vec![i])]).remove(0)
    }

    #[test]
    fn test_aggregate_annotates_meeting() {
        let items = aggregate(&[
            meeting(1, vec![item(1, None, None, "")]),
            meeting(2, vec![item(2, None, None, ""), item(3, None, None, "")]),
        ]);
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].meeting_title, "Meeting 1");
        assert_eq!(items[2].meeting_id, 2);
    }

    #[test]
    fn test_null_due_date_never_matches_a_bucket() {
        let i = single(item(1, None, None, "pending"));
        assert!(matches_due(&i, DueFilter::All, now()));
        assert!(!matches_due(&i, DueFilter::Overdue, now()));
        assert!(!matches_due(&i, DueFilter::Today, now()));
        assert!(!matches_due(&i, DueFilter::Week, now()));

        let garbled = single(item(2, None, Some("someday"), "pending"));
        assert!(!matches_due(&garbled, DueFilter::Week, now()));
    }

    #[test]
    fn test_completed_item_with_past_due_date_is_not_overdue() {
        let done = single(item(1, None, Some("2020-01-01"), "Completed"));
        assert!(!matches_due(&done, DueFilter::Overdue, now()));

        let open = single(item(2, None, Some("2020-01-01"), "pending"));
        assert!(matches_due(&open, DueFilter::Overdue, now()));
        // Week includes overdue items
        assert!(matches_due(&open, DueFilter::Week, now()));
    }

    #[test]
    fn test_today_and_week_buckets() {
        let today = single(item(1, None, Some("2025-06-10"), ""));
        assert!(matches_due(&today, DueFilter::Today, now()));

        let in_six_days = single(item(2, None, Some("2025-06-16T08:00:00Z"), ""));
        assert!(!matches_due(&in_six_days, DueFilter::Today, now()));
        assert!(matches_due(&in_six_days, DueFilter::Week, now()));

        let in_ten_days = single(item(3, None, Some("2025-06-20"), ""));
        assert!(!matches_due(&in_ten_days, DueFilter::Week, now()));
    }

    #[test]
    fn test_filter_by_assignee_and_status() {
        let board = ActionItemBoard::from_meetings(&[meeting(
            1,
            vec![
                item(1, Some("Ana"), None, "done"),
                item(2, Some("Ana"), None, "pending"),
                item(3, Some("Ben"), None, "in progress"),
            ],
        )]);

        let filter = ActionItemFilter {
            assignee: Some("Ana".to_string()),
            status: StatusFilter::Pending,
            due: DueFilter::All,
        };
        let ids: Vec<i64> = board.filtered(&filter, now()).iter().map(|i| i.item.id).collect();
        assert_eq!(ids, vec![2]);

        let filter = ActionItemFilter {
            status: StatusFilter::Completed,
            ..Default::default()
        };
        assert_eq!(board.filtered(&filter, now()).len(), 1);
    }

    #[test]
    fn test_stats_and_assignees() {
        let board = ActionItemBoard::from_meetings(&[
            meeting(1, vec![item(1, Some("Ana"), Some("2025-06-01"), "pending")]),
            meeting(
                2,
                vec![
                    item(2, Some("Ben"), Some("2025-06-01"), "done"),
                    item(3, Some(" "), None, ""),
                    item(4, Some("Ana"), None, ""),
                ],
            ),
        ]);

        assert_eq!(
            board.stats(now()),
            ActionItemStats {
                total: 4,
                completed: 1,
                pending: 3,
                overdue: 1,
            }
        );
        assert_eq!(board.assignees(), vec!["Ana".to_string(), "Ben".to_string()]);
    }

    #[test]
    fn test_toggle_is_local_and_reload_replaces_overlay() {
        let meetings = [meeting(1, vec![item(1, None, None, "pending")])];
        let mut board = ActionItemBoard::from_meetings(&meetings);

        assert_eq!(board.toggle(1, 1).as_deref(), Some("completed"));
        assert_eq!(board.toggle(1, 1).as_deref(), Some("pending"));
        assert_eq!(board.toggle(1, 1).as_deref(), Some("completed"));
        assert!(board.toggle(2, 1).is_none());

        board.reload(&meetings);
        assert_eq!(board.items()[0].item.status, "pending");
    }

    #[test]
    fn test_mark_all_completed() {
        let mut items = vec![item(1, None, None, "DONE"), item(2, None, None, "")];
        assert_eq!(mark_all_completed(&mut items), 1);
        assert!(items.iter().all(ActionItem::is_done));
        assert_eq!(toggle_item(&mut items, 1).as_deref(), Some("pending"));
    }
}
