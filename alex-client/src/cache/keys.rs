//! Query keys
//!
//! Keys mirror a path-like array: `["meetings"]`, `["meetings", 5]`,
//! `["meeting", 9]`. Invalidation matches by prefix, so `["meetings"]`
//! covers every list key but never a `["meeting", id]` key.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// Meetings list, optionally bounded
    Meetings { limit: Option<u32> },
    /// One meeting by id
    Meeting(i64),
}

impl QueryKey {
    /// The shared `["meetings"]` list key
    pub const MEETINGS: QueryKey = QueryKey::Meetings { limit: None };

    /// Prefix match against another key
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        match (self, prefix) {
            (QueryKey::Meetings { .. }, QueryKey::Meetings { limit: None }) => true,
            (QueryKey::Meetings { limit: a }, QueryKey::Meetings { limit: b }) => a == b,
            (QueryKey::Meeting(a), QueryKey::Meeting(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::Meetings { limit: None } => write!(f, "[\"meetings\"]"),
            QueryKey::Meetings { limit: Some(limit) } => write!(f, "[\"meetings\", {}]", limit),
            QueryKey::Meeting(id) => write!(f, "[\"meeting\", {}]", id),
        }
    }
}
