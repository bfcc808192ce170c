//! Client-side query cache for meeting data
//!
//! - `query_cache`: generic keyed cache with staleness and shared fetches
//! - `keys`: `["meetings"]` / `["meeting", id]` query keys
//! - `meetings`: meeting list and detail queries backed by the REST client

pub mod keys;
pub mod meetings;
pub mod query_cache;

pub use keys::QueryKey;
pub use meetings::MeetingQueries;
pub use query_cache::{QueryCache, QueryError, QuerySnapshot, QueryStatus};
