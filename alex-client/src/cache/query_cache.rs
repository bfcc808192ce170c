//! Keyed query cache with staleness window and shared in-flight fetches
//!
//! Each key owns one entry with the state machine
//! `idle → loading → success | error`, and `success | error → loading` on
//! refetch. The last good data is kept while a refetch runs and after a
//! failed refetch.
//!
//! Read rules ([`QueryCache::query`]):
//! - fresh data: returned without a request;
//! - stale data: returned immediately, one background refetch started;
//! - no data, an error, or an invalidated entry: the caller waits for a fetch.
//!
//! Concurrent callers needing the same key share one in-flight request.
//! The entry map lock is never held across an await.

use crate::error::ClientError;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Cloneable error stored in a cache entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryError {
    /// Human-readable message, shown verbatim in error states
    pub message: String,
    /// HTTP status when the backend answered
    pub status: Option<u16>,
}

impl From<&ClientError> for QueryError {
    fn from(err: &ClientError) -> Self {
        Self {
            message: err.to_string(),
            status: err.status(),
        }
    }
}

impl From<ClientError> for QueryError {
    fn from(err: ClientError) -> Self {
        QueryError::from(&err)
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for QueryError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Idle,
    Loading,
    Success,
    Error,
}

/// Point-in-time view of one cache entry
#[derive(Debug, Clone)]
pub struct QuerySnapshot<V> {
    pub status: QueryStatus,
    /// Last successfully fetched data
    pub data: Option<V>,
    pub error: Option<QueryError>,
    pub is_fetching: bool,
    pub is_stale: bool,
    pub data_updated_at: Option<Instant>,
}

type FetchFuture<V> = Shared<BoxFuture<'static, Result<V, QueryError>>>;

struct InFlight<V> {
    generation: u64,
    future: FetchFuture<V>,
}

struct Entry<V> {
    status: QueryStatus,
    data: Option<V>,
    error: Option<QueryError>,
    updated_at: Option<Instant>,
    /// Bumped on every invalidation
    generation: u64,
    /// Generation of the most recent settled fetch
    settled_generation: u64,
    invalidated: bool,
    in_flight: Option<InFlight<V>>,
}

impl<V> Default for Entry<V> {
    fn default() -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            updated_at: None,
            generation: 0,
            settled_generation: 0,
            invalidated: false,
            in_flight: None,
        }
    }
}

impl<V> Entry<V> {
    fn is_stale(&self, stale_time: Duration, now: Instant) -> bool {
        if self.invalidated {
            return true;
        }
        match self.updated_at {
            Some(updated_at) => now.duration_since(updated_at) >= stale_time,
            None => true,
        }
    }
}

/// Outcome of the read decision taken under the lock
enum Plan<V> {
    Ready(V),
    Wait(FetchFuture<V>),
}

/// Keyed query cache
pub struct QueryCache<K, V> {
    entries: Arc<Mutex<HashMap<K, Entry<V>>>>,
    stale_time: Duration,
}

impl<K, V> Clone for QueryCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            stale_time: self.stale_time,
        }
    }
}

impl<K, V> QueryCache<K, V>
where
    K: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// `stale_time` of zero makes every cached read revalidate in the background
    pub fn new(stale_time: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            stale_time,
        }
    }

    pub fn stale_time(&self) -> Duration {
        self.stale_time
    }

    /// Read through the cache
    pub async fn query<F, Fut>(&self, key: K, fetcher: F) -> Result<V, QueryError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, ClientError>> + Send + 'static,
    {
        let plan = {
            let mut entries = self.entries.lock().await;
            let entry = entries.entry(key.clone()).or_default();
            let now = Instant::now();

            let cached = if entry.invalidated || entry.status == QueryStatus::Error {
                None
            } else {
                entry.data.clone()
            };
            let fresh = !entry.is_stale(self.stale_time, now);

            match cached {
                Some(data) if fresh => Plan::Ready(data),
                Some(data) => {
                    if entry.in_flight.is_none() {
                        tracing::debug!(?key, "Stale query, refetching in background");
                        let future = self.start_fetch(entry, key.clone(), fetcher);
                        tokio::spawn(future);
                    }
                    Plan::Ready(data)
                }
                None => Plan::Wait(self.join_or_start(entry, key.clone(), fetcher)),
            }
        };

        match plan {
            Plan::Ready(data) => Ok(data),
            Plan::Wait(future) => future.await,
        }
    }

    /// Fetch regardless of freshness, joining a current in-flight request
    pub async fn refetch<F, Fut>(&self, key: K, fetcher: F) -> Result<V, QueryError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, ClientError>> + Send + 'static,
    {
        let future = {
            let mut entries = self.entries.lock().await;
            let entry = entries.entry(key.clone()).or_default();
            self.join_or_start(entry, key, fetcher)
        };
        future.await
    }

    /// Mark one entry invalidated; returns whether the key was cached
    pub async fn invalidate(&self, key: &K) -> bool {
        let mut entries = self.entries.lock().await;
        match entries.get_mut(key) {
            Some(entry) => {
                entry.generation += 1;
                entry.invalidated = true;
                true
            }
            None => false,
        }
    }

    /// Mark every entry whose key matches invalidated; returns the count
    pub async fn invalidate_where<P>(&self, predicate: P) -> usize
    where
        P: Fn(&K) -> bool,
    {
        let mut entries = self.entries.lock().await;
        let mut count = 0;
        for (key, entry) in entries.iter_mut() {
            if predicate(key) {
                entry.generation += 1;
                entry.invalidated = true;
                count += 1;
            }
        }
        count
    }

    pub async fn snapshot(&self, key: &K) -> QuerySnapshot<V> {
        let entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) => QuerySnapshot {
                status: entry.status,
                data: entry.data.clone(),
                error: entry.error.clone(),
                is_fetching: entry.in_flight.is_some(),
                is_stale: entry.is_stale(self.stale_time, Instant::now()),
                data_updated_at: entry.updated_at,
            },
            None => QuerySnapshot {
                status: QueryStatus::Idle,
                data: None,
                error: None,
                is_fetching: false,
                is_stale: true,
                data_updated_at: None,
            },
        }
    }

    /// Reuse the in-flight fetch unless it predates an invalidation
    fn join_or_start<F, Fut>(&self, entry: &mut Entry<V>, key: K, fetcher: F) -> FetchFuture<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, ClientError>> + Send + 'static,
    {
        match &entry.in_flight {
            Some(in_flight) if in_flight.generation == entry.generation => {
                tracing::debug!(?key, "Joining in-flight query");
                in_flight.future.clone()
            }
            _ => self.start_fetch(entry, key, fetcher),
        }
    }

    fn start_fetch<F, Fut>(&self, entry: &mut Entry<V>, key: K, fetcher: F) -> FetchFuture<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, ClientError>> + Send + 'static,
    {
        let generation = entry.generation;
        let entries = Arc::clone(&self.entries);
        let request = fetcher();

        let future = async move {
            let result = request.await.map_err(QueryError::from);
            settle(&entries, &key, generation, &result).await;
            result
        }
        .boxed()
        .shared();

        entry.status = QueryStatus::Loading;
        entry.in_flight = Some(InFlight {
            generation,
            future: future.clone(),
        });
        future
    }
}

/// Store a fetch result as a whole-entry replacement
async fn settle<K, V>(
    entries: &Mutex<HashMap<K, Entry<V>>>,
    key: &K,
    generation: u64,
    result: &Result<V, QueryError>,
) where
    K: Eq + Hash + fmt::Debug,
    V: Clone,
{
    let mut entries = entries.lock().await;
    let Some(entry) = entries.get_mut(key) else {
        return;
    };

    if entry
        .in_flight
        .as_ref()
        .is_some_and(|f| f.generation == generation)
    {
        entry.in_flight = None;
    }

    // A newer fetch already landed
    if generation < entry.settled_generation {
        return;
    }
    entry.settled_generation = generation;

    match result {
        Ok(data) => {
            entry.data = Some(data.clone());
            entry.error = None;
            entry.status = QueryStatus::Success;
            entry.updated_at = Some(Instant::now());
        }
        Err(error) => {
            tracing::debug!(?key, error = %error, "Query failed");
            entry.error = Some(error.clone());
            entry.status = QueryStatus::Error;
        }
    }

    if generation == entry.generation {
        entry.invalidated = false;
    }

    // Another fetch is still running for a newer generation
    if entry.in_flight.is_some() {
        entry.status = QueryStatus::Loading;
    }
}
