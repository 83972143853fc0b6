//! The query cache store

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::key::{QueryKey, Tag};

/// Lifecycle notifications for subscribers (screens re-render on these).
#[derive(Debug, Clone)]
pub enum CacheEvent {
    /// Entries under the given tags were marked stale.
    Invalidated { tags: Vec<Tag> },
    /// The whole store was dropped.
    Reset,
}

/// Observable status of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    Fresh,
    Stale,
    /// Last fetch for the entry failed; any later query retries.
    Errored,
}

struct CacheEntry<V, E> {
    value: Option<V>,
    stale: bool,
    tags: Vec<Tag>,
    error: Option<E>,
    /// Highest sequence number whose completion was applied.
    applied_seq: u64,
    /// Sequence number handed to the most recently issued fetch.
    issued_seq: u64,
    /// Bumped on every invalidation touching this entry. A fetch issued
    /// under an older generation can no longer clear staleness, and its
    /// flight is not joinable by queries issued after the bump.
    inval_gen: u64,
}

impl<V, E> CacheEntry<V, E> {
    fn new() -> Self {
        Self {
            value: None,
            stale: false,
            tags: Vec::new(),
            error: None,
            applied_seq: 0,
            issued_seq: 0,
            inval_gen: 0,
        }
    }
}

/// A pending fetch for one key. Waiters subscribe to `tx` instead of issuing
/// their own fetch.
struct Flight<V, E> {
    epoch: u64,
    seq: u64,
    /// The entry's invalidation generation when the fetch was issued.
    inval_gen: u64,
    tx: broadcast::Sender<Result<V, E>>,
}

struct CacheInner<V, E> {
    entries: DashMap<QueryKey, CacheEntry<V, E>>,
    in_flight: DashMap<QueryKey, Flight<V, E>>,
    /// Bumped by `reset_all`; completions from an older epoch are discarded.
    epoch: AtomicU64,
    events: broadcast::Sender<CacheEvent>,
}

/// Removes the flight record if its owner unwinds or is cancelled before
/// completing, so attached waiters wake up and take over.
struct FlightGuard<V, E> {
    inner: Arc<CacheInner<V, E>>,
    key: QueryKey,
    epoch: u64,
    seq: u64,
    inval_gen: u64,
    armed: bool,
}

impl<V, E> Drop for FlightGuard<V, E> {
    fn drop(&mut self) {
        if self.armed {
            self.inner
                .in_flight
                .remove_if(&self.key, |_, f| f.epoch == self.epoch && f.seq == self.seq);
        }
    }
}

enum Role<V, E> {
    Joined {
        rx: broadcast::Receiver<Result<V, E>>,
        /// The flight predates an invalidation of this entry; its result
        /// must not satisfy this caller.
        superseded: bool,
    },
    Leader(FlightGuard<V, E>),
}

/// Process-wide cache over one payload type.
///
/// Cheap to clone; clones share the same store. Created once at process
/// start and injected into the layers that read it, reset on explicit
/// session boundaries.
pub struct QueryCache<V, E> {
    inner: Arc<CacheInner<V, E>>,
}

impl<V, E> Clone for QueryCache<V, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V, E> Default for QueryCache<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V, E> QueryCache<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(CacheInner {
                entries: DashMap::new(),
                in_flight: DashMap::new(),
                epoch: AtomicU64::new(0),
                events,
            }),
        }
    }

    /// Return the cached value for `key`, fetching on miss or staleness.
    ///
    /// At most one fetch is in flight per key: concurrent callers attach to
    /// the pending result. The fetch's completion is applied last-write-wins
    /// by sequence number, and discarded entirely if [`reset_all`] ran in
    /// between.
    ///
    /// [`reset_all`]: QueryCache::reset_all
    pub async fn query<F>(&self, key: QueryKey, tags: &[Tag], fetch: F) -> Result<V, E>
    where
        F: Future<Output = Result<V, E>>,
    {
        loop {
            if let Some(value) = self.fresh(&key) {
                debug!(%key, "cache hit");
                return Ok(value);
            }
            match self.join_or_lead(&key, tags) {
                Role::Joined { mut rx, superseded } => {
                    if superseded {
                        // The pending fetch was issued before an
                        // invalidation; its snapshot cannot satisfy this
                        // caller. Wait it out, then refetch.
                        debug!(%key, "waiting out a fetch issued before invalidation");
                        let _ = rx.recv().await;
                        continue;
                    }
                    debug!(%key, "attaching to in-flight fetch");
                    match rx.recv().await {
                        Ok(outcome) => return outcome,
                        // The flight dissolved without an outcome (owner
                        // cancelled, or the store was reset). Start over.
                        Err(_) => continue,
                    }
                }
                Role::Leader(mut guard) => {
                    debug!(%key, seq = guard.seq, "issuing fetch");
                    let outcome = fetch.await;
                    self.inner.apply(&guard, &outcome);
                    guard.armed = false;
                    if let Some((_, flight)) = self
                        .inner
                        .in_flight
                        .remove_if(&guard.key, |_, f| f.epoch == guard.epoch && f.seq == guard.seq)
                    {
                        // Waiters may all have gone; that is fine.
                        let _ = flight.tx.send(outcome.clone());
                    }
                    return outcome;
                }
            }
        }
    }

    /// Mark every entry carrying any of `tags` stale. The next query for
    /// such a key refetches instead of serving the cached value. This holds
    /// even when a fetch is mid-flight: later queries do not join it, and
    /// its completion cannot clear the staleness.
    pub fn invalidate(&self, tags: &[Tag]) {
        let mut marked = 0usize;
        for mut entry in self.inner.entries.iter_mut() {
            if entry.tags.iter().any(|t| tags.contains(t)) {
                entry.stale = true;
                entry.inval_gen += 1;
                marked += 1;
            }
        }
        debug!(?tags, marked, "invalidated cache entries");
        let _ = self.inner.events.send(CacheEvent::Invalidated {
            tags: tags.to_vec(),
        });
    }

    /// Drop every entry and in-flight record unconditionally.
    ///
    /// Fetches issued before the reset may still be running; their
    /// completions are discarded rather than applied.
    pub fn reset_all(&self) {
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);
        self.inner.entries.clear();
        // Dropping the flights closes their channels, waking any waiters.
        self.inner.in_flight.clear();
        debug!("cache reset");
        let _ = self.inner.events.send(CacheEvent::Reset);
    }

    /// Last known value for `key`, stale or not. Never fetches.
    pub fn peek(&self, key: &QueryKey) -> Option<V> {
        self.inner.entries.get(key).and_then(|e| e.value.clone())
    }

    /// Status of the entry for `key`, if one exists.
    pub fn status(&self, key: &QueryKey) -> Option<EntryStatus> {
        self.inner.entries.get(key).map(|e| {
            if e.error.is_some() {
                EntryStatus::Errored
            } else if e.stale {
                EntryStatus::Stale
            } else {
                EntryStatus::Fresh
            }
        })
    }

    /// Subscribe to invalidation/reset notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.inner.events.subscribe()
    }

    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    fn fresh(&self, key: &QueryKey) -> Option<V> {
        self.inner
            .entries
            .get(key)
            .filter(|e| !e.stale)
            .and_then(|e| e.value.clone())
    }

    /// Either attach to the existing flight for `key` or become its leader.
    /// A flight issued before an invalidation of the entry is reported as
    /// superseded rather than joinable.
    fn join_or_lead(&self, key: &QueryKey, tags: &[Tag]) -> Role<V, E> {
        match self.inner.in_flight.entry(key.clone()) {
            Entry::Occupied(flight) => {
                let issued_gen = flight.get().inval_gen;
                let current_gen = self
                    .inner
                    .entries
                    .get(key)
                    .map(|e| e.inval_gen)
                    .unwrap_or(issued_gen);
                Role::Joined {
                    rx: flight.get().tx.subscribe(),
                    superseded: issued_gen != current_gen,
                }
            }
            Entry::Vacant(slot) => {
                let epoch = self.inner.epoch.load(Ordering::SeqCst);
                let (seq, inval_gen) = {
                    let mut entry = self
                        .inner
                        .entries
                        .entry(key.clone())
                        .or_insert_with(CacheEntry::new);
                    entry.tags = tags.to_vec();
                    entry.issued_seq += 1;
                    (entry.issued_seq, entry.inval_gen)
                };
                let (tx, _) = broadcast::channel(4);
                slot.insert(Flight {
                    epoch,
                    seq,
                    inval_gen,
                    tx,
                });
                Role::Leader(FlightGuard {
                    inner: Arc::clone(&self.inner),
                    key: key.clone(),
                    epoch,
                    seq,
                    inval_gen,
                    armed: true,
                })
            }
        }
    }
}

impl<V, E> CacheInner<V, E>
where
    V: Clone,
    E: Clone,
{
    /// Write a completion into the store, respecting the epoch and the
    /// per-key sequence ordering.
    fn apply(&self, guard: &FlightGuard<V, E>, outcome: &Result<V, E>) {
        if guard.epoch != self.epoch.load(Ordering::SeqCst) {
            debug!(key = %guard.key, "discarding completion issued before reset");
            return;
        }
        let Some(mut entry) = self.entries.get_mut(&guard.key) else {
            // Entry vanished between issue and resolution without an epoch
            // bump; do not resurrect it.
            debug!(key = %guard.key, "completion for dropped entry discarded");
            return;
        };
        if guard.seq < entry.applied_seq {
            debug!(key = %guard.key, seq = guard.seq, applied = entry.applied_seq,
                "stale completion discarded");
            return;
        }
        entry.applied_seq = guard.seq;
        match outcome {
            Ok(value) => {
                entry.value = Some(value.clone());
                entry.error = None;
                if guard.inval_gen == entry.inval_gen {
                    entry.stale = false;
                } else {
                    // Invalidated while the fetch was running; the value is
                    // recorded but the entry stays due for a refetch.
                    debug!(key = %guard.key, "entry invalidated mid-flight; kept stale");
                }
            }
            Err(error) => {
                // Keep the last good payload; report the failure as a
                // transient state a later query retries out of.
                warn!(key = %guard.key, seq = guard.seq, "fetch failed; entry kept");
                entry.error = Some(error.clone());
            }
        }
    }
}
