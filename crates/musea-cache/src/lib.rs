//! # Musea Cache
//!
//! Query cache layer for remote catalog data.
//!
//! The cache sits between screens and the remote data client and provides
//! the behavior screens rely on:
//!
//! - **Stable keys**: requests that mean the same thing share one cache
//!   entry. An identifier lookup collapses to `id-<value>` no matter how the
//!   surrounding request is shaped; everything else hashes structurally.
//! - **In-flight deduplication**: N concurrent [`QueryCache::query`] calls
//!   for one key issue exactly one underlying fetch — later callers attach
//!   to the pending result.
//! - **Tag invalidation**: entries carry tags; [`QueryCache::invalidate`]
//!   marks every entry under a tag stale so the next query refetches.
//! - **Full reset**: [`QueryCache::reset_all`] drops everything, including
//!   in-flight work. A fetch issued before a reset never writes its result
//!   into the store afterwards (guarded by a store epoch).
//! - **Last-write-wins**: completions carry a per-key sequence number and
//!   only the highest ever applies, making the wall-clock race an explicit
//!   invariant instead of an accident.
//!
//! A failed fetch never poisons an entry: the previous good value stays put,
//! the error goes to that round's callers, and any later query retries.

pub mod key;
pub mod store;

pub use key::{QueryKey, Tag};
pub use store::{CacheEvent, EntryStatus, QueryCache};
