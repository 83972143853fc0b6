//! # Musea Catalog
//!
//! Domain model for the heritage catalog client.
//!
//! This crate holds the wire types shared by every other layer:
//!
//! - [`Artifact`]: a catalog entry as the upstream API serves it. Field names
//!   on the wire follow the upstream schema exactly; the Rust side uses
//!   idiomatic names via serde renames. Artifacts are immutable once fetched.
//! - [`TargetFile`]: an AR target bundle consumed by the embedded viewer.
//! - [`Envelope`]: the standard `{success, data, error, ...}` wrapper around
//!   every API payload, with [`Envelope::into_result`] normalization.
//! - [`FilterRequest`]: the structured filter/sort/pagination request body.
//! - [`search`]: the pure in-memory search engine over a fetched list.
//!
//! Nothing here performs I/O.

pub mod artifact;
pub mod envelope;
pub mod filter;
pub mod search;
pub mod target;

pub use artifact::{Artifact, dedup_by_model};
pub use envelope::{Envelope, RejectedEnvelope};
pub use filter::{FilterCondition, FilterRequest, PageInfo, SortDirective};
pub use search::{SearchState, search};
pub use target::TargetFile;
