//! # Musea Scan
//!
//! QR scanning support: pulling an artifact id out of a scanned code
//! ([`extract_artifact_id`]) and resolving it against the cached catalog
//! ([`ScanResolver`]). The resolver owns the session rules: open resets the
//! caches, every lookup invalidates first, a miss gets one grace re-query,
//! and losing focus dismisses whatever is in flight.

pub mod error;
pub mod qr;
pub mod resolver;

pub use error::{ScanError, ScanResult};
pub use qr::extract_artifact_id;
pub use resolver::{ScanPolicy, ScanResolver};
