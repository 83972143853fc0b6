//! Error types for the scan flow

use musea_api::SharedApiError;
use thiserror::Error;

pub type ScanResult<T> = Result<T, ScanError>;

#[derive(Debug, Error)]
pub enum ScanError {
    /// The code is not an artifact id and not a URL ending in one.
    #[error("code does not contain an artifact id: {code:?}")]
    InvalidCode { code: String },

    /// The id was well-formed but the catalog has no matching record, even
    /// after the grace re-query.
    #[error("no artifact matches the scanned id")]
    NotFound,

    /// The scan surface lost focus before resolution finished.
    #[error("scan session dismissed")]
    Dismissed,

    #[error(transparent)]
    Query(#[from] SharedApiError),
}
