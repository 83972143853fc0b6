//! AR target bundle files

use serde::{Deserialize, Serialize};

/// A compiled AR target bundle hosted alongside the catalog. The embedded
/// viewer downloads this file itself; the host only hands over the URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetFile {
    pub id: String,
    #[serde(rename = "ten")]
    pub name: String,
    #[serde(rename = "moTa")]
    pub description: Option<String>,
    #[serde(rename = "fileUrl")]
    pub file_url: String,
}
