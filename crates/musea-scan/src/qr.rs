//! Artifact id extraction from scanned QR payloads
//!
//! Two shapes are accepted: a bare hyphenated UUID, or a URL whose last
//! path segment is one. Everything else is rejected before any network
//! traffic happens.

use url::Url;
use uuid::Uuid;

use crate::error::ScanError;

const HYPHENATED_LEN: usize = 36;

/// Accept only the canonical 8-4-4-4-12 form. [`Uuid::try_parse`] also
/// takes simple, braced and urn forms, which printed codes never use.
fn hyphenated_uuid(candidate: &str) -> Option<String> {
    if candidate.len() != HYPHENATED_LEN {
        return None;
    }
    Uuid::try_parse(candidate)
        .ok()
        .map(|uuid| uuid.as_hyphenated().to_string())
}

/// Pull the artifact id out of a scanned code. The returned id is
/// lowercased to its canonical form.
pub fn extract_artifact_id(raw: &str) -> Result<String, ScanError> {
    let trimmed = raw.trim();
    if let Some(id) = hyphenated_uuid(trimmed) {
        return Ok(id);
    }
    if let Ok(url) = Url::parse(trimmed) {
        let last_segment = url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back());
        if let Some(id) = last_segment.and_then(hyphenated_uuid) {
            return Ok(id);
        }
    }
    Err(ScanError::InvalidCode {
        code: trimmed.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_uuid_is_accepted() {
        let id = extract_artifact_id("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(id, "550e8400-e29b-41d4-a716-446655440000");
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let id = extract_artifact_id("  550e8400-e29b-41d4-a716-446655440000\n").unwrap();
        assert_eq!(id, "550e8400-e29b-41d4-a716-446655440000");
    }

    #[test]
    fn uppercase_uuid_normalizes_to_lowercase() {
        let id = extract_artifact_id("550E8400-E29B-41D4-A716-446655440000").unwrap();
        assert_eq!(id, "550e8400-e29b-41d4-a716-446655440000");
    }

    #[test]
    fn url_codes_yield_the_last_path_segment() {
        let id = extract_artifact_id(
            "https://museum.example/artifacts/550e8400-e29b-41d4-a716-446655440000",
        )
        .unwrap();
        assert_eq!(id, "550e8400-e29b-41d4-a716-446655440000");
    }

    #[test]
    fn url_trailing_slash_is_tolerated() {
        let id = extract_artifact_id(
            "https://museum.example/artifacts/550e8400-e29b-41d4-a716-446655440000/",
        )
        .unwrap();
        assert_eq!(id, "550e8400-e29b-41d4-a716-446655440000");
    }

    #[test]
    fn non_uuid_text_is_rejected() {
        assert!(matches!(
            extract_artifact_id("not-a-uuid"),
            Err(ScanError::InvalidCode { .. })
        ));
    }

    #[test]
    fn compact_uuid_form_is_rejected() {
        // printed codes always carry hyphens; the 32-char form is a
        // different product's code
        assert!(matches!(
            extract_artifact_id("550e8400e29b41d4a716446655440000"),
            Err(ScanError::InvalidCode { .. })
        ));
    }

    #[test]
    fn url_without_a_uuid_segment_is_rejected() {
        assert!(matches!(
            extract_artifact_id("https://museum.example/artifacts/latest"),
            Err(ScanError::InvalidCode { .. })
        ));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(
            extract_artifact_id("   "),
            Err(ScanError::InvalidCode { .. })
        ));
    }
}
