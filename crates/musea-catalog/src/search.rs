//! Pure in-memory search over a fetched artifact list

use crate::artifact::Artifact;

/// Result of applying a query to a list. Recomputed whole on every keystroke,
/// never patched incrementally.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchState {
    pub query: String,
    pub results: Vec<Artifact>,
    /// Distinguishes "no filter applied" from "filter applied, zero matches".
    /// Downstream renders the full list when this is false.
    pub is_searching: bool,
}

impl SearchState {
    /// The empty, not-searching state.
    pub fn idle() -> Self {
        Self {
            query: String::new(),
            results: Vec::new(),
            is_searching: false,
        }
    }
}

/// Case-insensitive substring match of the trimmed query against name or
/// description. A blank query means "not searching". Input order is
/// preserved; there is no tokenization or ranking.
pub fn search(items: &[Artifact], query: &str) -> SearchState {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return SearchState {
            query: query.to_string(),
            ..SearchState::idle()
        };
    }

    let results = items
        .iter()
        .filter(|a| {
            a.name.to_lowercase().contains(&needle)
                || a.description.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect();

    SearchState {
        query: query.to_string(),
        results,
        is_searching: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(name: &str, description: &str) -> Artifact {
        Artifact {
            id: name.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            image_url: String::new(),
            height: None,
            length: None,
            width: None,
            introduction_link: None,
            model_mobile_glb: None,
            model_pc_glb: None,
            model_target: None,
            model_ar: None,
            model_preview: None,
            file_3d: None,
            audio: None,
            video_site: None,
            video_guide: None,
            era: None,
            longitude: String::new(),
            latitude: String::new(),
            altitude: String::new(),
            sort_order: 0,
            index: 0,
            is_public: true,
            created: String::new(),
            modified: String::new(),
        }
    }

    #[test]
    fn blank_query_is_not_searching() {
        let items = vec![artifact("Duck Model", "sample")];
        let state = search(&items, "");
        assert!(!state.is_searching);
        assert!(state.results.is_empty());

        let state = search(&items, "   ");
        assert!(!state.is_searching, "whitespace-only query applies no filter");
    }

    #[test]
    fn no_match_is_searching_with_empty_results() {
        let items = vec![artifact("Duck Model", "sample")];
        let state = search(&items, "xyz-no-match");
        assert!(state.is_searching);
        assert!(state.results.is_empty());
    }

    #[test]
    fn matches_are_case_insensitive_over_both_fields() {
        let items = vec![
            artifact("Duck Model", "sample"),
            artifact("Bronze Drum", "a DUCK engraving"),
            artifact("Stone Stele", "inscription"),
        ];
        let state = search(&items, "duck");
        assert!(state.is_searching);
        assert_eq!(state.results.len(), 2);
        assert_eq!(state.results[0].name, "Duck Model", "input order preserved");
        assert_eq!(state.results[1].name, "Bronze Drum");
    }

    #[test]
    fn results_are_a_subset_of_input() {
        let items = vec![artifact("a", "x"), artifact("b", "y")];
        let state = search(&items, "a");
        assert!(state.results.iter().all(|r| items.contains(r)));
    }
}
