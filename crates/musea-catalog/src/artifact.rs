//! The catalog artifact as served by the upstream API

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A cultural-heritage artifact.
///
/// Wire field names follow the upstream schema; physical dimensions arrive as
/// strings and are kept that way (the client never computes with them).
/// Instances are immutable once fetched — the cache layer owns the source of
/// truth for a given query key, screens hold transient clones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    /// String UUID identifier.
    pub id: String,
    /// Display name.
    #[serde(rename = "tenHienVat3D")]
    pub name: String,
    /// Description / introduction text.
    #[serde(rename = "gioiThieu")]
    pub description: String,
    /// Cover image URL.
    #[serde(rename = "anh")]
    pub image_url: String,
    #[serde(rename = "chieuCao")]
    pub height: Option<String>,
    #[serde(rename = "chieuDai")]
    pub length: Option<String>,
    #[serde(rename = "chieuRong")]
    pub width: Option<String>,
    /// External introduction link, if any.
    #[serde(rename = "introductionLink")]
    pub introduction_link: Option<String>,
    /// 3D model URL, mobile variant.
    #[serde(rename = "model3dMobileGlb")]
    pub model_mobile_glb: Option<String>,
    /// 3D model URL, desktop variant.
    #[serde(rename = "model3dPcGlb")]
    pub model_pc_glb: Option<String>,
    /// AR marker model reference.
    #[serde(rename = "modelMindAR")]
    pub model_target: Option<String>,
    #[serde(rename = "modelAR")]
    pub model_ar: Option<String>,
    /// Model preview identifier. This is the dedup key for the embedded
    /// viewer: two artifacts sharing a non-empty preview render identically.
    #[serde(rename = "model3dPcJpg")]
    pub model_preview: Option<String>,
    #[serde(rename = "file3D")]
    pub file_3d: Option<String>,
    pub audio: Option<String>,
    #[serde(rename = "videoDiTich")]
    pub video_site: Option<String>,
    #[serde(rename = "videoHdv")]
    pub video_guide: Option<String>,
    /// Era / period label.
    #[serde(rename = "thoiGian")]
    pub era: Option<String>,
    #[serde(rename = "kinhDo")]
    pub longitude: String,
    #[serde(rename = "viDo")]
    pub latitude: String,
    #[serde(rename = "caoDo")]
    pub altitude: String,
    /// Display sort order.
    #[serde(rename = "thuTu")]
    pub sort_order: i64,
    /// Row index.
    #[serde(rename = "stt")]
    pub index: i64,
    #[serde(rename = "isPublic")]
    pub is_public: bool,
    pub created: String,
    pub modified: String,
}

impl Artifact {
    /// The trimmed model preview identifier, or `None` when absent or blank.
    pub fn model_key(&self) -> Option<&str> {
        self.model_preview
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

/// Collapse artifacts sharing an identical non-empty model identifier to the
/// first occurrence. Artifacts without a usable model identifier cannot be
/// deduplicated safely and are always kept. Input order is preserved.
pub fn dedup_by_model(artifacts: &[Artifact]) -> Vec<Artifact> {
    let mut seen: HashSet<String> = HashSet::new();
    artifacts
        .iter()
        .filter(|artifact| match artifact.model_key() {
            None => true,
            Some(key) => seen.insert(key.to_string()),
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(id: &str, preview: Option<&str>) -> Artifact {
        Artifact {
            id: id.to_string(),
            name: format!("artifact {id}"),
            description: String::new(),
            image_url: String::new(),
            height: None,
            length: None,
            width: None,
            introduction_link: None,
            model_mobile_glb: None,
            model_pc_glb: None,
            model_target: None,
            model_ar: None,
            model_preview: preview.map(str::to_string),
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
    fn dedup_collapses_identical_previews() {
        let items = vec![
            artifact("a", Some("duck.jpg")),
            artifact("b", Some("duck.jpg")),
            artifact("c", Some("vase.jpg")),
        ];
        let kept = dedup_by_model(&items);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].id, "a", "first occurrence wins");
        assert_eq!(kept[1].id, "c");
    }

    #[test]
    fn dedup_keeps_all_blank_previews() {
        let items = vec![
            artifact("a", None),
            artifact("b", Some("")),
            artifact("c", Some("   ")),
        ];
        assert_eq!(dedup_by_model(&items).len(), 3, "blank keys are not dedup candidates");
    }

    #[test]
    fn wire_names_round_trip() {
        let a = artifact("x", Some("p.jpg"));
        let json = serde_json::to_value(&a).unwrap();
        assert!(json.get("tenHienVat3D").is_some());
        assert!(json.get("gioiThieu").is_some());
        assert!(json.get("model3dPcJpg").is_some());
        assert!(json.get("thuTu").is_some());
        let back: Artifact = serde_json::from_value(json).unwrap();
        assert_eq!(back, a);
    }
}
