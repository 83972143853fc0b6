//! Structured filter/sort/pagination request body

use serde::{Deserialize, Serialize};

/// One condition in a filter request. Conditions may nest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    #[serde(rename = "valueIsField")]
    pub value_is_field: bool,
    /// Nested sub-conditions.
    pub filters: Vec<FilterCondition>,
    #[serde(rename = "stringCompareOption")]
    pub string_compare_option: i32,
    pub field: String,
    pub operator: String,
    pub value: String,
}

/// Sort directive: `dir` is 1 for ascending, -1 for descending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortDirective {
    pub field: String,
    pub dir: i8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub page: u32,
    #[serde(rename = "pageSize")]
    pub page_size: u32,
}

/// Filter request body for the catalog's POST filter endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterRequest {
    pub filters: Vec<FilterCondition>,
    pub sorts: Vec<SortDirective>,
    pub includes: Vec<String>,
    #[serde(rename = "pageInfo")]
    pub page_info: PageInfo,
}

impl FilterRequest {
    /// The exact lookup request a scanned identifier produces: equality on
    /// `id` (value JSON-quoted, as the backend expects), sorted by display
    /// order, first page of one.
    pub fn by_id(id: &str) -> Self {
        Self {
            filters: vec![FilterCondition {
                value_is_field: false,
                filters: Vec::new(),
                string_compare_option: 0,
                field: "id".to_string(),
                operator: "eq".to_string(),
                value: format!("\"{id}\""),
            }],
            sorts: vec![SortDirective {
                field: "thuTu".to_string(),
                dir: 1,
            }],
            includes: Vec::new(),
            page_info: PageInfo {
                page: 1,
                page_size: 1,
            },
        }
    }

    /// The value of the first top-level `id` equality condition, with any
    /// surrounding JSON quotes stripped. Used to collapse cache keys.
    pub fn id_condition(&self) -> Option<&str> {
        self.filters
            .iter()
            .find(|c| c.field == "id")
            .map(|c| c.value.trim().trim_matches('"'))
            .filter(|v| !v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn by_id_builds_the_lookup_shape() {
        let req = FilterRequest::by_id("abc");
        assert_eq!(req.filters.len(), 1);
        assert_eq!(req.filters[0].value, "\"abc\"");
        assert_eq!(req.sorts[0].field, "thuTu");
        assert_eq!(req.page_info.page_size, 1);
        assert_eq!(req.id_condition(), Some("abc"));
    }

    #[test]
    fn id_condition_absent_for_other_fields() {
        let mut req = FilterRequest::by_id("abc");
        req.filters[0].field = "tenHienVat3D".to_string();
        assert_eq!(req.id_condition(), None);
    }

    #[test]
    fn wire_shape_matches_backend() {
        let json = serde_json::to_value(FilterRequest::by_id("x")).unwrap();
        assert!(json.get("pageInfo").is_some());
        assert!(json["filters"][0].get("valueIsField").is_some());
        assert!(json["filters"][0].get("stringCompareOption").is_some());
    }
}
