//! Cache keys and invalidation tags

use std::fmt;

use musea_catalog::FilterRequest;

/// Derived string identifying one distinct request/response pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(String);

impl QueryKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Key for a fixed endpoint with no arguments.
    pub fn for_endpoint(name: &str) -> Self {
        Self(name.to_string())
    }

    /// Key for a single-resource lookup by identifier.
    pub fn for_id(id: &str) -> Self {
        Self(format!("id-{id}"))
    }

    /// Key for a filter request.
    ///
    /// A request carrying an `id` equality condition collapses to the same
    /// `id-<value>` key as a direct lookup, so repeated identifier lookups
    /// share one entry regardless of incidental request shape. Anything else
    /// keys on a structural hash of the whole request.
    pub fn for_filter(request: &FilterRequest) -> Self {
        if let Some(id) = request.id_condition() {
            return Self::for_id(id);
        }
        let canonical = match serde_json::to_string(request) {
            Ok(json) => json,
            Err(_) => format!("{request:?}"),
        };
        Self(format!("filter-{}", blake3::hash(canonical.as_bytes()).to_hex()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Label attached to cache entries enabling group invalidation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag(String);

impl Tag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Tag {
    fn from(tag: &str) -> Self {
        Self(tag.to_string())
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_filters_collapse_regardless_of_shape() {
        let a = QueryKey::for_filter(&FilterRequest::by_id("550e8400-e29b-41d4-a716-446655440000"));
        let mut other = FilterRequest::by_id("550e8400-e29b-41d4-a716-446655440000");
        other.page_info.page_size = 50;
        other.sorts.clear();
        let b = QueryKey::for_filter(&other);
        assert_eq!(a, b, "incidental request differences must not split the key");
        assert_eq!(a.as_str(), "id-550e8400-e29b-41d4-a716-446655440000");
    }

    #[test]
    fn non_id_filters_key_structurally() {
        let mut req = FilterRequest::by_id("x");
        req.filters[0].field = "tenHienVat3D".to_string();
        let a = QueryKey::for_filter(&req);
        assert!(a.as_str().starts_with("filter-"));
        assert_eq!(a, QueryKey::for_filter(&req.clone()), "hash is deterministic");

        let mut changed = req.clone();
        changed.page_info.page = 2;
        assert_ne!(a, QueryKey::for_filter(&changed));
    }

    #[test]
    fn collapsed_key_matches_direct_lookup() {
        assert_eq!(
            QueryKey::for_filter(&FilterRequest::by_id("abc")),
            QueryKey::for_id("abc")
        );
    }
}
