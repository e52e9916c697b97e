// Wire types shared by every collection endpoint.
//
// List responses: `{ "data": [...], "pagination": { page, pages, total, limit } }`
// Error bodies:   `{ "message": "..." }` (some handlers use `error` instead)

use std::collections::BTreeMap;

use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Server pagination state echoed alongside each page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub pages: u32,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub limit: u32,
}

/// One page of a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub pagination: Pagination,
}

/// Single-entity responses arrive either bare or wrapped in `{ data }`.
///
/// Only an object whose sole key is `data` counts as wrapped; a bare entity
/// that happens to carry a `data` field is kept whole.
#[derive(Debug)]
pub(crate) struct MaybeWrapped<T>(T);

impl<'de, T: DeserializeOwned> Deserialize<'de> for MaybeWrapped<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = match Value::deserialize(deserializer)? {
            Value::Object(mut map) if map.len() == 1 && map.contains_key("data") => {
                map.remove("data").unwrap_or_default()
            }
            other => other,
        };
        T::deserialize(value).map(Self).map_err(de::Error::custom)
    }
}

impl<T> MaybeWrapped<T> {
    pub(crate) fn into_inner(self) -> T {
        self.0
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    pub(crate) fn into_message(self) -> Option<String> {
        self.message
            .or(self.error)
            .filter(|m| !m.trim().is_empty())
    }
}

/// Query parameters for `GET /<collection>`.
///
/// Only non-empty fields end up on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListParams {
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub filters: BTreeMap<String, String>,
}

impl ListParams {
    /// Flatten into `(key, value)` pairs in a stable order:
    /// `page`, `limit`, `search`, then filters by key.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut out = Vec::with_capacity(3 + self.filters.len());
        if self.page > 0 {
            out.push(("page".to_owned(), self.page.to_string()));
        }
        if self.limit > 0 {
            out.push(("limit".to_owned(), self.limit.to_string()));
        }
        if let Some(search) = self.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                out.push(("search".to_owned(), search.to_owned()));
            }
        }
        for (key, value) in &self.filters {
            if !value.trim().is_empty() {
                out.push((key.clone(), value.clone()));
            }
        }
        out
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn query_skips_empty_fields() {
        let mut filters = BTreeMap::new();
        filters.insert("status".to_owned(), String::new());
        filters.insert("priority".to_owned(), "high".to_owned());
        let params = ListParams {
            page: 2,
            limit: 25,
            search: Some("   ".into()),
            filters,
        };

        assert_eq!(
            params.to_query(),
            vec![
                ("page".to_owned(), "2".to_owned()),
                ("limit".to_owned(), "25".to_owned()),
                ("priority".to_owned(), "high".to_owned()),
            ]
        );
    }

    #[test]
    fn page_envelope_tolerates_missing_pagination() {
        let page: Page<serde_json::Value> =
            serde_json::from_str(r#"{ "data": [{ "id": 1 }] }"#).unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.pagination, Pagination::default());
    }

    #[test]
    fn single_data_key_is_unwrapped() {
        let entity: MaybeWrapped<Value> =
            serde_json::from_str(r#"{ "data": { "id": 7, "name": "Pump" } }"#).unwrap();
        assert_eq!(entity.into_inner()["id"], 7);
    }

    #[test]
    fn bare_entity_with_data_field_is_kept_whole() {
        let raw = r#"{ "id": 7, "name": "Pump", "data": { "serial": "X1" } }"#;
        let entity: MaybeWrapped<Value> = serde_json::from_str(raw).unwrap();
        let entity = entity.into_inner();
        assert_eq!(entity["id"], 7);
        assert_eq!(entity["name"], "Pump");
        assert_eq!(entity["data"]["serial"], "X1");
    }

    #[test]
    fn error_body_prefers_message() {
        let body: ErrorBody =
            serde_json::from_str(r#"{ "message": "in use", "error": "conflict" }"#).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("in use"));

        let blank: ErrorBody = serde_json::from_str(r#"{ "message": "" }"#).unwrap();
        assert_eq!(blank.into_message(), None);
    }
}
