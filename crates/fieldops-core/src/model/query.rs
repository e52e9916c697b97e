use std::collections::BTreeMap;

use serde::Serialize;

use fieldops_api::ListParams;

/// Default rows per page.
pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// Filter values that mean "no filter" in every select box.
const FILTER_SENTINELS: &[&str] = &["all", "clear"];

/// The applied list query. Every field change triggers a fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListQuery {
    pub page: u32,
    pub page_size: u32,
    pub search: String,
    pub filters: BTreeMap<String, String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl ListQuery {
    /// Page 1, empty search, no filters.
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
            search: String::new(),
            filters: BTreeMap::new(),
        }
    }

    /// Whether `value` clears a filter instead of setting it.
    pub fn is_sentinel(value: &str) -> bool {
        let value = value.trim();
        value.is_empty() || FILTER_SENTINELS.iter().any(|s| s.eq_ignore_ascii_case(value))
    }

    /// Set or remove one filter. Returns `true` if the filter set changed.
    pub fn set_filter(&mut self, key: &str, value: &str) -> bool {
        if Self::is_sentinel(value) {
            self.filters.remove(key).is_some()
        } else {
            let value = value.trim();
            if self.filters.get(key).is_some_and(|v| v == value) {
                return false;
            }
            self.filters.insert(key.to_owned(), value.to_owned());
            true
        }
    }

    /// Wire parameters. Blank search is omitted.
    pub fn to_params(&self) -> ListParams {
        let search = self.search.trim();
        ListParams {
            page: self.page,
            limit: self.page_size,
            search: (!search.is_empty()).then(|| search.to_owned()),
            filters: self.filters.clone(),
        }
    }
}
