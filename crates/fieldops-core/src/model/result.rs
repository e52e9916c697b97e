use serde::Serialize;

use fieldops_api::Page;

use super::Entity;

/// One fetched page. Replaced wholesale by the next fetch.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ListResult {
    pub items: Vec<Entity>,
    pub total_count: u64,
    pub total_pages: u32,
    /// Page number the server says it returned.
    pub page: u32,
}

impl ListResult {
    /// Build from a wire page, truncating to `page_size` rows.
    ///
    /// Returns the result and the number of rows dropped.
    pub fn from_page(page: Page<Entity>, page_size: u32) -> (Self, usize) {
        let mut items = page.data;
        let limit = page_size as usize;
        let dropped = items.len().saturating_sub(limit);
        items.truncate(limit);

        let result = Self {
            items,
            total_count: page.pagination.total,
            total_pages: page.pagination.pages,
            page: page.pagination.page,
        };
        (result, dropped)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&Entity> {
        self.items.iter().find(|e| e.id().as_deref() == Some(id))
    }

    /// Ids that occur more than once on this page.
    pub fn duplicate_ids(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut dupes = Vec::new();
        for id in self.items.iter().filter_map(Entity::id) {
            if !seen.insert(id.clone()) && !dupes.contains(&id) {
                dupes.push(id);
            }
        }
        dupes
    }
}
