// ── Column visibility ──
//
// Ordered map over the page's declared columns. Keys outside the declared
// set never enter the map, so persisted state can't grow stale columns.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::Serialize;

use super::{ColumnDef, PageSpec};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnVisibility {
    visible: IndexMap<&'static str, bool>,
}

impl ColumnVisibility {
    /// The page's default visibility.
    pub fn defaults(spec: &PageSpec) -> Self {
        Self {
            visible: spec
                .columns
                .iter()
                .map(|c| (c.key, c.default_visible))
                .collect(),
        }
    }

    /// Defaults overlaid with persisted values. Unknown keys are dropped.
    pub fn with_persisted(spec: &PageSpec, persisted: &BTreeMap<String, bool>) -> Self {
        let mut columns = Self::defaults(spec);
        for (key, value) in persisted {
            if let Some(slot) = columns.visible.get_mut(key.as_str()) {
                *slot = *value;
            } else {
                tracing::debug!(page = spec.id, key, "ignoring unknown persisted column");
            }
        }
        columns
    }

    pub fn is_visible(&self, key: &str) -> bool {
        self.visible.get(key).copied().unwrap_or(false)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.visible.contains_key(key)
    }

    /// Flip one column. Returns `false` for undeclared keys.
    pub fn toggle(&mut self, key: &str) -> bool {
        match self.visible.get_mut(key) {
            Some(v) => {
                *v = !*v;
                true
            }
            None => false,
        }
    }

    pub fn set_all(&mut self, visible: bool) {
        for v in self.visible.values_mut() {
            *v = visible;
        }
    }

    pub fn reset(&mut self, spec: &PageSpec) {
        *self = Self::defaults(spec);
    }

    /// Declared columns that are currently visible, in declaration order.
    pub fn visible_columns<'a>(&self, spec: &'a PageSpec) -> Vec<&'a ColumnDef> {
        spec.columns
            .iter()
            .filter(|c| self.is_visible(c.key))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, bool)> + '_ {
        self.visible.iter().map(|(k, v)| (*k, *v))
    }

    /// Persistable form.
    pub fn to_map(&self) -> BTreeMap<String, bool> {
        self.iter().map(|(k, v)| (k.to_owned(), v)).collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::catalog::WORK_ORDERS;

    #[test]
    fn double_toggle_restores_state() {
        let original = ColumnVisibility::defaults(&WORK_ORDERS);
        let mut columns = original.clone();
        assert!(columns.toggle("priority"));
        assert!(!columns.is_visible("priority"));
        assert!(columns.toggle("priority"));
        assert_eq!(columns, original);
    }

    #[test]
    fn undeclared_keys_are_ignored() {
        let mut columns = ColumnVisibility::defaults(&WORK_ORDERS);
        assert!(!columns.toggle("favourite_colour"));
        assert!(!columns.contains("favourite_colour"));
    }

    #[test]
    fn persisted_values_overlay_defaults() {
        let mut persisted = BTreeMap::new();
        persisted.insert("priority".to_owned(), false);
        persisted.insert("created_at".to_owned(), true);
        persisted.insert("legacy_field".to_owned(), true);

        let columns = ColumnVisibility::with_persisted(&WORK_ORDERS, &persisted);
        assert!(!columns.is_visible("priority"));
        assert!(columns.is_visible("created_at"));
        assert!(columns.is_visible("title"));
        assert!(!columns.to_map().contains_key("legacy_field"));
    }

    #[test]
    fn visible_columns_keep_declaration_order() {
        let mut columns = ColumnVisibility::defaults(&WORK_ORDERS);
        columns.set_all(false);
        columns.toggle("due_date");
        columns.toggle("number");
        let keys: Vec<_> = columns
            .visible_columns(&WORK_ORDERS)
            .iter()
            .map(|c| c.key)
            .collect();
        assert_eq!(keys, vec!["number", "due_date"]);
    }
}
