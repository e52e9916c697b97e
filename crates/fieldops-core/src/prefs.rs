// ── Column-visibility persistence ──
//
// One JSON object `{ "<column>": bool }` per page, at
// `<prefs_dir>/columns/<page-id>.json`.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use crate::error::CoreError;

/// Page-keyed store for column visibility maps.
#[async_trait]
pub trait ColumnStore: Send + Sync {
    /// Stored map for `page_id`, or an empty map if nothing was saved.
    async fn load(&self, page_id: &str) -> Result<BTreeMap<String, bool>, CoreError>;

    async fn save(&self, page_id: &str, columns: &BTreeMap<String, bool>) -> Result<(), CoreError>;
}

/// JSON files under a preferences directory.
#[derive(Debug, Clone)]
pub struct FileColumnStore {
    root: PathBuf,
}

impl FileColumnStore {
    pub fn new(prefs_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: prefs_dir.into(),
        }
    }

    pub fn path_for(&self, page_id: &str) -> PathBuf {
        self.root.join("columns").join(format!("{page_id}.json"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ColumnStore for FileColumnStore {
    async fn load(&self, page_id: &str) -> Result<BTreeMap<String, bool>, CoreError> {
        let path = self.path_for(page_id);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&raw).map_err(|e| CoreError::Preferences {
            message: format!("{}: {e}", path.display()),
        })
    }

    async fn save(&self, page_id: &str, columns: &BTreeMap<String, bool>) -> Result<(), CoreError> {
        let path = self.path_for(page_id);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let body = serde_json::to_string_pretty(columns).map_err(|e| CoreError::Preferences {
            message: e.to_string(),
        })?;
        tokio::fs::write(&path, body).await?;
        debug!(path = %path.display(), "saved column visibility");
        Ok(())
    }
}

/// In-process store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryColumnStore {
    pages: Mutex<HashMap<String, BTreeMap<String, bool>>>,
}

impl MemoryColumnStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a page as if it had been saved earlier.
    pub fn with_page(self, page_id: &str, columns: BTreeMap<String, bool>) -> Self {
        self.pages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(page_id.to_owned(), columns);
        self
    }

    pub fn get(&self, page_id: &str) -> Option<BTreeMap<String, bool>> {
        self.pages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(page_id)
            .cloned()
    }
}

#[async_trait]
impl ColumnStore for MemoryColumnStore {
    async fn load(&self, page_id: &str) -> Result<BTreeMap<String, bool>, CoreError> {
        Ok(self.get(page_id).unwrap_or_default())
    }

    async fn save(&self, page_id: &str, columns: &BTreeMap<String, bool>) -> Result<(), CoreError> {
        self.pages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(page_id.to_owned(), columns.clone());
        Ok(())
    }
}
