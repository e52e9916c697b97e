// Shared fixtures for fieldops-core integration tests.
#![allow(dead_code, clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::mpsc;

use fieldops_core::{
    CoreError, DataSource, Entity, ListContext, ListController, ListOptions, ListQuery,
    MemoryColumnStore, Notification, Page, PageSpec, Pagination,
};

/// In-memory collection that pages, searches, and filters like the API,
/// and records every call it receives.
#[derive(Default)]
pub struct FakeSource {
    rows: Mutex<Vec<Entity>>,
    pub list_calls: Mutex<Vec<ListQuery>>,
    pub delete_calls: Mutex<Vec<String>>,
    pub update_calls: Mutex<Vec<(String, Value)>>,
    pub create_calls: Mutex<Vec<Value>>,
    /// Per-search-term response delay.
    delays: Mutex<HashMap<String, Duration>>,
    pub fail_lists: AtomicBool,
    pub fail_writes: AtomicBool,
    /// Extra rows appended to every page regardless of limit.
    pub overflow: AtomicBool,
}

impl FakeSource {
    pub fn new(rows: Vec<Value>) -> Arc<Self> {
        Arc::new(Self {
            rows: Mutex::new(
                rows.into_iter()
                    .map(|v| Entity::try_from(v).unwrap())
                    .collect(),
            ),
            ..Self::default()
        })
    }

    /// `count` work orders with ids 1..=count, alternating open/completed.
    pub fn work_orders(count: u32) -> Arc<Self> {
        Self::new(
            (1..=count)
                .map(|i| {
                    json!({
                        "id": i,
                        "number": format!("WO-{i:03}"),
                        "title": if i % 5 == 0 { format!("Acme pump {i}") } else { format!("Service {i}") },
                        "status": if i % 2 == 0 { "completed" } else { "open" },
                        "customer": { "name": "Acme Oy" }
                    })
                })
                .collect(),
        )
    }

    pub fn delay_search(&self, term: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(term.to_owned(), delay);
    }

    pub fn list_count(&self) -> usize {
        self.list_calls.lock().unwrap().len()
    }

    pub fn last_query(&self) -> ListQuery {
        self.list_calls.lock().unwrap().last().cloned().unwrap()
    }

    fn matches(entity: &Entity, query: &ListQuery) -> bool {
        let search = query.search.to_lowercase();
        let hit = search.is_empty()
            || entity.display("title").to_lowercase().contains(&search)
            || entity.display("name").to_lowercase().contains(&search);
        hit && query
            .filters
            .iter()
            .all(|(k, v)| entity.display(k).eq_ignore_ascii_case(v))
    }
}

#[async_trait]
impl DataSource for FakeSource {
    async fn list(&self, query: &ListQuery) -> Result<Page<Entity>, CoreError> {
        self.list_calls.lock().unwrap().push(query.clone());
        let delay = self.delays.lock().unwrap().get(&query.search).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(CoreError::ConnectionFailed {
                reason: "connection refused".into(),
            });
        }

        let rows: Vec<Entity> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|e| Self::matches(e, query))
            .cloned()
            .collect();
        let total = rows.len();
        let limit = query.page_size as usize;
        let pages = total.div_ceil(limit);
        let start = (query.page as usize - 1) * limit;
        let mut data: Vec<Entity> = rows.into_iter().skip(start).take(limit).collect();
        if self.overflow.load(Ordering::SeqCst) {
            data.extend(data.clone());
        }

        Ok(Page {
            data,
            pagination: Pagination {
                page: query.page,
                pages: u32::try_from(pages).unwrap(),
                total: total as u64,
                limit: query.page_size,
            },
        })
    }

    async fn get(&self, id: &str) -> Result<Entity, CoreError> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.id().as_deref() == Some(id))
            .cloned()
            .ok_or_else(|| CoreError::NotFound {
                entity_type: "record".into(),
                identifier: id.to_owned(),
            })
    }

    async fn create(&self, body: &Value) -> Result<Entity, CoreError> {
        self.create_calls.lock().unwrap().push(body.clone());
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(api_error("Duplicate customer"));
        }
        let mut rows = self.rows.lock().unwrap();
        let mut value = body.clone();
        value["id"] = json!(rows.len() + 1);
        let entity = Entity::try_from(value).unwrap();
        rows.push(entity.clone());
        Ok(entity)
    }

    async fn update(&self, id: &str, body: &Value) -> Result<Entity, CoreError> {
        self.update_calls
            .lock()
            .unwrap()
            .push((id.to_owned(), body.clone()));
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(api_error("Stage change rejected"));
        }
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows.iter_mut().find(|e| e.id().as_deref() == Some(id)) else {
            return Err(CoreError::NotFound {
                entity_type: "record".into(),
                identifier: id.to_owned(),
            });
        };
        let mut value = row.clone().into_value();
        if let (Some(target), Some(patch)) = (value.as_object_mut(), body.as_object()) {
            for (k, v) in patch {
                target.insert(k.clone(), v.clone());
            }
        }
        *row = Entity::try_from(value).unwrap();
        Ok(row.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), CoreError> {
        self.delete_calls.lock().unwrap().push(id.to_owned());
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(api_error("Work order has open invoices"));
        }
        self.rows
            .lock()
            .unwrap()
            .retain(|e| e.id().as_deref() != Some(id));
        Ok(())
    }
}

fn api_error(message: &str) -> CoreError {
    CoreError::Api {
        message: message.to_owned(),
        status: Some(409),
        from_server: true,
    }
}

pub struct Harness {
    pub controller: ListController,
    pub source: Arc<FakeSource>,
    pub store: Arc<MemoryColumnStore>,
    pub toasts: mpsc::UnboundedReceiver<Notification>,
}

impl Harness {
    pub fn drain_toasts(&mut self) -> Vec<Notification> {
        let mut out = Vec::new();
        while let Ok(n) = self.toasts.try_recv() {
            out.push(n);
        }
        out
    }
}

pub fn harness(
    spec: &'static PageSpec,
    source: Arc<FakeSource>,
    store: MemoryColumnStore,
    options: ListOptions,
) -> Harness {
    let store = Arc::new(store);
    let (tx, toasts) = mpsc::unbounded_channel();
    let ctx = ListContext {
        source: source.clone(),
        columns: store.clone(),
        notifier: Some(tx),
    };
    Harness {
        controller: ListController::new(spec, ctx, options),
        source,
        store,
        toasts,
    }
}

pub fn options(page_size: u32) -> ListOptions {
    ListOptions {
        page_size,
        ..ListOptions::default()
    }
}
