// ── Entity list controller ──
//
// Owns the query, the last fetched page, column visibility, and the dialog
// slot for one list page. State lives in a `watch` channel: the TUI
// subscribes, the CLI takes snapshots. Every query change runs a fetch
// tagged with a sequence ticket; only the latest ticket may apply its
// response.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::form;
use crate::model::{
    ColumnDef, ColumnVisibility, DEFAULT_PAGE_SIZE, Entity, ListQuery, ListResult, PageSpec,
};
use crate::notify::{Notification, NotificationSink};
use crate::prefs::ColumnStore;
use crate::source::DataSource;

/// Default live-search debounce.
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

// ── Configuration ────────────────────────────────────────────────────

/// Injected collaborators.
#[derive(Clone)]
pub struct ListContext {
    pub source: Arc<dyn DataSource>,
    pub columns: Arc<dyn ColumnStore>,
    pub notifier: Option<NotificationSink>,
}

/// Per-controller tuning.
#[derive(Debug, Clone)]
pub struct ListOptions {
    pub page_size: u32,
    /// Apply search text after `search_debounce` of idle typing.
    pub live_search: bool,
    pub search_debounce: Duration,
    /// Persist column changes in the background as they happen. One-shot
    /// callers turn this off and call [`ListController::save_columns`].
    pub autosave_columns: bool,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            live_search: false,
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
            autosave_columns: true,
        }
    }
}

// ── View state ───────────────────────────────────────────────────────

/// The single modal slot. At most one dialog is open at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Dialog {
    ConfirmDelete { id: String, label: String },
    Locked { id: String, status: String, message: String },
}

/// Everything a renderer needs for one list page.
#[derive(Debug, Clone, Serialize)]
pub struct ListState {
    #[serde(skip)]
    pub spec: &'static PageSpec,
    /// Current query. The latest fetch ran (or is running) against this.
    pub query: ListQuery,
    /// Query behind `result`; `None` until a fetch succeeds.
    pub applied: Option<ListQuery>,
    /// Search box text not yet applied.
    pub pending_search: String,
    pub result: ListResult,
    pub is_loading: bool,
    pub error: Option<String>,
    pub dialog: Option<Dialog>,
    pub columns: ColumnVisibility,
    pub last_fetched_at: Option<DateTime<Utc>>,
}

impl ListState {
    fn new(spec: &'static PageSpec, page_size: u32) -> Self {
        Self {
            spec,
            query: ListQuery::new(page_size),
            applied: None,
            pending_search: String::new(),
            result: ListResult::default(),
            is_loading: false,
            error: None,
            dialog: None,
            columns: ColumnVisibility::defaults(spec),
            last_fetched_at: None,
        }
    }

    pub fn visible_columns(&self) -> Vec<&'static ColumnDef> {
        self.columns.visible_columns(self.spec)
    }

    pub fn has_prev_page(&self) -> bool {
        self.query.page > 1
    }

    pub fn has_next_page(&self) -> bool {
        self.query.page < self.result.total_pages
    }
}

/// What a fetch did.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The response was applied.
    Loaded { items: usize, total_count: u64, page: u32 },
    /// A newer fetch was issued while this one was in flight.
    Stale,
    /// The query did not change; nothing was fetched.
    Skipped,
    /// The request failed. The previous page is still shown.
    Failed(CoreError),
}

impl FetchOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }

    /// Turn a failure into an error for callers that need one.
    pub fn into_result(self) -> Result<Self, CoreError> {
        match self {
            Self::Failed(e) => Err(e),
            other => Ok(other),
        }
    }
}

/// Result of the first step of a delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteGate {
    /// `ConfirmDelete` is open.
    Confirm { label: String },
    /// The entity's status forbids deletion; `Locked` is open.
    Locked { status: String, message: String },
}

// ── Controller ───────────────────────────────────────────────────────

struct Inner {
    spec: &'static PageSpec,
    ctx: ListContext,
    options: ListOptions,
    state: watch::Sender<ListState>,
    fetch_seq: AtomicU64,
    search_generation: AtomicU64,
}

/// Cheap-to-clone handle over one list page.
#[derive(Clone)]
pub struct ListController {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ListController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListController")
            .field("page", &self.inner.spec.id)
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}

impl ListController {
    /// Build a controller with default state. Nothing is fetched until
    /// [`mount`](Self::mount).
    pub fn new(spec: &'static PageSpec, ctx: ListContext, options: ListOptions) -> Self {
        let state = watch::Sender::new(ListState::new(spec, options.page_size));
        Self {
            inner: Arc::new(Inner {
                spec,
                ctx,
                options,
                state,
                fetch_seq: AtomicU64::new(0),
                search_generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn spec(&self) -> &'static PageSpec {
        self.inner.spec
    }

    // ── Observation ──────────────────────────────────────────────────

    pub fn subscribe(&self) -> watch::Receiver<ListState> {
        self.inner.state.subscribe()
    }

    pub fn snapshot(&self) -> ListState {
        self.inner.state.borrow().clone()
    }

    pub fn visible_columns(&self) -> Vec<&'static ColumnDef> {
        self.inner.state.borrow().visible_columns()
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Load persisted columns, reset to page 1, and fetch.
    pub async fn mount(&self) -> FetchOutcome {
        let query = ListQuery::new(self.inner.options.page_size);
        self.mount_inner(query).await
    }

    /// Like [`mount`](Self::mount) but starting from `query`.
    pub async fn mount_with_query(&self, query: ListQuery) -> Result<FetchOutcome, CoreError> {
        for key in query.filters.keys() {
            self.check_filter(key)?;
        }
        Ok(self.mount_inner(query).await)
    }

    async fn mount_inner(&self, mut query: ListQuery) -> FetchOutcome {
        self.load_columns().await;
        query.page = query.page.max(1);
        query.page_size = query.page_size.max(1);

        info!(page = self.inner.spec.id, "mounting list");
        let mut pending = None;
        self.inner.state.send_modify(|s| {
            s.pending_search.clone_from(&query.search);
            s.query = query;
            s.dialog = None;
            s.error = None;
            pending = Some(self.begin_fetch(s));
        });
        self.run_pending(pending).await
    }

    /// Replace column visibility with the persisted state. Unreadable
    /// preferences fall back to the page defaults.
    pub async fn load_columns(&self) {
        let spec = self.inner.spec;
        let columns = match self.inner.ctx.columns.load(spec.id).await {
            Ok(persisted) => ColumnVisibility::with_persisted(spec, &persisted),
            Err(e) => {
                warn!(page = spec.id, error = %e, "could not load column preferences");
                ColumnVisibility::defaults(spec)
            }
        };
        self.inner.state.send_modify(|s| s.columns = columns);
    }

    // ── Fetching ─────────────────────────────────────────────────────

    /// Fetch the current query.
    pub async fn fetch(&self) -> FetchOutcome {
        let mut pending = None;
        self.inner
            .state
            .send_modify(|s| pending = Some(self.begin_fetch(s)));
        self.run_pending(pending).await
    }

    /// Issue a ticket for the current query. Called inside the state lock
    /// together with the query change, so ticket order matches query order.
    fn begin_fetch(&self, s: &mut ListState) -> (u64, ListQuery) {
        let ticket = self.inner.fetch_seq.fetch_add(1, Ordering::SeqCst) + 1;
        s.is_loading = true;
        (ticket, s.query.clone())
    }

    async fn run_pending(&self, pending: Option<(u64, ListQuery)>) -> FetchOutcome {
        match pending {
            Some((ticket, query)) => self.run_fetch(ticket, query).await,
            None => FetchOutcome::Skipped,
        }
    }

    async fn run_fetch(&self, ticket: u64, query: ListQuery) -> FetchOutcome {
        let spec = self.inner.spec;
        debug!(page = spec.id, ticket, query = ?query, "fetching");

        let response = self.inner.ctx.source.list(&query).await;

        let mut outcome = FetchOutcome::Stale;
        let mut toast = None;
        self.inner.state.send_if_modified(|s| {
            if self.inner.fetch_seq.load(Ordering::SeqCst) != ticket {
                return false;
            }
            s.is_loading = false;
            match response {
                Ok(page) => {
                    let (result, dropped) = ListResult::from_page(page, query.page_size);
                    if dropped > 0 {
                        warn!(page = spec.id, dropped, "server returned more rows than requested");
                    }
                    let dupes = result.duplicate_ids();
                    if !dupes.is_empty() {
                        warn!(page = spec.id, ids = ?dupes, "duplicate ids in page");
                    }
                    if result.page > 0 {
                        s.query.page = result.page;
                    }
                    outcome = FetchOutcome::Loaded {
                        items: result.items.len(),
                        total_count: result.total_count,
                        page: s.query.page,
                    };
                    s.result = result;
                    s.applied = Some(s.query.clone());
                    s.error = None;
                    s.last_fetched_at = Some(Utc::now());
                }
                Err(e) => {
                    warn!(page = spec.id, error = %e, "fetch failed");
                    // The shown rows still belong to the last applied query.
                    if let Some(ref applied) = s.applied {
                        s.query.clone_from(applied);
                    }
                    let message = e.user_message(&format!("Failed to load {}", spec.title));
                    s.error = Some(message.clone());
                    toast = Some(message);
                    outcome = FetchOutcome::Failed(e);
                }
            }
            true
        });

        if matches!(outcome, FetchOutcome::Stale) {
            debug!(page = spec.id, ticket, "discarding stale response");
        }
        if let Some(message) = toast {
            self.notify(Notification::error(message));
        }
        outcome
    }

    /// Re-run the current query.
    pub async fn refresh(&self) -> FetchOutcome {
        self.fetch().await
    }

    /// Apply `change` to the query and start a fetch in the same step.
    /// Skipped when the change is a no-op and the query is already the
    /// one behind the shown rows.
    async fn update_query(&self, change: impl FnOnce(&mut ListQuery) -> bool) -> FetchOutcome {
        let mut pending = None;
        self.inner.state.send_if_modified(|s| {
            let changed = change(&mut s.query);
            if !changed && s.applied.as_ref() == Some(&s.query) {
                return false;
            }
            pending = Some(self.begin_fetch(s));
            true
        });
        self.run_pending(pending).await
    }

    // ── Search ───────────────────────────────────────────────────────

    /// Update the search box. Applied on submit, or after the debounce in
    /// live-search mode.
    pub fn set_search_term(&self, term: impl Into<String>) {
        let term = term.into();
        self.inner
            .state
            .send_modify(|s| s.pending_search.clone_from(&term));

        let generation = self.inner.search_generation.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.inner.options.live_search {
            return;
        }

        let this = self.clone();
        let delay = self.inner.options.search_debounce;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if this.inner.search_generation.load(Ordering::SeqCst) == generation {
                this.apply_search(false).await;
            }
        });
    }

    /// Apply the pending search now and go to page 1.
    pub async fn submit_search(&self) -> FetchOutcome {
        // Cancel any pending debounce timer.
        self.inner.search_generation.fetch_add(1, Ordering::SeqCst);
        self.apply_search(true).await
    }

    async fn apply_search(&self, force: bool) -> FetchOutcome {
        let mut pending = None;
        self.inner.state.send_if_modified(|s| {
            let search = s.pending_search.trim().to_owned();
            let changed = search != s.query.search || s.query.page != 1;
            s.query.search = search;
            s.query.page = 1;
            if !changed && !force && s.applied.as_ref() == Some(&s.query) {
                return false;
            }
            pending = Some(self.begin_fetch(s));
            true
        });
        self.run_pending(pending).await
    }

    // ── Filters ──────────────────────────────────────────────────────

    fn check_filter(&self, key: &str) -> Result<(), CoreError> {
        if self.inner.spec.filter(key).is_some() {
            Ok(())
        } else {
            Err(CoreError::UnknownFilter {
                page: self.inner.spec.id.to_owned(),
                key: key.to_owned(),
            })
        }
    }

    /// Set one filter. `all`, `clear`, and blank values remove it.
    pub async fn set_filter(&self, key: &str, value: &str) -> Result<FetchOutcome, CoreError> {
        self.check_filter(key)?;
        Ok(self
            .update_query(|q| {
                let changed = q.set_filter(key, value) || q.page != 1;
                q.page = 1;
                changed
            })
            .await)
    }

    pub async fn clear_filters(&self) -> FetchOutcome {
        self.update_query(|q| {
            let changed = !q.filters.is_empty() || q.page != 1;
            q.filters.clear();
            q.page = 1;
            changed
        })
        .await
    }

    // ── Pagination ───────────────────────────────────────────────────

    /// Go to page `n`. Out-of-range pages and the current page are skipped.
    pub async fn set_page(&self, n: u32) -> FetchOutcome {
        let total_pages = self.inner.state.borrow().result.total_pages;
        if n == 0 || n > total_pages {
            debug!(page = self.inner.spec.id, requested = n, total_pages, "page out of range");
            return FetchOutcome::Skipped;
        }
        self.update_query(|q| {
            let changed = q.page != n;
            q.page = n;
            changed
        })
        .await
    }

    pub async fn next_page(&self) -> FetchOutcome {
        let page = self.inner.state.borrow().query.page;
        self.set_page(page.saturating_add(1)).await
    }

    pub async fn prev_page(&self) -> FetchOutcome {
        let page = self.inner.state.borrow().query.page;
        self.set_page(page.saturating_sub(1)).await
    }

    // ── Delete ───────────────────────────────────────────────────────

    /// First step of a delete: open the confirm dialog, or the locked
    /// dialog if the entity's status forbids deletion. Never deletes.
    pub async fn request_delete(&self, id: &str) -> Result<DeleteGate, CoreError> {
        let spec = self.inner.spec;
        let cached = self.inner.state.borrow().result.find(id).cloned();
        let entity = match cached {
            Some(entity) => entity,
            None => self.inner.ctx.source.get(id).await?,
        };

        if let Some(status) = entity.status(spec.status_field).filter(|s| spec.is_locked(s)) {
            let message = CoreError::Locked {
                entity_type: spec.noun.to_owned(),
                id: entity.label(),
                status: status.clone(),
            }
            .to_string();
            info!(page = spec.id, id, %status, "delete refused");
            self.set_dialog(Some(Dialog::Locked {
                id: id.to_owned(),
                status: status.clone(),
                message: message.clone(),
            }));
            return Ok(DeleteGate::Locked { status, message });
        }

        let label = entity.label();
        self.set_dialog(Some(Dialog::ConfirmDelete {
            id: id.to_owned(),
            label: label.clone(),
        }));
        Ok(DeleteGate::Confirm { label })
    }

    /// Second step: delete the entity named in the open confirm dialog.
    ///
    /// The dialog closes whatever the outcome. On success the current page
    /// is re-fetched; if it became empty the last page is loaded instead.
    pub async fn confirm_delete(&self) -> Result<FetchOutcome, CoreError> {
        let spec = self.inner.spec;
        let pending = self.inner.state.borrow().dialog.clone();
        let Some(Dialog::ConfirmDelete { id, label }) = pending else {
            self.cancel_dialog();
            return Ok(FetchOutcome::Skipped);
        };

        let result = self.inner.ctx.source.delete(&id).await;
        self.set_dialog(None);

        if let Err(e) = result {
            warn!(page = spec.id, id, error = %e, "delete failed");
            self.notify(Notification::error(
                e.user_message(&format!("Failed to delete {} '{label}'", spec.noun)),
            ));
            return Err(e);
        }

        info!(page = spec.id, id, "deleted");
        self.notify(Notification::success(format!("Deleted {} '{label}'", spec.noun)));

        let outcome = self.fetch().await;
        let (page, total_pages, empty) = {
            let s = self.inner.state.borrow();
            (s.query.page, s.result.total_pages, s.result.is_empty())
        };
        if outcome.is_loaded() && empty && page > 1 && total_pages < page {
            return Ok(self.set_page(total_pages.max(1)).await);
        }
        Ok(outcome)
    }

    pub fn cancel_dialog(&self) {
        self.set_dialog(None);
    }

    fn set_dialog(&self, dialog: Option<Dialog>) {
        self.inner.state.send_if_modified(|s| {
            if s.dialog == dialog {
                return false;
            }
            s.dialog = dialog;
            true
        });
    }

    // ── Create / update / view ───────────────────────────────────────

    pub async fn get_entity(&self, id: &str) -> Result<Entity, CoreError> {
        self.inner.ctx.source.get(id).await
    }

    /// Validate and create. Field errors block the request.
    pub async fn create_entity(&self, body: &Value) -> Result<Entity, CoreError> {
        let spec = self.inner.spec;
        form::validate(body, spec.form, false).map_err(CoreError::Validation)?;

        let created = match self.inner.ctx.source.create(body).await {
            Ok(entity) => entity,
            Err(e) => {
                warn!(page = spec.id, error = %e, "create failed");
                self.notify(Notification::error(
                    e.user_message(&format!("Failed to create {}", spec.noun)),
                ));
                return Err(e);
            }
        };
        info!(page = spec.id, id = ?created.id(), "created");
        self.notify(Notification::success(format!(
            "Created {} '{}'",
            spec.noun,
            created.label()
        )));
        self.fetch().await;
        Ok(created)
    }

    /// Validate the fields present in `body` and update.
    pub async fn update_entity(&self, id: &str, body: &Value) -> Result<Entity, CoreError> {
        let spec = self.inner.spec;
        form::validate(body, spec.form, true).map_err(CoreError::Validation)?;

        let updated = match self.inner.ctx.source.update(id, body).await {
            Ok(entity) => entity,
            Err(e) => {
                warn!(page = spec.id, id, error = %e, "update failed");
                self.notify(Notification::error(
                    e.user_message(&format!("Failed to update {}", spec.noun)),
                ));
                return Err(e);
            }
        };
        info!(page = spec.id, id, "updated");
        self.notify(Notification::success(format!(
            "Updated {} '{}'",
            spec.noun,
            updated.label()
        )));
        self.fetch().await;
        Ok(updated)
    }

    // ── Columns ──────────────────────────────────────────────────────

    /// Flip one column. Undeclared keys leave the state untouched.
    pub fn toggle_column(&self, key: &str) -> Result<(), CoreError> {
        let toggled = self.inner.state.send_if_modified(|s| s.columns.toggle(key));
        if !toggled {
            return Err(CoreError::UnknownColumn {
                page: self.inner.spec.id.to_owned(),
                key: key.to_owned(),
            });
        }
        self.columns_changed();
        Ok(())
    }

    pub fn show_all_columns(&self) {
        self.inner.state.send_modify(|s| s.columns.set_all(true));
        self.columns_changed();
    }

    pub fn hide_all_columns(&self) {
        self.inner.state.send_modify(|s| s.columns.set_all(false));
        self.columns_changed();
    }

    pub fn reset_columns(&self) {
        let spec = self.inner.spec;
        self.inner.state.send_modify(|s| s.columns.reset(spec));
        self.columns_changed();
    }

    fn columns_changed(&self) {
        if !self.inner.options.autosave_columns {
            return;
        }
        let this = self.clone();
        tokio::spawn(async move {
            if let Err(e) = this.save_columns().await {
                warn!(page = this.inner.spec.id, error = %e, "could not persist column visibility");
            }
        });
    }

    /// Persist the current column visibility and wait for it.
    pub async fn save_columns(&self) -> Result<(), CoreError> {
        let map = self.inner.state.borrow().columns.to_map();
        self.inner.ctx.columns.save(self.inner.spec.id, &map).await
    }

    // ── Helpers ──────────────────────────────────────────────────────

    fn notify(&self, notification: Notification) {
        if let Some(sink) = &self.inner.ctx.notifier {
            // A closed receiver means the front-end is shutting down.
            let _ = sink.send(notification);
        }
    }
}
