//! Shared core for the fieldops CLI and TUI.
//!
//! Holds the entity catalog and the generic [`ListController`] that drives
//! every list page: search, filters, pagination, column visibility, and
//! CRUD dispatch over an injected [`DataSource`]. Front-ends render
//! [`ListState`] and never talk to the HTTP layer directly.

pub mod error;
pub mod form;
pub mod list;
pub mod model;
pub mod notify;
pub mod pipeline;
pub mod prefs;
pub mod source;

pub use error::{CoreError, FieldError, ValidationErrors};
pub use form::{FieldRule, FieldSpec, validate};
pub use list::{
    DeleteGate, Dialog, FetchOutcome, ListContext, ListController, ListOptions, ListState,
};
pub use model::{
    ColumnDef, ColumnVisibility, DEFAULT_PAGE_SIZE, Entity, EntityKind, FilterDef, ListQuery,
    ListResult, PIPELINE_STAGES, PageSpec,
};
pub use notify::{Notification, NotificationLevel, NotificationSink};
pub use pipeline::{Board, Pipeline, StageChange};
pub use prefs::{ColumnStore, FileColumnStore, MemoryColumnStore};
pub use source::{DataSource, RestSource};

// Wire-level types callers need when building sources.
pub use fieldops_api::{Page, Pagination, RestClient, TlsMode, TransportConfig, UpdateMethod};
