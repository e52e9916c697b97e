//! Command dispatch: bridges CLI args -> list controllers -> output formatting.

pub mod columns;
pub mod config_cmd;
pub mod delete;
pub mod get;
pub mod list;
pub mod pipeline;
pub mod util;
pub mod write;

use std::sync::Arc;

use tokio::sync::mpsc;

use fieldops_core::{
    ColumnStore, EntityKind, FileColumnStore, ListContext, ListController, ListOptions,
    Notification, NotificationLevel, RestClient, RestSource,
};

use crate::cli::{Command, GlobalOpts};
use crate::config::{self, ClientSettings};
use crate::error::CliError;
use crate::output;

/// Everything a command needs to reach the API and local preferences.
pub struct Session {
    pub client: Arc<RestClient>,
    pub settings: ClientSettings,
    columns: Arc<dyn ColumnStore>,
}

impl Session {
    pub fn new(settings: ClientSettings) -> Result<Self, CliError> {
        let client = RestClient::new(settings.api_url.as_str(), &settings.transport)
            .map_err(fieldops_core::CoreError::from)?;
        Ok(Self {
            client: Arc::new(client),
            settings,
            columns: Arc::new(FileColumnStore::new(config::prefs_dir())),
        })
    }

    /// Open one list page. Column changes are saved explicitly, so the
    /// process never exits with a write still in flight.
    pub fn open(&self, kind: EntityKind) -> ListPage {
        let spec = kind.spec();
        let (tx, rx) = mpsc::unbounded_channel();
        let ctx = ListContext {
            source: Arc::new(RestSource::new(Arc::clone(&self.client), spec)),
            columns: Arc::clone(&self.columns),
            notifier: Some(tx),
        };
        let options = ListOptions {
            page_size: self.settings.page_size,
            live_search: false,
            search_debounce: self.settings.search_debounce,
            autosave_columns: false,
        };
        ListPage {
            controller: ListController::new(spec, ctx, options),
            toasts: rx,
        }
    }
}

/// A controller plus the receiving end of its toasts.
pub struct ListPage {
    pub controller: ListController,
    toasts: mpsc::UnboundedReceiver<Notification>,
}

impl ListPage {
    /// Print success toasts to stderr. Failures already surface as errors.
    pub fn flush_toasts(&mut self, global: &GlobalOpts) {
        let color = output::should_color(global.color);
        while let Ok(toast) = self.toasts.try_recv() {
            match toast.level {
                NotificationLevel::Success => {
                    output::print_status(&toast.message, global.quiet, color);
                }
                level => tracing::debug!(?level, message = %toast.message, "toast"),
            }
        }
    }
}

/// Dispatch an API-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::List(args) => list::handle(session, args, global).await,
        Command::Get(args) => get::handle(session, args, global).await,
        Command::Create(args) => write::create(session, args, global).await,
        Command::Update(args) => write::update(session, args, global).await,
        Command::Delete(args) => delete::handle(session, args, global).await,
        Command::Columns(args) => columns::handle(session, args, global).await,
        Command::Pipeline(args) => pipeline::handle(session, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "config and completions run without a session".into(),
        )),
    }
}
