//! Screen implementations. Each screen is a top-level Component.

pub mod entity_list;
pub mod pipeline;

use std::sync::Arc;

use fieldops_core::{
    ColumnStore, ListContext, ListController, ListOptions, NotificationSink, RestClient,
    RestSource,
};

use crate::component::Component;
use crate::screen::ScreenId;

use self::entity_list::EntityListScreen;
use self::pipeline::PipelineScreen;

/// Shared handles every screen is built from.
#[derive(Clone)]
pub struct ScreenContext {
    pub client: Arc<RestClient>,
    pub columns: Arc<dyn ColumnStore>,
    pub notifier: NotificationSink,
    pub options: ListOptions,
}

/// Create one screen per tab.
pub fn create_screens(ctx: &ScreenContext) -> Vec<(ScreenId, Box<dyn Component>)> {
    ScreenId::ALL
        .iter()
        .map(|&id| {
            let screen: Box<dyn Component> = match id.entity() {
                Some(kind) => {
                    let spec = kind.spec();
                    let list_ctx = ListContext {
                        source: Arc::new(RestSource::new(Arc::clone(&ctx.client), spec)),
                        columns: Arc::clone(&ctx.columns),
                        notifier: Some(ctx.notifier.clone()),
                    };
                    let controller = ListController::new(spec, list_ctx, ctx.options.clone());
                    Box::new(EntityListScreen::new(controller))
                }
                None => Box::new(PipelineScreen::new(Arc::clone(&ctx.client))),
            };
            (id, screen)
        })
        .collect()
}
