//! `list` command: one page, or every page with `--all`.

use fieldops_core::{FetchOutcome, ListQuery};

use crate::cli::{GlobalOpts, ListArgs, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::{Session, util};

pub async fn handle(session: &Session, args: ListArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut page = session.open(args.entity);
    let controller = &page.controller;

    let mut query = ListQuery::new(session.settings.page_size);
    if let Some(ref search) = args.search {
        search.trim().clone_into(&mut query.search);
    }
    for raw in &args.filters {
        let (key, value) = util::parse_key_value(raw, "filter")?;
        query.set_filter(key, value);
    }

    controller.mount_with_query(query).await?.into_result()?;
    // Later pages go through the controller so they are bounds-checked.
    if args.page > 1 {
        if let FetchOutcome::Skipped = controller.set_page(args.page).await.into_result()? {
            let total_pages = controller.snapshot().result.total_pages;
            return Err(CliError::Validation {
                field: "page".into(),
                reason: format!("{} is past the last page ({total_pages})", args.page),
            });
        }
    }
    let mut items = controller.snapshot().result.items;

    if args.all {
        while let FetchOutcome::Loaded { .. } = controller.next_page().await.into_result()? {
            items.extend(controller.snapshot().result.items);
        }
    }

    let state = controller.snapshot();
    let columns = state.visible_columns();
    let out = output::render_entities(global.output, &columns, &items)?;
    output::print_output(&out, global.quiet);

    if global.output == OutputFormat::Table && !args.all {
        let footer = output::page_footer(&state.result, output::should_color(global.color));
        output::print_output(&footer, global.quiet);
    }
    page.flush_toasts(global);
    Ok(())
}
