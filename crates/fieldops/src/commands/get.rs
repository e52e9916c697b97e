//! `get` command: show a single record.

use crate::cli::{GetArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::Session;

pub async fn handle(session: &Session, args: GetArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let page = session.open(args.entity);
    let entity = page.controller.get_entity(&args.id).await?;

    let out = output::render_single(global.output, &entity, output::entity_detail, |e| {
        e.id().unwrap_or_default()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
