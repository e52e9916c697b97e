//! `create` and `update` commands.
//!
//! The body is validated against the page's form rules before any request
//! is made. On success the record the server returned is printed.

use fieldops_core::Entity;

use crate::cli::{GlobalOpts, UpdateArgs, WriteArgs};
use crate::error::CliError;
use crate::output;

use super::{ListPage, Session, util};

pub async fn create(session: &Session, args: WriteArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let body = util::build_body(&args.body)?;
    let mut page = session.open(args.entity);
    let created = page.controller.create_entity(&body).await?;
    finish(&mut page, &created, global)
}

pub async fn update(session: &Session, args: UpdateArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let body = util::build_body(&args.body)?;
    let mut page = session.open(args.entity);
    let updated = page.controller.update_entity(&args.id, &body).await?;
    finish(&mut page, &updated, global)
}

fn finish(page: &mut ListPage, entity: &Entity, global: &GlobalOpts) -> Result<(), CliError> {
    page.flush_toasts(global);
    let out = output::render_single(global.output, entity, output::entity_detail, |e| {
        e.id().unwrap_or_default()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
