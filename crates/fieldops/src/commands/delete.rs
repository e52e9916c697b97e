//! `delete` command.
//!
//! Locked records are refused before any request. Everything else asks
//! for confirmation unless `--yes` was given.

use fieldops_core::DeleteGate;

use crate::cli::{GetArgs, GlobalOpts};
use crate::error::CliError;

use super::{Session, util};

pub async fn handle(session: &Session, args: GetArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut page = session.open(args.entity);
    let controller = &page.controller;
    let noun = controller.spec().noun;

    let label = match controller.request_delete(&args.id).await? {
        DeleteGate::Locked { status, message } => {
            controller.cancel_dialog();
            return Err(CliError::Locked { message, status });
        }
        DeleteGate::Confirm { label } => label,
    };

    if !util::confirm(&format!("Delete {noun} '{label}'?"), "delete", global.yes)? {
        controller.cancel_dialog();
        return Ok(());
    }

    // The refetch afterwards is best-effort; the delete itself succeeded.
    let outcome = controller.confirm_delete().await?;
    if let Err(e) = outcome.into_result() {
        tracing::debug!(error = %e, "refresh after delete failed");
    }
    page.flush_toasts(global);
    Ok(())
}
