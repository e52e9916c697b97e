//! `columns` command: inspect and change per-page column visibility.
//!
//! Works entirely on local preferences; no API request is made.

use serde::Serialize;
use tabled::Tabled;

use crate::cli::{ColumnsArgs, ColumnsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::Session;

#[derive(Debug, Serialize)]
struct ColumnInfo {
    key: &'static str,
    label: &'static str,
    visible: bool,
    default_visible: bool,
}

#[derive(Tabled)]
struct ColumnRow {
    #[tabled(rename = "Key")]
    key: &'static str,
    #[tabled(rename = "Label")]
    label: &'static str,
    #[tabled(rename = "Visible")]
    visible: &'static str,
}

impl From<&ColumnInfo> for ColumnRow {
    fn from(c: &ColumnInfo) -> Self {
        Self {
            key: c.key,
            label: c.label,
            visible: if c.visible { "yes" } else { "-" },
        }
    }
}

pub async fn handle(session: &Session, args: ColumnsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let page = session.open(args.entity);
    let controller = &page.controller;
    controller.load_columns().await;

    let changed = match args.command.unwrap_or(ColumnsCommand::Show) {
        ColumnsCommand::Show => false,
        ColumnsCommand::Toggle { key } => {
            controller.toggle_column(&key)?;
            true
        }
        ColumnsCommand::ShowAll => {
            controller.show_all_columns();
            true
        }
        ColumnsCommand::HideAll => {
            controller.hide_all_columns();
            true
        }
        ColumnsCommand::Reset => {
            controller.reset_columns();
            true
        }
    };
    if changed {
        controller.save_columns().await?;
    }

    let spec = controller.spec();
    let state = controller.snapshot();
    let columns: Vec<ColumnInfo> = spec
        .columns
        .iter()
        .map(|c| ColumnInfo {
            key: c.key,
            label: c.label,
            visible: state.columns.is_visible(c.key),
            default_visible: c.default_visible,
        })
        .collect();

    let out = output::render_list(global.output, &columns, |c| ColumnRow::from(c), |c| {
        c.key.to_owned()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
