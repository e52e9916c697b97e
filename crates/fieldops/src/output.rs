//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Tables use `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::builder::Builder;
use tabled::{Table, Tabled, settings::Style};

use fieldops_core::{ColumnDef, Entity, ListResult};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact`: serializes the original data via serde
/// - `yaml`: serializes via serde_yaml
/// - `plain`: calls `id_fn` on each item to emit one identifier per line
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Plain => Ok(data.iter().map(&id_fn).collect::<Vec<_>>().join("\n")),
        structured => render_structured(structured, data),
    }
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses `detail_fn`, which returns a pre-formatted string.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        OutputFormat::Plain => Ok(id_fn(data)),
        structured => render_structured(structured, data),
    }
}

/// Render entity rows with a dynamic column set.
///
/// Structured formats always carry the full records; `columns` only shapes
/// the table.
pub fn render_entities(
    format: OutputFormat,
    columns: &[&ColumnDef],
    items: &[Entity],
) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => {
            let mut builder = Builder::default();
            builder.push_record(columns.iter().map(|c| c.label.to_owned()));
            for item in items {
                builder.push_record(columns.iter().map(|c| item.display(c.key)));
            }
            Ok(builder.build().with(Style::rounded()).to_string())
        }
        OutputFormat::Plain => Ok(items
            .iter()
            .map(|e| e.id().unwrap_or_default())
            .collect::<Vec<_>>()
            .join("\n")),
        structured => render_structured(structured, items),
    }
}

/// Key/value detail table for one entity, in field order.
pub fn entity_detail(entity: &Entity) -> String {
    let mut builder = Builder::default();
    for (key, _) in entity.fields() {
        builder.push_record([key.clone(), entity.display(key)]);
    }
    builder.build().with(Style::rounded()).to_string()
}

/// "Page X of Y (N total)" under a table.
pub fn page_footer(result: &ListResult, color: bool) -> String {
    let text = if result.total_pages == 0 {
        "No records".to_owned()
    } else {
        format!(
            "Page {} of {} ({} total)",
            result.page, result.total_pages, result.total_count
        )
    };
    if color {
        text.dimmed().to_string()
    } else {
        text
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

/// Print a one-line status message to stderr, respecting quiet mode.
pub fn print_status(message: &str, quiet: bool, color: bool) {
    if quiet {
        return;
    }
    if color {
        eprintln!("{} {message}", "✓".green());
    } else {
        eprintln!("{message}");
    }
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_structured<T: serde::Serialize + ?Sized>(
    format: OutputFormat,
    data: &T,
) -> Result<String, CliError> {
    Ok(match format {
        OutputFormat::JsonCompact => serde_json::to_string(data)?,
        OutputFormat::Yaml => serde_yaml::to_string(data)?,
        _ => serde_json::to_string_pretty(data)?,
    })
}
