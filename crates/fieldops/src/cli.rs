//! Clap derive structures for the `fieldops` CLI.
//!
//! Defines the command tree, global flags, and shared argument types.

use std::path::PathBuf;

use clap::builder::{PossibleValuesParser, TypedValueParser};
use clap::{Args, Parser, Subcommand, ValueEnum};

use fieldops_core::EntityKind;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// fieldops -- kubectl-style CLI for field-service CRM data
#[derive(Debug, Parser)]
#[command(
    name = "fieldops",
    version,
    about = "Browse and manage field-service CRM records from the command line",
    long_about = "Search, filter, and page through customers, work orders, warranty tickets,\n\
        rental machines, quotes, and sales opportunities over the CRM REST API.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Backend profile to use
    #[arg(long, short = 'p', env = "FIELDOPS_PROFILE", global = true)]
    pub profile: Option<String>,

    /// API root URL (overrides profile)
    #[arg(long, env = "FIELDOPS_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Bearer token (overrides profile and keyring)
    #[arg(long, env = "FIELDOPS_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "FIELDOPS_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "FIELDOPS_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "FIELDOPS_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Rows per page (overrides profile)
    #[arg(long, env = "FIELDOPS_PAGE_SIZE", global = true)]
    pub page_size: Option<u32>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one id per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

/// Parser for entity names, with the catalog as possible values.
fn entity_parser() -> impl TypedValueParser<Value = EntityKind> {
    let names: Vec<&'static str> = EntityKind::all().map(|k| k.spec().id).collect();
    PossibleValuesParser::new(names).try_map(|name| name.parse::<EntityKind>())
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List one page of records
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show a single record
    Get(GetArgs),

    /// Create a record
    Create(WriteArgs),

    /// Update fields on a record
    Update(UpdateArgs),

    /// Delete a record (asks for confirmation)
    #[command(alias = "rm")]
    Delete(GetArgs),

    /// Show or change which columns `list` displays
    #[command(alias = "cols")]
    Columns(ColumnsArgs),

    /// Sales pipeline board
    Pipeline(PipelineArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Record commands ──────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Entity type
    #[arg(value_parser = entity_parser())]
    pub entity: EntityKind,

    /// Page number (1-based)
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
    pub page: u32,

    /// Free-text search
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Filter as key=value (repeatable); `key=all` clears it
    #[arg(long = "filter", short = 'f', value_name = "KEY=VALUE")]
    pub filters: Vec<String>,

    /// Fetch every page
    #[arg(long, short = 'a')]
    pub all: bool,
}

#[derive(Debug, Args)]
pub struct GetArgs {
    /// Entity type
    #[arg(value_parser = entity_parser())]
    pub entity: EntityKind,

    /// Record id
    pub id: String,
}

/// Body sources for create/update. Later sources override earlier ones:
/// file, then `--data`, then `--set`.
#[derive(Debug, Args)]
pub struct BodyArgs {
    /// Read the JSON body from a file
    #[arg(long, short = 'F', value_name = "PATH")]
    pub from_file: Option<PathBuf>,

    /// Inline JSON body
    #[arg(long, short = 'd', value_name = "JSON")]
    pub data: Option<String>,

    /// Set one field as key=value (repeatable); values parse as JSON when they can
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,
}

#[derive(Debug, Args)]
pub struct WriteArgs {
    /// Entity type
    #[arg(value_parser = entity_parser())]
    pub entity: EntityKind,

    #[command(flatten)]
    pub body: BodyArgs,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Entity type
    #[arg(value_parser = entity_parser())]
    pub entity: EntityKind,

    /// Record id
    pub id: String,

    #[command(flatten)]
    pub body: BodyArgs,
}

// ── Columns ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ColumnsArgs {
    /// Entity type
    #[arg(value_parser = entity_parser())]
    pub entity: EntityKind,

    #[command(subcommand)]
    pub command: Option<ColumnsCommand>,
}

#[derive(Debug, Subcommand)]
pub enum ColumnsCommand {
    /// Show every column and whether it is visible (default)
    Show,

    /// Flip one column's visibility
    Toggle {
        /// Column key (see `columns <entity> show`)
        key: String,
    },

    /// Make every column visible
    ShowAll,

    /// Hide every column
    HideAll,

    /// Restore the page defaults
    Reset,
}

// ── Pipeline ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PipelineArgs {
    #[command(subcommand)]
    pub command: PipelineCommand,
}

#[derive(Debug, Subcommand)]
pub enum PipelineCommand {
    /// Show the board, one column per stage
    Show,

    /// Move an opportunity to another stage
    Move {
        /// Opportunity id
        id: String,

        /// Target stage
        #[arg(long, short = 't')]
        to: String,

        /// Position within the target stage (default: last)
        #[arg(long)]
        position: Option<usize>,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Print the config file path
    Path,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
