//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::path::Path;

use serde_json::{Map, Value};

use crate::cli::BodyArgs;
use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal there is nobody to ask, so `--yes` is required.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Read and parse a JSON file for `--from-file` flags.
pub fn read_json_file(path: &Path) -> Result<Value, CliError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: "from-file".into(),
        reason: format!("invalid JSON: {e}"),
    })
}

/// Split `key=value`. The value may itself contain `=`.
pub fn parse_key_value<'a>(raw: &'a str, flag: &str) -> Result<(&'a str, &'a str), CliError> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value)),
        _ => Err(CliError::Validation {
            field: flag.into(),
            reason: format!("expected KEY=VALUE, got '{raw}'"),
        }),
    }
}

/// Assemble a request body: file, then `--data`, then `--set` fields.
///
/// `--set` values are parsed as JSON when they can be (`--set priority=3`,
/// `--set active=true`) and kept as strings otherwise.
pub fn build_body(args: &BodyArgs) -> Result<Value, CliError> {
    let mut body = Map::new();

    if let Some(ref path) = args.from_file {
        merge_object(&mut body, read_json_file(path)?, "from-file")?;
    }
    if let Some(ref data) = args.data {
        let value: Value = serde_json::from_str(data).map_err(|e| CliError::Validation {
            field: "data".into(),
            reason: format!("invalid JSON: {e}"),
        })?;
        merge_object(&mut body, value, "data")?;
    }
    for raw in &args.set {
        let (key, value) = parse_key_value(raw, "set")?;
        let value =
            serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_owned()));
        body.insert(key.to_owned(), value);
    }

    if body.is_empty() {
        return Err(CliError::Validation {
            field: "body".into(),
            reason: "no fields given; use --from-file, --data, or --set".into(),
        });
    }
    Ok(Value::Object(body))
}

fn merge_object(body: &mut Map<String, Value>, value: Value, flag: &str) -> Result<(), CliError> {
    match value {
        Value::Object(map) => {
            body.extend(map);
            Ok(())
        }
        _ => Err(CliError::Validation {
            field: flag.into(),
            reason: "expected a JSON object".into(),
        }),
    }
}
