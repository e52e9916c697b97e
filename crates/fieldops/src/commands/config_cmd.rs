//! Config subcommand handlers.

use dialoguer::{Input, Password, Select};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Copy of `cfg` safe to print: plaintext tokens are masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.token.is_some() {
            profile.token = Some("********".into());
        }
    }
    cfg
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(global),

        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config()?);
            let out = match global.output {
                OutputFormat::Table => toml::to_string_pretty(&cfg).map_err(|e| {
                    CliError::Validation {
                        field: "config".into(),
                        reason: format!("failed to serialize config: {e}"),
                    }
                })?,
                format => output::render_single(format, &cfg, |_| String::new(), |_| {
                    config::config_path().display().to_string()
                })?,
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }
    }
}

// ── Init: interactive wizard ────────────────────────────────────────

fn init(global: &GlobalOpts) -> Result<(), CliError> {
    let config_path = config::config_path();
    eprintln!("fieldops configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    let mut cfg = config::load_config_or_default();

    // 1. Profile name
    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default(global.profile.clone().unwrap_or_else(|| "default".into()))
        .interact_text()
        .map_err(prompt_err)?;

    // 2. API URL
    let api_url: String = Input::new()
        .with_prompt("API URL")
        .default(
            global
                .api_url
                .clone()
                .unwrap_or_else(|| "https://crm.example.com/api".into()),
        )
        .validate_with(|input: &String| {
            fieldops_config::parse_api_url(input)
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .interact_text()
        .map_err(prompt_err)?;

    // 3. Token (optional)
    let token = Password::new()
        .with_prompt("API token (leave empty for none)")
        .allow_empty_password(true)
        .interact()
        .map_err(prompt_err)?;

    let plaintext_token = if token.is_empty() {
        None
    } else {
        let store_choices = &[
            "Store in system keyring (recommended)",
            "Save to config file (plaintext)",
        ];
        let store_selection = Select::new()
            .with_prompt("Where to store the token?")
            .items(store_choices)
            .default(0)
            .interact()
            .map_err(prompt_err)?;

        if store_selection == 0 {
            config::store_token(&profile_name, &token)?;
            eprintln!("   ✓ Token stored in system keyring");
            None
        } else {
            Some(token)
        }
    };

    // 4. Build profile and config
    let profile = Profile {
        api_url,
        token: plaintext_token,
        insecure: global.insecure.then_some(true),
        ..Profile::default()
    };
    cfg.profiles.insert(profile_name.clone(), profile);
    if cfg.default_profile.is_none() {
        cfg.default_profile = Some(profile_name.clone());
    }

    // 5. Write config
    let path = config::save_config(&cfg)?;

    eprintln!("\n✓ Configuration written to {}", path.display());
    eprintln!("  Profile: {profile_name}");
    eprintln!("\n  Test it: fieldops list customers");
    Ok(())
}
