//! CLI configuration: thin wrapper around `fieldops_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--api-url, --token, etc.).

use secrecy::SecretString;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use fieldops_config::{
    ClientSettings, Config, Profile, config_path, load_config, load_config_or_default, prefs_dir,
    save_config, store_token,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Translate the active profile plus global flags into client settings.
///
/// Flags win over profile values. Without a profile, `--api-url` alone is
/// enough to run.
pub fn resolve_settings(global: &GlobalOpts, config: &Config) -> Result<ClientSettings, CliError> {
    let profile_name = active_profile_name(global, config);

    let mut profile = match config.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.profile.is_some() => {
            let mut available: Vec<&str> = config.profiles.keys().map(String::as_str).collect();
            available.sort_unstable();
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            });
        }
        None => Profile::default(),
    };

    if let Some(ref url) = global.api_url {
        profile.api_url.clone_from(url);
    }
    if profile.api_url.is_empty() {
        return Err(CliError::NoConfig {
            path: config_path().display().to_string(),
        });
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if global.timeout.is_some() {
        profile.timeout = global.timeout;
    }
    if global.page_size.is_some() {
        profile.page_size = global.page_size;
    }

    let mut settings =
        fieldops_config::profile_to_settings(&profile, &profile_name, &config.defaults)?;
    if let Some(ref token) = global.token {
        settings.transport = settings
            .transport
            .with_token(SecretString::from(token.clone()));
    }
    Ok(settings)
}
