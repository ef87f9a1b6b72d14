//! CLI-aware configuration: flag overrides on top of `ecowatch-config`.
//!
//! Core never sees these types. It receives a built fetcher, a
//! `CacheConfig` and a `GridConfig`.

use std::path::PathBuf;
use std::sync::Arc;

use ecowatch_api::{HttpFetcher, TlsMode};
use ecowatch_config::{Config, Profile};
use ecowatch_core::FileStore;
use secrecy::SecretString;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;

pub use ecowatch_config::{config_path, state_path};

/// Config file in effect: `--config` / `ECOWATCH_CONFIG`, else the platform path.
pub fn effective_config_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

pub fn effective_state_path(global: &GlobalOpts) -> PathBuf {
    global.state.clone().unwrap_or_else(state_path)
}

/// Load the config file (a missing file yields defaults).
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(ecowatch_config::load_config_from(&effective_config_path(global))?)
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// `--output`, else the config default, else table.
pub fn output_format(global: &GlobalOpts, config: &Config) -> OutputFormat {
    if let Some(format) = global.output {
        return format;
    }
    match config.defaults.output.as_str() {
        "json" => OutputFormat::Json,
        "json-compact" => OutputFormat::JsonCompact,
        "yaml" => OutputFormat::Yaml,
        "plain" => OutputFormat::Plain,
        _ => OutputFormat::Table,
    }
}

/// Preference store for grid layout and view state.
pub fn open_state(global: &GlobalOpts) -> Arc<FileStore> {
    Arc::new(FileStore::open(effective_state_path(global)))
}

/// Build the HTTP fetcher from the active profile plus flag overrides.
///
/// Precedence: flag > env > profile > config defaults.
pub fn build_fetcher(global: &GlobalOpts, config: &Config) -> Result<HttpFetcher, CliError> {
    let profile_name = active_profile_name(global, config);
    let profile = config.profiles.get(&profile_name);

    // An explicitly requested profile must exist.
    if profile.is_none() && global.profile.is_some() {
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: available_profiles(config),
        });
    }

    let base_url = global
        .base_url
        .clone()
        .or_else(|| profile.map(|p| p.base_url.clone()))
        .ok_or_else(|| CliError::NoConfig {
            path: effective_config_path(global).display().to_string(),
        })?;

    let token = global
        .token
        .clone()
        .map(SecretString::from)
        .or_else(|| profile.and_then(ecowatch_config::resolve_token));

    let timeout = global.timeout.unwrap_or(config.defaults.timeout);
    let mut transport = profile.map_or_else(
        || anonymous_profile(&base_url).transport(timeout),
        |p| p.transport(timeout),
    );
    if let Some(secs) = global.timeout {
        transport = transport.with_timeout(std::time::Duration::from_secs(secs));
    }
    if global.insecure {
        transport = transport.with_tls(TlsMode::DangerAcceptInvalid);
    }

    tracing::debug!(profile = %profile_name, base_url = %base_url, "building fetcher");
    Ok(HttpFetcher::new(&base_url, token, &transport)?)
}

fn anonymous_profile(base_url: &str) -> Profile {
    Profile {
        base_url: base_url.to_owned(),
        token: None,
        token_env: None,
        insecure: None,
        ca_cert: None,
        timeout: None,
    }
}

fn available_profiles(config: &Config) -> String {
    if config.profiles.is_empty() {
        "(none)".into()
    } else {
        config.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}
