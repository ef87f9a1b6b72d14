//! Shared configuration for ecowatch.
//!
//! TOML profiles, table schemas, credential resolution (env + plaintext),
//! and translation into the runtime types of `ecowatch-api` and
//! `ecowatch-core`. The CLI adds flag-aware wrappers on top.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use ecowatch_api::{TlsMode, TransportConfig};
use ecowatch_core::{CacheConfig, GridConfig};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{profile}' is not defined")]
    UnknownProfile { profile: String },

    #[error("table '{table}' is not defined")]
    UnknownTable { table: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: impl Into<String>, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named server profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub grid: GridSettings,

    /// Table schemas keyed by table id.
    #[serde(default)]
    pub tables: BTreeMap<String, TableSchema>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
            cache: CacheSettings::default(),
            grid: GridSettings::default(),
            tables: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named server profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// API base URL (e.g., "https://api.ecowatch.example/v1").
    pub base_url: String,

    /// Bearer token (plaintext; prefer `token_env`).
    pub token: Option<String>,

    /// Environment variable name containing the bearer token.
    pub token_env: Option<String>,

    /// Accept invalid TLS certificates.
    pub insecure: Option<bool>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override timeout in seconds.
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CacheSettings {
    /// Freshness window for cached reads.
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: u64,

    /// Oldest copy served when the network fails.
    #[serde(default = "default_max_age_ms")]
    pub max_age_ms: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_ms: default_ttl_ms(),
            max_age_ms: default_max_age_ms(),
        }
    }
}

fn default_ttl_ms() -> u64 {
    30_000
}
fn default_max_age_ms() -> u64 {
    600_000
}

impl From<&CacheSettings> for CacheConfig {
    fn from(s: &CacheSettings) -> Self {
        Self {
            ttl: Duration::from_millis(s.ttl_ms),
            stale_max_age: Duration::from_millis(s.max_age_ms.max(s.ttl_ms)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct GridSettings {
    pub row_height: u32,
    pub overscan: u32,
    pub min_column_width: u32,
    pub default_column_width: u32,
    pub page_size: usize,
    pub virtualize_min_rows: usize,
    pub virtualize_min_width: u32,
}

impl Default for GridSettings {
    fn default() -> Self {
        let grid = GridConfig::default();
        Self {
            row_height: grid.row_height,
            overscan: grid.overscan,
            min_column_width: grid.min_column_width,
            default_column_width: grid.default_column_width,
            page_size: grid.page_size,
            virtualize_min_rows: grid.virtualize_min_rows,
            virtualize_min_width: grid.virtualize_min_width,
        }
    }
}

impl From<&GridSettings> for GridConfig {
    fn from(s: &GridSettings) -> Self {
        Self {
            row_height: s.row_height,
            overscan: s.overscan,
            min_column_width: s.min_column_width,
            default_column_width: s.default_column_width.max(s.min_column_width),
            page_size: s.page_size,
            virtualize_min_rows: s.virtualize_min_rows,
            virtualize_min_width: s.virtualize_min_width,
        }
    }
}

/// A listing endpoint and how to present it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TableSchema {
    /// Resource path relative to the profile's base URL.
    pub path: String,

    /// Fixed query parameters sent with every request.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,

    /// Columns in display order. Empty means "infer from the first row".
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<ColumnSchema>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ColumnSchema {
    pub id: String,

    /// Header text; defaults to the id.
    pub header: Option<String>,

    /// Dotted path of the value within a row object; defaults to the id.
    pub field: Option<String>,

    /// Preferred width in pixels.
    pub width: Option<u32>,

    #[serde(default)]
    pub locked: bool,

    /// Hidden until the user shows it.
    #[serde(default)]
    pub hidden: bool,

    #[serde(default = "default_true")]
    pub sortable: bool,
}

fn default_true() -> bool {
    true
}

impl ColumnSchema {
    pub fn header(&self) -> &str {
        self.header.as_deref().unwrap_or(&self.id)
    }

    pub fn field(&self) -> &str {
        self.field.as_deref().unwrap_or(&self.id)
    }
}

impl Config {
    /// Look up a profile by name, falling back to `default_profile`.
    pub fn profile(&self, name: Option<&str>) -> Result<(String, &Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get(name)
            .map(|p| (name.to_owned(), p))
            .ok_or_else(|| ConfigError::UnknownProfile {
                profile: name.into(),
            })
    }

    pub fn table(&self, id: &str) -> Result<&TableSchema, ConfigError> {
        self.tables.get(id).ok_or_else(|| ConfigError::UnknownTable { table: id.into() })
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::from(&self.cache)
    }

    pub fn grid_config(&self) -> GridConfig {
        GridConfig::from(&self.grid)
    }

    /// Reject settings the runtime cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid.row_height == 0 {
            return Err(invalid("grid.row_height", "must be greater than zero"));
        }
        if self.grid.page_size == 0 {
            return Err(invalid("grid.page_size", "must be greater than zero"));
        }
        if self.cache.ttl_ms == 0 {
            return Err(invalid("cache.ttl_ms", "must be greater than zero"));
        }
        for (name, profile) in &self.profiles {
            url::Url::parse(&profile.base_url).map_err(|e| {
                invalid(format!("profiles.{name}.base_url"), format!("{e}: {}", profile.base_url))
            })?;
        }
        for (table, schema) in &self.tables {
            if !schema.path.starts_with('/') {
                return Err(invalid(format!("tables.{table}.path"), "must start with '/'"));
            }
            let mut ids = HashSet::new();
            for column in &schema.columns {
                if column.id.trim().is_empty() {
                    return Err(invalid(format!("tables.{table}.columns"), "empty column id"));
                }
                if !ids.insert(column.id.as_str()) {
                    return Err(invalid(
                        format!("tables.{table}.columns"),
                        format!("duplicate column id '{}'", column.id),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Starter configuration written by `config init`.
    pub fn example() -> Self {
        let mut profiles = BTreeMap::new();
        profiles.insert(
            "default".into(),
            Profile {
                base_url: "https://api.ecowatch.example/v1".into(),
                token: None,
                token_env: Some("ECOWATCH_TOKEN".into()),
                insecure: None,
                ca_cert: None,
                timeout: None,
            },
        );

        let column = |id: &str, header: &str| ColumnSchema {
            id: id.into(),
            header: Some(header.into()),
            field: None,
            width: None,
            locked: false,
            hidden: false,
            sortable: true,
        };
        let mut tables = BTreeMap::new();
        tables.insert(
            "stations".into(),
            TableSchema {
                path: "/stations".into(),
                params: BTreeMap::new(),
                columns: vec![
                    ColumnSchema {
                        locked: true,
                        ..column("name", "Name")
                    },
                    column("region", "Region"),
                    ColumnSchema {
                        field: Some("latest.aqi".into()),
                        width: Some(80),
                        ..column("aqi", "AQI")
                    },
                    ColumnSchema {
                        hidden: true,
                        ..column("updated_at", "Updated")
                    },
                ],
            },
        );

        Self {
            profiles,
            tables,
            ..Self::default()
        }
    }
}

impl Profile {
    /// Transport settings for this profile. `timeout_secs` is the global
    /// default, overridden by the profile's own value.
    pub fn transport(&self, timeout_secs: u64) -> TransportConfig {
        let tls = if self.insecure.unwrap_or(false) {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ref ca_path) = self.ca_cert {
            TlsMode::CustomCa(ca_path.clone())
        } else {
            TlsMode::System
        };
        TransportConfig::default()
            .with_tls(tls)
            .with_timeout(Duration::from_secs(self.timeout.unwrap_or(timeout_secs)))
    }
}

// ── Config file path ────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "ecowatch", "ecowatch")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Where grid layout and view preferences are persisted.
pub fn state_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("state.json"),
        |dirs| dirs.data_dir().join("state.json"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("ecowatch");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` (a missing file is fine) layered with
/// `ECOWATCH_`-prefixed env vars (`ECOWATCH_GRID__PAGE_SIZE=50`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("ECOWATCH_").split("__"));

    let config: Config = figment.extract()?;
    config.validate()?;
    Ok(config)
}

/// Load config, returning a default if it cannot be loaded.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// Resolve the bearer token: `token_env` lookup first, then plaintext.
/// `None` means the profile only reaches public endpoints.
pub fn resolve_token(profile: &Profile) -> Option<SecretString> {
    if let Some(ref env_name) = profile.token_env {
        if let Ok(val) = std::env::var(env_name) {
            if !val.is_empty() {
                return Some(SecretString::from(val));
            }
        }
    }
    profile.token.clone().map(SecretString::from)
}
