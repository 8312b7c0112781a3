//! Configuration module for mesh-keys
//!
//! Reads a one-time snapshot of the environment at startup. Scalar settings go
//! through the `config` crate; per-entry companion variables (`{NAME}_VALUE`,
//! `{NAME}_URL`) are looked up directly in the same variable map.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Suffix of the variable holding a key's literal value
pub const VALUE_SUFFIX: &str = "_VALUE";

/// Suffix of the variable holding a forward entry's target URL
pub const URL_SUFFIX: &str = "_URL";

/// Errors raised while reading the configuration snapshot
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(#[from] config::ConfigError),
}

/// Body shape served by the key responder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum KeyStyle {
    /// `{"value":"<value>"}`
    #[default]
    Value,
    /// `{"key":"<name>"}`
    Key,
}

/// Raw scalar settings as read from the environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Host to bind the server to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// Comma-separated key names
    #[serde(default)]
    pub keys: String,
    /// Comma-separated forward names
    #[serde(default)]
    pub forward_keys: String,
    /// Body shape for key routes
    #[serde(default)]
    pub key_style: KeyStyle,
    /// Upstream request timeout in seconds
    #[serde(default = "default_forward_timeout_secs")]
    pub forward_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_forward_timeout_secs() -> u64 {
    30
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            keys: String::new(),
            forward_keys: String::new(),
            key_style: KeyStyle::default(),
            forward_timeout_secs: default_forward_timeout_secs(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Forwarding client settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardSettings {
    pub timeout: Duration,
}

impl Default for ForwardSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(default_forward_timeout_secs()),
        }
    }
}

/// A key served by the key responder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEntry {
    pub name: String,
    pub value: String,
}

/// A name forwarded to an upstream URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardEntry {
    pub name: String,
    pub target_url: String,
}

/// Immutable configuration read once at startup
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub server: ServerConfig,
    pub key_style: KeyStyle,
    pub forward: ForwardSettings,
    pub keys: Vec<Arc<KeyEntry>>,
    pub forwards: Vec<Arc<ForwardEntry>>,
}

impl Snapshot {
    /// Load the snapshot from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        // Try to load .env file (ignore if not found)
        let _ = dotenvy::dotenv();

        let vars = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        Self::from_vars(&vars)
    }

    /// Build the snapshot from an explicit variable map
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let settings = load_settings(vars)?;

        let keys = split_names(&settings.keys)
            .map(|name| {
                let value = lookup(vars, &name, VALUE_SUFFIX).unwrap_or_else(|| name.clone());
                Arc::new(KeyEntry { name, value })
            })
            .collect();

        let forwards = split_names(&settings.forward_keys)
            .filter_map(|name| match lookup(vars, &name, URL_SUFFIX) {
                Some(target_url) => Some(Arc::new(ForwardEntry { name, target_url })),
                None => {
                    tracing::debug!(name = %name, "No target URL configured, skipping forward");
                    None
                }
            })
            .collect();

        Ok(Self {
            server: ServerConfig {
                host: settings.host,
                port: settings.port,
            },
            key_style: settings.key_style,
            forward: ForwardSettings {
                timeout: Duration::from_secs(settings.forward_timeout_secs),
            },
            keys,
            forwards,
        })
    }
}

fn load_settings(vars: &HashMap<String, String>) -> Result<Settings, ConfigError> {
    let config = config::Config::builder()
        .add_source(config::Config::try_from(&Settings::default())?)
        .add_source(config::Environment::default().source(Some(vars.clone())))
        .build()?;

    Ok(config.try_deserialize()?)
}

/// Split a comma-separated list into trimmed, usable names
fn split_names(list: &str) -> impl Iterator<Item = String> + '_ {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .filter(|name| {
            let usable = is_path_segment(name);
            if !usable {
                tracing::warn!(name = %name, "Name is not a plain path segment, skipping");
            }
            usable
        })
        .map(str::to_string)
}

/// Names become literal path segments, so router syntax is not allowed
fn is_path_segment(name: &str) -> bool {
    !name.contains(['/', ':', '*'])
}

/// Look up `{NAME}{suffix}`, treating an empty value as absent
fn lookup(vars: &HashMap<String, String>, name: &str, suffix: &str) -> Option<String> {
    let var = format!("{}{}", name.to_uppercase(), suffix);
    vars.get(&var).filter(|v| !v.is_empty()).cloned()
}
