//! Configuration for locating the Data Source Manager.
//!
//! By default the compiled-in [`SearchPolicy`] is used. A deployment can point
//! at a specific library through a TOML snippet or the environment.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::platform::SearchPolicy;

/// Environment variable names.
pub mod env_vars {
    /// Library name or path that replaces the platform search list.
    pub const LIBRARY: &str = "TWDSM_LIBRARY";
    /// Whether to try the legacy DSM first where one exists.
    pub const PREFER_LEGACY: &str = "TWDSM_PREFER_LEGACY";
}

/// DSM loading configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DsmConfig {
    /// Explicit library name or path. Empty means "use the platform names".
    pub library: Option<String>,

    /// Try the legacy DSM before the current one.
    pub prefer_legacy: bool,
}

impl DsmConfig {
    /// Read the configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let library = lookup(env_vars::LIBRARY)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let prefer_legacy = lookup(env_vars::PREFER_LEGACY)
            .and_then(|s| parse_flag(&s))
            .unwrap_or(false);

        Self {
            library,
            prefer_legacy,
        }
    }

    /// Parse the configuration from TOML.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Search policy implied by this configuration.
    pub fn search_policy(&self) -> SearchPolicy {
        match self.library.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => SearchPolicy::custom(name),
            _ => SearchPolicy::platform(),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
