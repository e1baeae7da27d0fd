// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./depot.toml` > `~/.config/depot/depot.toml` > `/etc/depot/depot.toml`
//! with environment variable overrides via `DEPOT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::DepotConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/depot/depot.toml` (system-wide)
/// 3. `~/.config/depot/depot.toml` (user XDG config)
/// 4. `./depot.toml` (local directory)
/// 5. `DEPOT_*` environment variables
pub fn load_config() -> Result<DepotConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<DepotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DepotConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<DepotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DepotConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(DepotConfig::default()))
        .merge(Toml::file("/etc/depot/depot.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("depot/depot.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("depot.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` so that underscore-containing
/// keys survive: `DEPOT_STORAGE_DATABASE_PATH` maps to `storage.database_path`,
/// not `storage.database.path`.
fn env_provider() -> Env {
    Env::prefixed("DEPOT_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env var name to a dotted config path.
fn map_env_key(key: &str) -> String {
    const SECTIONS: [&str; 6] = [
        "agent",
        "storage",
        "lifecycle",
        "notification",
        "whatsapp",
        "sweep",
    ];
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(map_env_key("storage_database_path"), "storage.database_path");
        assert_eq!(map_env_key("whatsapp_access_token"), "whatsapp.access_token");
        assert_eq!(map_env_key("sweep_timeout_secs"), "sweep.timeout_secs");
        assert_eq!(map_env_key("lifecycle_retention_days"), "lifecycle.retention_days");
        assert_eq!(map_env_key("unrelated"), "unrelated");
    }
}
