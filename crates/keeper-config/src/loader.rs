// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./keeper.toml` > `~/.config/keeper/keeper.toml` > `/etc/keeper/keeper.toml`
//! with environment variable overrides via `KEEPER_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::KeeperConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/keeper/keeper.toml";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "keeper.toml";

/// Env var prefixes mapped onto nested config sections, most specific first.
///
/// Keys are mapped explicitly rather than split on `_`, since field names
/// such as `backups_dir` contain underscores themselves.
const ENV_SECTIONS: &[(&str, &str)] = &[
    ("tiers_daily_", "tiers.daily."),
    ("tiers_weekly_", "tiers.weekly."),
    ("tiers_monthly_", "tiers.monthly."),
    ("scheduler_", "scheduler."),
    ("storage_", "storage."),
    ("producer_", "producer."),
];

/// The user's XDG config file, if a config directory is known.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("keeper").join(LOCAL_CONFIG_FILE))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/keeper/keeper.toml` (system-wide)
/// 3. `~/.config/keeper/keeper.toml` (user XDG config)
/// 4. `./keeper.toml` (local directory)
/// 5. `KEEPER_*` environment variables
pub fn load_config() -> Result<KeeperConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string over the compiled defaults.
///
/// Used for testing; neither config files nor env vars are consulted.
pub fn load_config_from_str(toml_content: &str) -> Result<KeeperConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KeeperConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
///
/// Backs the CLI's `--config` flag; the XDG hierarchy is skipped.
pub fn load_config_from_path(path: &Path) -> Result<KeeperConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KeeperConfig::default()))
        .merge(Toml::file_exact(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for XDG config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    let mut figment = Figment::new()
        .merge(Serialized::defaults(KeeperConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH));
    if let Some(user) = user_config_path() {
        figment = figment.merge(Toml::file(user));
    }
    figment
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Map a prefix-stripped env var name to a dotted config key.
///
/// Returns `None` for names outside the known sections so that unrelated
/// `KEEPER_*` variables never trip `deny_unknown_fields`.
pub fn map_env_key(key: &str) -> Option<String> {
    let key = key.to_ascii_lowercase();
    ENV_SECTIONS.iter().find_map(|(prefix, section)| {
        key.strip_prefix(prefix)
            .filter(|field| !field.is_empty())
            .map(|field| format!("{section}{field}"))
    })
}

fn env_provider() -> Env {
    Env::prefixed("KEEPER_")
        .filter(|key| map_env_key(key.as_str()).is_some())
        .map(|key| map_env_key(key.as_str()).unwrap_or_default().into())
}
