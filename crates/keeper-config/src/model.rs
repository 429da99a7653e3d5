// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Keeper backup engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// Top-level Keeper configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to the stock
/// three-application deployment.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KeeperConfig {
    /// Scheduler runner and daemon settings.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Backup area layout.
    #[serde(default)]
    pub storage: StorageConfig,

    /// External artifact producer command.
    #[serde(default)]
    pub producer: ProducerConfig,

    /// Per-tier trigger windows and retention.
    #[serde(default)]
    pub tiers: TiersConfig,

    /// Backed-up units, in registration (and therefore backup) order.
    #[serde(default = "default_units")]
    pub units: Vec<UnitConfig>,
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            storage: StorageConfig::default(),
            producer: ProducerConfig::default(),
            tiers: TiersConfig::default(),
            units: default_units(),
        }
    }
}

fn default_units() -> Vec<UnitConfig> {
    ["moodle", "rosario", "opensis"]
        .iter()
        .map(|name| UnitConfig {
            name: (*name).to_string(),
        })
        .collect()
}

/// Scheduler runner configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Seconds between scheduler polls.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// File recording the running scheduler's process id.
    #[serde(default = "default_pid_file")]
    pub pid_file: String,

    /// Log file for a scheduler started in the background.
    #[serde(default = "default_log_file")]
    pub log_file: String,

    /// Optional JSON checkpoint of last-run timestamps.
    /// `None` keeps scheduler state in memory only.
    #[serde(default)]
    pub state_file: Option<String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            poll_interval_secs: default_poll_interval_secs(),
            pid_file: default_pid_file(),
            log_file: default_log_file(),
            state_file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_poll_interval_secs() -> u64 {
    300
}

fn default_pid_file() -> String {
    "backups/.scheduler.pid".to_string()
}

fn default_log_file() -> String {
    "backups/scheduler.log".to_string()
}

/// Backup area configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Root of the backup area; staging lives here, tiers in subdirectories.
    #[serde(default = "default_backups_dir")]
    pub backups_dir: String,

    /// Staging artifacts kept per unit and category.
    #[serde(default = "default_staging_keep")]
    pub staging_keep: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backups_dir: default_backups_dir(),
            staging_keep: default_staging_keep(),
        }
    }
}

fn default_backups_dir() -> String {
    "backups".to_string()
}

fn default_staging_keep() -> usize {
    2
}

/// Artifact producer configuration.
///
/// The producer is invoked as `command args... <unit>`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProducerConfig {
    #[serde(default = "default_producer_command")]
    pub command: String,

    #[serde(default = "default_producer_args")]
    pub args: Vec<String>,

    /// Ask the producer to start the unit's dependencies when they are down.
    #[serde(default = "default_start_dependencies")]
    pub start_dependencies: bool,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            command: default_producer_command(),
            args: default_producer_args(),
            start_dependencies: default_start_dependencies(),
        }
    }
}

fn default_producer_command() -> String {
    "./manage.sh".to_string()
}

fn default_producer_args() -> Vec<String> {
    vec!["backup".to_string()]
}

fn default_start_dependencies() -> bool {
    true
}

/// Trigger windows and retention for all three tiers.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TiersConfig {
    #[serde(default)]
    pub daily: DailyTierConfig,

    #[serde(default)]
    pub weekly: WeeklyTierConfig,

    #[serde(default)]
    pub monthly: MonthlyTierConfig,
}

/// Daily tier: fires once in the configured hour.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DailyTierConfig {
    /// Local hour of day (0-23) of the trigger window.
    #[serde(default = "default_daily_hour")]
    pub hour: u32,

    /// Artifacts kept per unit and category.
    #[serde(default = "default_daily_retention")]
    pub retention: usize,

    /// Minimum hours between two runs; must stay below 24.
    #[serde(default = "default_daily_min_interval_hours")]
    pub min_interval_hours: u64,
}

impl Default for DailyTierConfig {
    fn default() -> Self {
        Self {
            hour: default_daily_hour(),
            retention: default_daily_retention(),
            min_interval_hours: default_daily_min_interval_hours(),
        }
    }
}

fn default_daily_hour() -> u32 {
    1
}

fn default_daily_retention() -> usize {
    7
}

fn default_daily_min_interval_hours() -> u64 {
    23
}

/// Weekly tier: fires in the configured hour on one weekday.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WeeklyTierConfig {
    /// Weekday of the trigger window (`"Sun"`, `"Monday"`, ...).
    #[serde(default = "default_weekly_weekday")]
    pub weekday: Weekday,

    #[serde(default = "default_weekly_hour")]
    pub hour: u32,

    #[serde(default = "default_weekly_retention")]
    pub retention: usize,

    /// Minimum hours between two runs; must stay below 168.
    #[serde(default = "default_weekly_min_interval_hours")]
    pub min_interval_hours: u64,
}

impl Default for WeeklyTierConfig {
    fn default() -> Self {
        Self {
            weekday: default_weekly_weekday(),
            hour: default_weekly_hour(),
            retention: default_weekly_retention(),
            min_interval_hours: default_weekly_min_interval_hours(),
        }
    }
}

fn default_weekly_weekday() -> Weekday {
    Weekday::Sun
}

fn default_weekly_hour() -> u32 {
    2
}

fn default_weekly_retention() -> usize {
    4
}

fn default_weekly_min_interval_hours() -> u64 {
    167
}

/// Monthly tier: fires in the configured hour on one day of the month.
///
/// Days missing from a month (e.g. 31 in April) do not fire that month.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MonthlyTierConfig {
    #[serde(default = "default_monthly_day")]
    pub day: u32,

    #[serde(default = "default_monthly_hour")]
    pub hour: u32,

    #[serde(default = "default_monthly_retention")]
    pub retention: usize,

    /// Minimum hours between two runs; must stay below 672 (28 days).
    #[serde(default = "default_monthly_min_interval_hours")]
    pub min_interval_hours: u64,
}

impl Default for MonthlyTierConfig {
    fn default() -> Self {
        Self {
            day: default_monthly_day(),
            hour: default_monthly_hour(),
            retention: default_monthly_retention(),
            min_interval_hours: default_monthly_min_interval_hours(),
        }
    }
}

fn default_monthly_day() -> u32 {
    1
}

fn default_monthly_hour() -> u32 {
    3
}

fn default_monthly_retention() -> usize {
    12
}

fn default_monthly_min_interval_hours() -> u64 {
    648
}

/// One backed-up unit.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UnitConfig {
    /// Unit name; lowercase alphanumerics and hyphens.
    pub name: String,
}
