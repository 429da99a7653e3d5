// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks the semantic constraints serde cannot express: hours inside a day,
//! minimum intervals shorter than their tier period, unique unit names.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::KeeperConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Shortest period of each tier in hours. Months are taken as 28 days.
const DAILY_PERIOD_HOURS: u64 = 24;
const WEEKLY_PERIOD_HOURS: u64 = 7 * 24;
const MONTHLY_PERIOD_HOURS: u64 = 28 * 24;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &KeeperConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let level = config.scheduler.log_level.as_str();
    if !LOG_LEVELS.contains(&level) {
        errors.push(ConfigError::validation(format!(
            "scheduler.log_level `{level}` is not one of {}",
            LOG_LEVELS.join(", ")
        )));
    }

    if config.scheduler.poll_interval_secs == 0 {
        errors.push(ConfigError::validation(
            "scheduler.poll_interval_secs must be greater than 0",
        ));
    }

    let paths = [
        ("scheduler.pid_file", config.scheduler.pid_file.as_str()),
        ("scheduler.log_file", config.scheduler.log_file.as_str()),
        ("storage.backups_dir", config.storage.backups_dir.as_str()),
        ("producer.command", config.producer.command.as_str()),
    ];
    for (key, value) in paths {
        if value.trim().is_empty() {
            errors.push(ConfigError::validation(format!("{key} must not be empty")));
        }
    }
    if let Some(state_file) = &config.scheduler.state_file
        && state_file.trim().is_empty()
    {
        errors.push(ConfigError::validation(
            "scheduler.state_file must not be empty when set",
        ));
    }

    if config.storage.staging_keep < 1 {
        errors.push(ConfigError::validation(
            "storage.staging_keep must be at least 1",
        ));
    }

    let tiers = &config.tiers;
    check_tier(
        &mut errors,
        "daily",
        tiers.daily.hour,
        tiers.daily.retention,
        tiers.daily.min_interval_hours,
        DAILY_PERIOD_HOURS,
    );
    check_tier(
        &mut errors,
        "weekly",
        tiers.weekly.hour,
        tiers.weekly.retention,
        tiers.weekly.min_interval_hours,
        WEEKLY_PERIOD_HOURS,
    );
    check_tier(
        &mut errors,
        "monthly",
        tiers.monthly.hour,
        tiers.monthly.retention,
        tiers.monthly.min_interval_hours,
        MONTHLY_PERIOD_HOURS,
    );
    if !(1..=31).contains(&tiers.monthly.day) {
        errors.push(ConfigError::validation(format!(
            "tiers.monthly.day must be between 1 and 31, got {}",
            tiers.monthly.day
        )));
    }

    if config.units.is_empty() {
        errors.push(ConfigError::validation(
            "at least one [[units]] entry is required",
        ));
    }

    let mut seen_names = HashSet::new();
    for (i, unit) in config.units.iter().enumerate() {
        if let Err(e) = keeper_core::validate_unit_name(&unit.name) {
            errors.push(ConfigError::validation(format!("units[{i}].name: {e}")));
        }
        if !seen_names.insert(unit.name.as_str()) {
            errors.push(ConfigError::validation(format!(
                "duplicate unit name `{}` in [[units]] array",
                unit.name
            )));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_tier(
    errors: &mut Vec<ConfigError>,
    tier: &str,
    hour: u32,
    retention: usize,
    min_interval_hours: u64,
    period_hours: u64,
) {
    if hour > 23 {
        errors.push(ConfigError::validation(format!(
            "tiers.{tier}.hour must be between 0 and 23, got {hour}"
        )));
    }
    if retention < 1 {
        errors.push(ConfigError::validation(format!(
            "tiers.{tier}.retention must be at least 1"
        )));
    }
    if min_interval_hours < 1 || min_interval_hours >= period_hours {
        errors.push(ConfigError::validation(format!(
            "tiers.{tier}.min_interval_hours must be between 1 and {}, got {min_interval_hours}",
            period_hours - 1
        )));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UnitConfig;

    fn messages(config: &KeeperConfig) -> Vec<String> {
        validate_config(config)
            .unwrap_err()
            .iter()
            .map(|e| e.to_string())
            .collect()
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&KeeperConfig::default()).is_ok());
    }

    #[test]
    fn hour_out_of_range_fails_validation() {
        let mut config = KeeperConfig::default();
        config.tiers.weekly.hour = 24;
        let msgs = messages(&config);
        assert!(msgs.iter().any(|m| m.contains("tiers.weekly.hour")));
    }

    #[test]
    fn min_interval_must_stay_below_period() {
        let mut config = KeeperConfig::default();
        config.tiers.daily.min_interval_hours = 24;
        config.tiers.monthly.min_interval_hours = 0;
        let msgs = messages(&config);
        assert!(msgs.iter().any(|m| m.contains("tiers.daily.min_interval_hours")));
        assert!(msgs.iter().any(|m| m.contains("tiers.monthly.min_interval_hours")));
    }

    #[test]
    fn invalid_and_duplicate_units_are_reported_together() {
        let mut config = KeeperConfig::default();
        config.units = vec![
            UnitConfig {
                name: "moodle".into(),
            },
            UnitConfig {
                name: "open_sis".into(),
            },
            UnitConfig {
                name: "moodle".into(),
            },
        ];
        let msgs = messages(&config);
        assert_eq!(msgs.len(), 2, "got {msgs:?}");
        assert!(msgs.iter().any(|m| m.contains("units[1].name")));
        assert!(msgs.iter().any(|m| m.contains("duplicate unit name `moodle`")));
    }

    #[test]
    fn all_errors_are_collected() {
        let mut config = KeeperConfig::default();
        config.scheduler.log_level = "loud".into();
        config.scheduler.poll_interval_secs = 0;
        config.storage.staging_keep = 0;
        config.tiers.monthly.day = 32;
        config.units.clear();
        assert_eq!(messages(&config).len(), 5);
    }
}
