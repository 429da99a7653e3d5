// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Keeper configuration system.

use std::io::Write;

use chrono::Weekday;
use keeper_config::diagnostic::ConfigError;
use keeper_config::model::KeeperConfig;
use keeper_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};
use serial_test::serial;

/// A full config with every section deserializes successfully.
#[test]
fn valid_toml_deserializes_into_keeper_config() {
    let toml = r#"
[scheduler]
log_level = "debug"
poll_interval_secs = 60
pid_file = "/var/run/keeper.pid"
log_file = "/var/log/keeper.log"
state_file = "/var/lib/keeper/state.json"

[storage]
backups_dir = "/srv/backups"
staging_keep = 3

[producer]
command = "/opt/stack/manage.sh"
args = ["backup", "--quiet"]
start_dependencies = false

[tiers.daily]
hour = 4
retention = 10

[tiers.weekly]
weekday = "Saturday"
hour = 5

[tiers.monthly]
day = 15
retention = 24

[[units]]
name = "wiki"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.scheduler.log_level, "debug");
    assert_eq!(config.scheduler.poll_interval_secs, 60);
    assert_eq!(
        config.scheduler.state_file.as_deref(),
        Some("/var/lib/keeper/state.json")
    );
    assert_eq!(config.storage.backups_dir, "/srv/backups");
    assert_eq!(config.storage.staging_keep, 3);
    assert_eq!(config.producer.args, vec!["backup", "--quiet"]);
    assert!(!config.producer.start_dependencies);
    assert_eq!(config.tiers.daily.hour, 4);
    assert_eq!(config.tiers.daily.retention, 10);
    assert_eq!(config.tiers.daily.min_interval_hours, 23);
    assert_eq!(config.tiers.weekly.weekday, Weekday::Sat);
    assert_eq!(config.tiers.monthly.day, 15);
    assert_eq!(config.tiers.monthly.hour, 3);
    assert_eq!(config.units.len(), 1);
    assert_eq!(config.units[0].name, "wiki");
}

#[test]
fn empty_toml_uses_stock_deployment() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.scheduler.poll_interval_secs, 300);
    assert_eq!(config.scheduler.pid_file, "backups/.scheduler.pid");
    assert!(config.scheduler.state_file.is_none());
    assert_eq!(config.storage.backups_dir, "backups");
    assert_eq!(config.storage.staging_keep, 2);
    assert_eq!(config.producer.command, "./manage.sh");
    assert_eq!(config.tiers.daily.retention, 7);
    assert_eq!(config.tiers.weekly.retention, 4);
    assert_eq!(config.tiers.weekly.weekday, Weekday::Sun);
    assert_eq!(config.tiers.monthly.retention, 12);
    assert_eq!(config.tiers.monthly.min_interval_hours, 648);
    let names: Vec<&str> = config.units.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["moodle", "rosario", "opensis"]);
}

#[test]
fn unknown_field_in_tier_produces_suggestion() {
    let toml = r#"
[tiers.daily]
retension = 3
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown field");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key,
            suggestion,
            valid_keys,
            ..
        } => {
            assert_eq!(key, "retension");
            assert_eq!(suggestion.as_deref(), Some("retention"));
            assert!(valid_keys.contains("min_interval_hours"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn unknown_top_level_section_is_rejected() {
    let err = load_config_from_str("[retention]\ndaily = 7\n").expect_err("should reject");
    assert!(format!("{err}").contains("retention"), "got: {err}");
}

#[test]
fn wrong_type_produces_invalid_type_diagnostic() {
    let errors = load_and_validate_str("[tiers.weekly]\nhour = \"two\"\n")
        .expect_err("string hour should be rejected");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("hour"))),
        "got {errors:?}"
    );
}

#[test]
fn bad_weekday_is_rejected() {
    let errors = load_and_validate_str("[tiers.weekly]\nweekday = \"Caturday\"\n")
        .expect_err("unknown weekday should be rejected");
    assert!(!errors.is_empty());
}

#[test]
fn validation_errors_come_back_together() {
    let toml = r#"
[tiers.daily]
hour = 25

[tiers.monthly]
day = 0

[[units]]
name = "Bad_Name"
"#;
    let errors = load_and_validate_str(toml).expect_err("should fail validation");
    assert_eq!(errors.len(), 3, "got {errors:?}");
    assert!(
        errors
            .iter()
            .all(|e| matches!(e, ConfigError::Validation { .. }))
    );
}

#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let error = ConfigError::UnknownKey {
        key: "backup_dir".to_string(),
        suggestion: Some("backups_dir".to_string()),
        valid_keys: "backups_dir, staging_keep".to_string(),
        span: None,
        src: None,
    };
    assert_eq!(
        error.code().map(|c| c.to_string()).as_deref(),
        Some("keeper::config::unknown_key")
    );

    let mut buf = String::new();
    GraphicalReportHandler::new()
        .render_report(&mut buf, &error)
        .expect("should render without error");
    assert!(buf.contains("backup_dir"));
    assert!(buf.contains("did you mean `backups_dir`"));
}

#[test]
fn dotted_overrides_reach_nested_tiers() {
    use figment::{
        Figment,
        providers::{Format, Serialized, Toml},
    };

    let config: KeeperConfig = Figment::new()
        .merge(Serialized::defaults(KeeperConfig::default()))
        .merge(Toml::string("[tiers.daily]\nhour = 4\n"))
        .merge(("tiers.daily.hour", 6))
        .extract()
        .expect("should merge override");
    assert_eq!(config.tiers.daily.hour, 6);
}

#[test]
#[serial]
fn explicit_path_loads_with_env_overrides() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "[storage]\nbackups_dir = \"/from/file\"\nstaging_keep = 5").unwrap();

    // SAFETY: serialized with every other env-touching test in this binary.
    unsafe {
        std::env::set_var("KEEPER_STORAGE_BACKUPS_DIR", "/from/env");
        std::env::set_var("KEEPER_TIERS_WEEKLY_HOUR", "6");
        std::env::set_var("KEEPER_UNRELATED_FLAG", "1");
    }
    let result = load_and_validate_path(file.path());
    unsafe {
        std::env::remove_var("KEEPER_STORAGE_BACKUPS_DIR");
        std::env::remove_var("KEEPER_TIERS_WEEKLY_HOUR");
        std::env::remove_var("KEEPER_UNRELATED_FLAG");
    }

    let config = result.expect("config should load");
    assert_eq!(config.storage.backups_dir, "/from/env");
    assert_eq!(config.storage.staging_keep, 5);
    assert_eq!(config.tiers.weekly.hour, 6);
}

#[test]
#[serial]
fn explicit_path_must_exist() {
    let dir = tempfile::tempdir().expect("temp dir");
    let missing = dir.path().join("nope.toml");
    assert!(load_and_validate_path(&missing).is_err());
}

#[test]
#[serial]
fn unknown_key_in_file_carries_source_span() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(file, "[scheduler]\npoll_intervall_secs = 10\n").unwrap();

    let errors = load_and_validate_path(file.path()).expect_err("should reject");
    match &errors[0] {
        ConfigError::UnknownKey {
            suggestion, span, ..
        } => {
            assert_eq!(suggestion.as_deref(), Some("poll_interval_secs"));
            if let Some(span) = span {
                assert_eq!(span.offset(), "[scheduler]\n".len());
            }
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}
