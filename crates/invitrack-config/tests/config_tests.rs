// SPDX-FileCopyrightText: 2026 Invitrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Invitrack configuration system.

use invitrack_config::diagnostic::ConfigError;
use invitrack_config::model::InvitrackConfig;
use invitrack_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_config() {
    let toml = r#"
[bot]
log_level = "debug"
special_roles = ["Approved", "Verified"]
pending_role_prefix = "awaiting"
leaderboard_limit = 5
cache_warm_delay_ms = 250
max_connect_attempts = 3

[discord]
bot_token = "abc.def.ghi"

[storage]
data_dir = "/tmp/invitrack"
database_name = "test"
busy_timeout_ms = 2000

[queue]
step_interval_ms = 50
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.bot.log_level, "debug");
    assert_eq!(config.bot.special_roles, vec!["Approved", "Verified"]);
    assert_eq!(config.bot.pending_role_prefix, "awaiting");
    assert_eq!(config.bot.leaderboard_limit, 5);
    assert_eq!(config.bot.cache_warm_delay_ms, 250);
    assert_eq!(config.bot.max_connect_attempts, 3);
    assert_eq!(config.discord.bot_token.as_deref(), Some("abc.def.ghi"));
    assert_eq!(config.storage.data_dir, "/tmp/invitrack");
    assert_eq!(config.storage.database_name, "test");
    assert_eq!(config.storage.busy_timeout_ms, 2000);
    assert_eq!(config.queue.step_interval_ms, 50);
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_optional_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.bot.log_level, "info");
    assert_eq!(config.bot.special_roles, vec!["Approved"]);
    assert_eq!(config.bot.pending_role_prefix, "pending");
    assert_eq!(config.bot.leaderboard_limit, 10);
    assert_eq!(config.bot.cache_warm_delay_ms, 1000);
    assert_eq!(config.bot.max_connect_attempts, 5);
    assert!(config.discord.bot_token.is_none());
    assert_eq!(config.storage.database_name, "invitrack");
    assert_eq!(config.storage.busy_timeout_ms, 1000);
    assert_eq!(config.queue.step_interval_ms, 500);
}

/// Unknown field in [bot] produces an unknown-field error.
#[test]
fn unknown_field_in_bot_produces_error() {
    let toml = r#"
[bot]
log_levl = "debug"
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("log_levl"),
        "error should mention unknown field or the bad key, got: {err_str}"
    );
}

/// Unexpected top-level section is rejected by deny_unknown_fields.
#[test]
fn deny_unknown_fields_at_top_level() {
    let toml = r#"
[telegram]
bot_token = "nope"
"#;

    let err = load_config_from_str(toml).expect_err("unknown section should be rejected");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("telegram"),
        "error should mention unknown field, got: {err_str}"
    );
}

/// Dotted overrides (what the env provider produces) reach nested keys.
#[test]
fn dotted_override_sets_bot_token() {
    use figment::{providers::Serialized, Figment};

    let config: InvitrackConfig = Figment::new()
        .merge(Serialized::defaults(InvitrackConfig::default()))
        .merge(("discord.bot_token", "from-env"))
        .extract()
        .expect("should set bot_token via dot notation");

    assert_eq!(config.discord.bot_token.as_deref(), Some("from-env"));
}

/// INVITRACK_* variables override values from an explicit file.
#[test]
fn env_vars_override_file_values() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "custom.toml",
            r#"
[storage]
database_name = "from-file"

[queue]
step_interval_ms = 20
"#,
        )?;
        jail.set_env("INVITRACK_STORAGE_DATABASE_NAME", "from-env");
        jail.set_env("INVITRACK_DISCORD_BOT_TOKEN", "token-from-env");

        let config = load_and_validate_path(std::path::Path::new("custom.toml"))
            .map_err(|errors| format!("{errors:?}"))?;
        assert_eq!(config.storage.database_name, "from-env");
        assert_eq!(config.discord.bot_token.as_deref(), Some("token-from-env"));
        assert_eq!(config.queue.step_interval_ms, 20);
        Ok(())
    });
}

/// A missing explicit file falls back to defaults.
#[test]
fn missing_config_file_silently_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    let config = load_and_validate_path(&path).expect("missing file should be skipped");
    assert_eq!(config.bot.pending_role_prefix, "pending");
}

/// Error output from load_and_validate_str names the key and suggests a fix.
#[test]
fn diagnostic_error_includes_unknown_key_and_suggestion() {
    let toml = r#"
[storage]
database_nme = "bot"
"#;

    let errors = load_and_validate_str(toml).expect_err("should produce errors");
    let has_unknown_key = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, suggestion, valid_keys, .. } if {
            key == "database_nme"
                && suggestion.as_deref() == Some("database_name")
                && valid_keys.contains("busy_timeout_ms")
        })
    });
    assert!(
        has_unknown_key,
        "should have UnknownKey error for 'database_nme', got: {errors:?}"
    );
}

/// Invalid type (string where number expected) produces a clear message.
#[test]
fn diagnostic_invalid_type_message() {
    let toml = r#"
[queue]
step_interval_ms = "fast"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject invalid type");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("step_interval_ms"))),
        "should name the mistyped key, got: {errors:?}"
    );
}

/// ConfigError can be rendered using miette's graphical handler.
#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let error = ConfigError::UnknownKey {
        key: "prefx".to_string(),
        suggestion: Some("pending_role_prefix".to_string()),
        valid_keys: "log_level, special_roles, pending_role_prefix".to_string(),
        span: None,
        src: None,
    };

    assert!(error.code().is_some(), "should have diagnostic code");
    let help = error.help().expect("should have help text").to_string();
    assert!(help.contains("did you mean `pending_role_prefix`"), "got: {help}");

    let mut buf = String::new();
    GraphicalReportHandler::new()
        .render_report(&mut buf, &error)
        .expect("should render without error");
    assert!(buf.contains("prefx"), "rendered report should mention the key");
}

/// Validation failures surface through load_and_validate_str.
#[test]
fn validation_catches_zero_leaderboard_limit() {
    let toml = r#"
[bot]
leaderboard_limit = 0
"#;

    let errors = load_and_validate_str(toml).expect_err("zero limit should fail");
    assert!(errors.iter().any(|e| {
        matches!(e, ConfigError::Validation { message } if message.contains("leaderboard_limit"))
    }));
}
