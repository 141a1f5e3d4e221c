// SPDX-FileCopyrightText: 2026 Invitrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks constraints serde attributes cannot express. All failures are
//! collected rather than stopping at the first one.

use crate::diagnostic::ConfigError;
use crate::model::InvitrackConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Upper bound on leaderboard rows per reply.
const MAX_LEADERBOARD_LIMIT: usize = 25;

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &InvitrackConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let level = config.bot.log_level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        fail(format!(
            "bot.log_level `{}` must be one of {}",
            config.bot.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.bot.special_roles.is_empty() {
        fail("bot.special_roles must name at least one role".to_string());
    }
    if config.bot.special_roles.iter().any(|r| r.trim().is_empty()) {
        fail("bot.special_roles must not contain empty names".to_string());
    }

    let prefix = &config.bot.pending_role_prefix;
    if prefix.trim().is_empty() {
        fail("bot.pending_role_prefix must not be empty".to_string());
    } else if prefix.contains('-') {
        fail(format!(
            "bot.pending_role_prefix `{prefix}` must not contain `-`"
        ));
    }

    if !(1..=MAX_LEADERBOARD_LIMIT).contains(&config.bot.leaderboard_limit) {
        fail(format!(
            "bot.leaderboard_limit must be between 1 and {MAX_LEADERBOARD_LIMIT}, got {}",
            config.bot.leaderboard_limit
        ));
    }

    if config.bot.max_connect_attempts == 0 {
        fail("bot.max_connect_attempts must be at least 1".to_string());
    }

    if let Some(token) = &config.discord.bot_token
        && token.trim().is_empty()
    {
        fail("discord.bot_token must not be empty when set".to_string());
    }

    if config.storage.data_dir.trim().is_empty() {
        fail("storage.data_dir must not be empty".to_string());
    }

    let name = &config.storage.database_name;
    if name.trim().is_empty() {
        fail("storage.database_name must not be empty".to_string());
    } else if name.contains(['/', '\\']) {
        fail(format!(
            "storage.database_name `{name}` must be a file name, not a path"
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_error(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        let config = InvitrackConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn unknown_log_level_fails_validation() {
        let mut config = InvitrackConfig::default();
        config.bot.log_level = "verbose".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "bot.log_level"));
    }

    #[test]
    fn log_level_is_case_insensitive() {
        let mut config = InvitrackConfig::default();
        config.bot.log_level = "DEBUG".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_special_roles_fails_validation() {
        let mut config = InvitrackConfig::default();
        config.bot.special_roles.clear();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "bot.special_roles"));
    }

    #[test]
    fn dashed_prefix_fails_validation() {
        let mut config = InvitrackConfig::default();
        config.bot.pending_role_prefix = "pending-invite".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "pending_role_prefix"));
    }

    #[test]
    fn leaderboard_limit_bounds() {
        let mut config = InvitrackConfig::default();
        config.bot.leaderboard_limit = 0;
        assert!(has_error(
            &validate_config(&config).unwrap_err(),
            "leaderboard_limit"
        ));

        config.bot.leaderboard_limit = 26;
        assert!(has_error(
            &validate_config(&config).unwrap_err(),
            "leaderboard_limit"
        ));

        config.bot.leaderboard_limit = 25;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn database_name_with_path_fails_validation() {
        let mut config = InvitrackConfig::default();
        config.storage.database_name = "../escape".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "storage.database_name"));
    }

    #[test]
    fn all_errors_are_collected() {
        let mut config = InvitrackConfig::default();
        config.bot.log_level = "loud".to_string();
        config.storage.data_dir = " ".to_string();
        config.discord.bot_token = Some(String::new());
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3, "got: {errors:?}");
    }
}
