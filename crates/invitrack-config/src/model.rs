// SPDX-FileCopyrightText: 2026 Invitrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Invitrack invite tracker.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Invitrack configuration.
///
/// Every section is optional and falls back to its defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InvitrackConfig {
    /// Bot behavior: logging, approval roles, leaderboard size.
    #[serde(default)]
    pub bot: BotConfig,

    /// Discord credentials.
    #[serde(default)]
    pub discord: DiscordConfig,

    /// SQLite database location and connection settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Serialized transaction queue settings.
    #[serde(default)]
    pub queue: QueueConfig,
}

impl InvitrackConfig {
    /// Renders the config as TOML with the bot token masked.
    pub fn to_redacted_toml(&self) -> Result<String, toml::ser::Error> {
        let mut shown = self.clone();
        if let Some(token) = shown.discord.bot_token.as_mut() {
            *token = "<redacted>".to_string();
        }
        toml::to_string_pretty(&shown)
    }
}

/// Bot behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Minimum log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Role names whose grant approves a pending member and credits the inviter.
    #[serde(default = "default_special_roles")]
    pub special_roles: Vec<String>,

    /// Prefix of the marker role `<prefix>-<code>` given to members on join.
    #[serde(default = "default_pending_role_prefix")]
    pub pending_role_prefix: String,

    /// Rows returned by the leaderboard command.
    #[serde(default = "default_leaderboard_limit")]
    pub leaderboard_limit: usize,

    /// Delay before warming the invite cache after the gateway is ready.
    #[serde(default = "default_cache_warm_delay_ms")]
    pub cache_warm_delay_ms: u64,

    /// Attempts to start the Discord client before giving up.
    #[serde(default = "default_max_connect_attempts")]
    pub max_connect_attempts: u32,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            special_roles: default_special_roles(),
            pending_role_prefix: default_pending_role_prefix(),
            leaderboard_limit: default_leaderboard_limit(),
            cache_warm_delay_ms: default_cache_warm_delay_ms(),
            max_connect_attempts: default_max_connect_attempts(),
        }
    }
}

impl BotConfig {
    pub fn cache_warm_delay(&self) -> Duration {
        Duration::from_millis(self.cache_warm_delay_ms)
    }

    /// Name of the pending role for an invite code.
    pub fn pending_role_name(&self, code: &str) -> String {
        format!("{}-{code}", self.pending_role_prefix)
    }

    /// Extracts the invite code from a pending role name, if it is one.
    pub fn pending_role_code<'a>(&self, role_name: &'a str) -> Option<&'a str> {
        role_name
            .strip_prefix(self.pending_role_prefix.as_str())?
            .strip_prefix('-')
            .filter(|code| !code.is_empty())
    }

    pub fn is_special_role(&self, role_name: &str) -> bool {
        self.special_roles.iter().any(|r| r == role_name)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_special_roles() -> Vec<String> {
    vec!["Approved".to_string()]
}

fn default_pending_role_prefix() -> String {
    "pending".to_string()
}

fn default_leaderboard_limit() -> usize {
    10
}

fn default_cache_warm_delay_ms() -> u64 {
    1000
}

fn default_max_connect_attempts() -> u32 {
    5
}

/// Discord credentials.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DiscordConfig {
    /// Bot token. `None` makes `invitrack serve` refuse to start.
    #[serde(default)]
    pub bot_token: Option<String>,
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Directory holding the database file. Created if absent.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Base name of the database file (`<name>.db.sqlite`).
    #[serde(default = "default_database_name")]
    pub database_name: String,

    /// How long a statement waits on a locked database before failing.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            database_name: default_database_name(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl StorageConfig {
    /// Full path of the database file.
    pub fn database_file(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(format!("{}.db.sqlite", self.database_name))
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

fn default_data_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("invitrack").join("database"))
        .unwrap_or_else(|| PathBuf::from("database"))
        .to_string_lossy()
        .into_owned()
}

fn default_database_name() -> String {
    "invitrack".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    1000
}

/// Transaction queue configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueueConfig {
    /// Pause before each queued transaction is started.
    #[serde(default = "default_step_interval_ms")]
    pub step_interval_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            step_interval_ms: default_step_interval_ms(),
        }
    }
}

impl QueueConfig {
    pub fn step_interval(&self) -> Duration {
        Duration::from_millis(self.step_interval_ms)
    }
}

fn default_step_interval_ms() -> u64 {
    500
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_role_round_trip() {
        let bot = BotConfig::default();
        let name = bot.pending_role_name("AbC123");
        assert_eq!(name, "pending-AbC123");
        assert_eq!(bot.pending_role_code(&name), Some("AbC123"));
    }

    #[test]
    fn pending_role_code_rejects_other_roles() {
        let bot = BotConfig::default();
        assert_eq!(bot.pending_role_code("Approved"), None);
        assert_eq!(bot.pending_role_code("pending"), None);
        assert_eq!(bot.pending_role_code("pending-"), None);
        assert_eq!(bot.pending_role_code("pendingX-abc"), None);
    }

    #[test]
    fn special_role_match_is_exact() {
        let bot = BotConfig::default();
        assert!(bot.is_special_role("Approved"));
        assert!(!bot.is_special_role("approved"));
    }

    #[test]
    fn redacted_toml_hides_token_and_reloads() {
        let mut config = InvitrackConfig::default();
        config.discord.bot_token = Some("secret-token".to_string());

        let rendered = config.to_redacted_toml().unwrap();
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("<redacted>"));

        let reloaded: InvitrackConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(reloaded.bot.special_roles, config.bot.special_roles);
        assert_eq!(reloaded.queue.step_interval_ms, 500);
    }

    #[test]
    fn database_file_uses_name_and_suffix() {
        let storage = StorageConfig {
            data_dir: "/var/lib/invitrack".to_string(),
            database_name: "prod".to_string(),
            busy_timeout_ms: 1000,
        };
        assert_eq!(
            storage.database_file(),
            PathBuf::from("/var/lib/invitrack/prod.db.sqlite")
        );
    }
}
