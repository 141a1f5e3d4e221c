// SPDX-FileCopyrightText: 2026 Invitrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `invitrack check-config` command.

use invitrack_config::InvitrackConfig;
use invitrack_core::InvitrackError;

/// Summary of a validated config followed by its effective TOML.
pub fn report(config: &InvitrackConfig) -> Result<String, InvitrackError> {
    let rendered = config
        .to_redacted_toml()
        .map_err(|e| InvitrackError::Config(format!("failed to render configuration: {e}")))?;

    let token = match invitrack_discord::bot_token(&config.discord) {
        Ok(_) => "set",
        Err(_) => "missing (required by `invitrack serve`)",
    };

    Ok(format!(
        "configuration is valid\n\
         database: {}\n\
         bot token: {token}\n\
         \n{rendered}",
        config.storage.database_file().display()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_flags_missing_token() {
        let report = report(&InvitrackConfig::default()).unwrap();
        assert!(report.starts_with("configuration is valid\n"));
        assert!(report.contains("bot token: missing"));
        assert!(report.contains("invitrack.db.sqlite"));
        assert!(report.contains("[queue]"));
    }

    #[test]
    fn report_never_prints_token() {
        let mut config = InvitrackConfig::default();
        config.discord.bot_token = Some("very-secret".into());

        let report = report(&config).unwrap();
        assert!(report.contains("bot token: set"));
        assert!(!report.contains("very-secret"));
    }
}
