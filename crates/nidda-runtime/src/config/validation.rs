//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{BotSettings, LogOutput, LogRotation, LoggingConfig, NiddaConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &NiddaConfig) -> ConfigResult<()> {
    validate_bot_settings(&config.bot)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

fn validate_bot_settings(bot: &BotSettings) -> ConfigResult<()> {
    if bot.command_prefix.trim().is_empty() {
        return Err(ConfigError::validation(
            "Command prefix must not be empty or whitespace",
        ));
    }

    if bot.command_prefix.chars().any(char::is_whitespace) {
        return Err(ConfigError::validation(format!(
            "Command prefix must not contain whitespace: {:?}",
            bot.command_prefix
        )));
    }

    if let Some(id) = &bot.bot_id
        && id.trim().is_empty()
    {
        return Err(ConfigError::missing_field("bot.bot_id"));
    }

    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    if logging.max_files == Some(0) {
        return Err(ConfigError::validation(
            "logging.max_files must be at least 1 when set",
        ));
    }

    if logging.max_files.is_some() && logging.rotation == LogRotation::Never {
        return Err(ConfigError::validation(
            "logging.max_files needs a rotation other than \"never\"",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&NiddaConfig::default()).is_ok());
    }

    #[test]
    fn test_prefix_rules() {
        let mut config = NiddaConfig::default();
        config.bot.command_prefix = String::new();
        assert!(validate_config(&config).is_err());

        config.bot.command_prefix = "! ".into();
        assert!(validate_config(&config).is_err());

        config.bot.command_prefix = "nidda,".into();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_blank_bot_id() {
        let mut config = NiddaConfig::default();
        config.bot.bot_id = Some(" ".into());
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { field }) if field == "bot.bot_id"
        ));
    }

    #[test]
    fn test_file_output_needs_path() {
        let mut config = NiddaConfig::default();
        config.logging.output = LogOutput::File;
        assert!(validate_config(&config).is_err());

        config.logging.file_path = Some("nidda.log".into());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_max_files_needs_rotation() {
        let mut config = NiddaConfig::default();
        config.logging.max_files = Some(3);
        assert!(validate_config(&config).is_err());

        config.logging.rotation = LogRotation::Daily;
        assert!(validate_config(&config).is_ok());

        config.logging.max_files = Some(0);
        assert!(validate_config(&config).is_err());
    }
}
