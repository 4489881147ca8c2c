//! Configuration validation.

use super::error::{ConfigError, ConfigResult};
use super::schema::{DispatchConfig, HarkConfig, LogFormat, LogOutput, LoggingConfig, RobotConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &HarkConfig) -> ConfigResult<()> {
    validate_robot_config(&config.robot)?;
    validate_dispatch_config(&config.dispatch)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

fn validate_robot_config(robot: &RobotConfig) -> ConfigResult<()> {
    if robot.name.is_empty() {
        return Err(ConfigError::validation("robot.name must not be empty"));
    }

    // Addressing compares against a single whitespace-delimited token.
    if robot.name.chars().any(char::is_whitespace) {
        return Err(ConfigError::validation(format!(
            "robot.name must not contain whitespace: '{}'",
            robot.name
        )));
    }

    Ok(())
}

fn validate_dispatch_config(dispatch: &DispatchConfig) -> ConfigResult<()> {
    if dispatch.handler_timeout_ms == Some(0) {
        return Err(ConfigError::validation(
            "dispatch.handler_timeout_ms must be greater than 0",
        ));
    }
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::validation(
            "logging.file_path is required when logging.output = \"file\"",
        ));
    }

    if logging.filters.keys().any(|target| target.trim().is_empty()) {
        return Err(ConfigError::validation(
            "logging.filters keys must be non-empty targets",
        ));
    }

    if logging.format == LogFormat::Json && !cfg!(feature = "json-log") {
        return Err(ConfigError::validation(
            "logging.format = \"json\" requires the json-log feature",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn with_name(name: &str) -> HarkConfig {
        let mut config = HarkConfig::default();
        config.robot.name = name.to_string();
        config
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&HarkConfig::default()).is_ok());
    }

    #[test]
    fn test_robot_name_rules() {
        assert!(validate_config(&with_name("Pybot")).is_ok());
        assert!(validate_config(&with_name("")).is_err());
        assert!(validate_config(&with_name("Py bot")).is_err());
        assert!(validate_config(&with_name("Pybot\t")).is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = HarkConfig::default();
        config.dispatch.handler_timeout_ms = Some(0);
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::Validation { .. })
        ));

        config.dispatch.handler_timeout_ms = Some(10);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_file_output_requires_path() {
        let mut config = HarkConfig::default();
        config.logging.output = LogOutput::File;
        assert!(validate_config(&config).is_err());

        config.logging.file_path = Some(PathBuf::from("logs/hark.log"));
        assert!(validate_config(&config).is_ok());
    }

    #[cfg(not(feature = "json-log"))]
    #[test]
    fn test_json_requires_feature() {
        let mut config = HarkConfig::default();
        config.logging.format = LogFormat::Json;
        assert!(validate_config(&config).is_err());
    }
}
