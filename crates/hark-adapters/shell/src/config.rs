//! Configuration types for the shell adapter.
//!
//! Loaded from the `adapters.shell` section of the Hark configuration.
//!
//! # Example Configuration
//!
//! ```yaml
//! adapters:
//!   shell:
//!     user_name: ann
//!     user_id: 7
//!     room: terminal
//!     quit_command: exit
//! ```
//!
//! Every key can also be set through the environment, e.g.
//! `HARK_ADAPTERS__SHELL__USER_NAME=ann`.

use serde::{Deserialize, Deserializer, Serialize};

/// Shell adapter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Display name of the person at the terminal.
    #[serde(deserialize_with = "string_or_number")]
    pub user_name: String,

    /// Identifier of the person at the terminal.
    #[serde(deserialize_with = "string_or_number")]
    pub user_id: String,

    /// Room every terminal message is posted to.
    pub room: String,

    /// A line equal to this (ignoring surrounding whitespace) ends the session.
    pub quit_command: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            user_name: "Shell".to_string(),
            user_id: "1".to_string(),
            room: "shell".to_string(),
            quit_command: "quit".to_string(),
        }
    }
}

/// Accepts `7` as well as `"7"`; environment values that look numeric
/// arrive as numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Signed(i64),
        Unsigned(u64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Signed(n) => n.to_string(),
        Raw::Unsigned(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
user_name: ann
user_id: 7
room: terminal
quit_command: exit
"#;

        let config: ShellConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.user_name, "ann");
        assert_eq!(config.user_id, "7");
        assert_eq!(config.room, "terminal");
        assert_eq!(config.quit_command, "exit");
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let config: ShellConfig = serde_yaml::from_str("user_id: \"u-42\"").unwrap();
        assert_eq!(config.user_id, "u-42");
        assert_eq!(config, ShellConfig {
            user_id: "u-42".to_string(),
            ..Default::default()
        });
    }

    #[test]
    fn test_rejects_wrong_shape() {
        assert!(serde_yaml::from_str::<ShellConfig>("user_name: [a, b]").is_err());
    }
}
