//! Layered configuration loading with figment.
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Built-in defaults
//! 2. Programmatic base layers ([`ConfigLoader::merge`])
//! 3. Profile-specific file (`hark.{profile}.toml` / `hark.{profile}.yaml`)
//! 4. Main file (`hark.toml` / `hark.yaml` / `hark.yml`)
//! 5. Environment variables (`HARK_*`)
//! 6. Programmatic overrides ([`ConfigLoader::set`])
//!
//! # Feature Flags
//!
//! - `toml-config` *(default)*: TOML files
//! - `yaml-config`: YAML files
//!
//! # Environment Variable Mapping
//!
//! The `HARK_` prefix is stripped, keys are lowercased and `__` separates
//! nesting levels:
//!
//! - `HARK_ROBOT__NAME=Pybot` → `robot.name = "Pybot"`
//! - `HARK_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//! - `HARK_ADAPTERS__SHELL__USER_NAME=ann` → `adapters.shell.user_name = "ann"`
//!
//! `HARK_PROFILE` selects the profile.
//!
//! # Example
//!
//! ```rust,ignore
//! let config = ConfigLoader::new()
//!     .profile("production")
//!     .file("./deploy/hark.toml")
//!     .load()?;
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "toml-config", feature = "yaml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::HarkConfig;
use super::validation::validate_config;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "HARK_";

/// Environment variable selecting the profile.
pub const PROFILE_ENV: &str = "HARK_PROFILE";

/// Configuration profile, used to pick `hark.{profile}.*` overlay files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Profile {
    #[default]
    Development,
    Production,
    Custom(String),
}

impl Profile {
    /// Returns the profile name as used in file names.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Parses a profile name, accepting `dev` and `prod` shorthands.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Reads `HARK_PROFILE`, defaulting to development.
    pub fn from_env() -> Self {
        std::env::var(PROFILE_ENV)
            .map(|p| Self::parse(&p))
            .unwrap_or_default()
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration loader with figment-based multi-source support.
pub struct ConfigLoader {
    figment: Figment,
    overrides: Figment,
    profile: Profile,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader that searches the default locations and reads the
    /// environment.
    pub fn new() -> Self {
        Self {
            figment: Figment::new(),
            overrides: Figment::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    /// Sets the configuration profile.
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.profile = Profile::parse(profile.as_ref());
        self
    }

    /// Adds a search path for configuration files.
    ///
    /// Once any search path is given, the defaults (current directory and
    /// the user config directory) are no longer searched.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Adds `<user config dir>/hark` to the search paths.
    pub fn with_user_config_dir(self) -> Self {
        match dirs::config_dir() {
            Some(dir) => self.search_path(dir.join("hark")),
            None => self,
        }
    }

    /// Loads exactly this file instead of searching.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables `HARK_*` environment variables (the default).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Disables `HARK_*` environment variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges a programmatic base layer above the built-in defaults.
    ///
    /// Files and the environment still take precedence over it. Use
    /// [`set`](Self::set) for values that must win.
    pub fn merge(mut self, config: HarkConfig) -> Self {
        self.figment = self.figment.merge(Serialized::defaults(config));
        self
    }

    /// Overrides a single dotted key, e.g. `set("robot.name", "Pybot")`.
    ///
    /// Overrides are applied after files and environment variables.
    pub fn set<V: Serialize>(mut self, key: &str, value: V) -> Self {
        self.overrides = self.overrides.merge(Serialized::default(key, value));
        self
    }

    /// Loads and validates the configuration.
    pub fn load(self) -> ConfigResult<HarkConfig> {
        let profile = self.profile.clone();
        let config: HarkConfig = self.build_figment()?.extract()?;
        validate_config(&config)?;

        debug!(
            profile = %profile,
            robot = %config.robot.name,
            logging_level = %config.logging.level,
            adapters = config.adapters.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    fn build_figment(mut self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(HarkConfig::default()))
            .merge(std::mem::take(&mut self.figment));

        match self.config_file.take() {
            Some(path) if path.exists() => {
                info!(path = %path.display(), "Loading configuration file");
                figment = merge_config_file(figment, &path)?;
            }
            Some(path) => return Err(ConfigError::FileNotFound(path)),
            None => figment = self.load_config_files(figment),
        }

        if self.load_env {
            trace!(prefix = ENV_PREFIX, "Loading environment variables");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }

        Ok(figment.merge(self.overrides))
    }

    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }
        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd);
        }
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("hark"));
        }
        paths
    }

    /// Looks for the first directory containing a main file of an enabled
    /// format. The profile overlay in that directory is merged beneath it.
    fn load_config_files(&self, mut figment: Figment) -> Figment {
        for dir in self.resolve_search_paths() {
            for (stem_ext, ext) in enabled_file_names() {
                let base = dir.join(stem_ext);
                if !base.exists() {
                    continue;
                }

                let overlay = dir.join(format!("hark.{}.{ext}", self.profile));
                if overlay.exists() {
                    debug!(path = %overlay.display(), "Loading profile-specific config");
                    figment = merge_by_extension(figment, &overlay, ext);
                }

                info!(path = %base.display(), "Loading configuration file");
                return merge_by_extension(figment, &base, ext);
            }
        }

        warn!("No configuration file found, using defaults");
        figment
    }
}

/// Main file names to search for, with their extension.
fn enabled_file_names() -> Vec<(&'static str, &'static str)> {
    let mut names = Vec::new();
    #[cfg(feature = "toml-config")]
    names.push(("hark.toml", "toml"));
    #[cfg(feature = "yaml-config")]
    names.extend([("hark.yaml", "yaml"), ("hark.yml", "yml")]);
    names
}

fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let supported = enabled_file_names().iter().any(|(_, e)| *e == ext);
    if supported {
        Ok(merge_by_extension(figment, path, ext))
    } else {
        Err(ConfigError::UnsupportedFormat(ext.to_string()))
    }
}

fn merge_by_extension(figment: Figment, path: &Path, ext: &str) -> Figment {
    match ext {
        #[cfg(feature = "toml-config")]
        "toml" => figment.merge(Toml::file(path)),
        #[cfg(feature = "yaml-config")]
        "yaml" | "yml" => figment.merge(Yaml::file(path)),
        _ => figment,
    }
}

/// Loads configuration from the default locations.
pub fn load_config() -> ConfigResult<HarkConfig> {
    ConfigLoader::new().load()
}

/// Loads configuration from `path`, with environment overrides.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<HarkConfig> {
    ConfigLoader::new().file(path).load()
}

// =============================================================================
// Tests
// =============================================================================
