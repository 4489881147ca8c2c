//! Process-level orchestration.
//!
//! [`HarkRuntime`] turns a loaded configuration into a running robot:
//!
//! ```rust,ignore
//! use hark_runtime::HarkRuntime;
//! use hark_adapter_shell::ShellAdapter;
//!
//! let runtime = HarkRuntime::builder().profile("dev").build()?;
//! let robot = runtime.create_robot::<ShellAdapter>()?;
//!
//! robot.hear("ping", |res: Response| async move { res.send("pong").await })?;
//!
//! // Until the transport ends or Ctrl+C / SIGTERM arrives.
//! runtime.run(&robot).await?;
//! ```

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use hark_core::{ConfigurableAdapter, DISCONNECTED, Robot};
use tokio::signal;
use tracing::{debug, error, info, warn};

use crate::config::{ConfigLoader, ConfigResult, HarkConfig, validate_config};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;

/// Builds robots from configuration and drives them until shutdown.
#[derive(Debug, Clone)]
pub struct HarkRuntime {
    config: HarkConfig,
}

impl HarkRuntime {
    /// Creates a runtime builder.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from an already loaded configuration.
    ///
    /// The configuration is validated and the global logger is installed
    /// from `config.logging` (unless one is already installed).
    pub fn from_config(config: HarkConfig) -> ConfigResult<Self> {
        validate_config(&config)?;
        logging::init_from_config(&config.logging);

        info!(
            robot = %config.robot.name,
            log_level = %config.logging.level,
            log_format = ?config.logging.format,
            "Runtime initialized from configuration"
        );
        Ok(Self { config })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &HarkConfig {
        &self.config
    }

    /// Resolves the configuration for adapter `A`.
    ///
    /// Reads `adapters.<A::name()>`, falling back to `A::Config::default()`
    /// when the section is absent.
    pub fn adapter_config<A: ConfigurableAdapter>(&self) -> RuntimeResult<A::Config> {
        let adapter = A::name();
        match self.config.adapters.get(adapter) {
            Some(value) => value
                .deserialize()
                .map_err(|source| RuntimeError::AdapterConfig { adapter, source }),
            None => {
                debug!(adapter, "No configuration section for adapter, using defaults");
                Ok(A::Config::default())
            }
        }
    }

    /// Creates a robot with the configured name, handler timeout and an
    /// adapter of type `A`.
    pub fn create_robot<A>(&self) -> RuntimeResult<Robot>
    where
        A: ConfigurableAdapter + 'static,
    {
        let adapter = A::from_config(self.adapter_config::<A>()?)?;
        let robot = Robot::new(self.config.robot.name.clone(), Arc::new(adapter));
        robot.set_handler_timeout(self.config.dispatch.handler_timeout());

        info!(
            robot = %robot.name(),
            adapter = A::name(),
            handler_timeout = ?robot.handler_timeout(),
            "Robot created"
        );
        Ok(robot)
    }

    /// Runs `robot` until its transport loop ends or the process receives
    /// Ctrl+C or SIGTERM.
    pub async fn run(&self, robot: &Robot) -> RuntimeResult<()> {
        info!(robot = %robot.name(), "Hark is running. Press Ctrl+C to stop.");
        self.run_until(robot, wait_for_shutdown()).await
    }

    /// Runs `robot` until its transport loop ends or `shutdown` resolves.
    ///
    /// When `shutdown` wins, the transport loop is dropped, `"disconnected"`
    /// is emitted and the adapter is closed.
    pub async fn run_until<F>(&self, robot: &Robot, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            result = robot.run() => {
                if let Err(e) = &result {
                    error!(error = %e, "Transport loop failed");
                }
                result?;
                info!("Transport loop ended");
            }
            () = shutdown => {
                robot.emit(DISCONNECTED, None);
                robot.shutdown().await?;
                info!("Runtime stopped");
            }
        }
        Ok(())
    }
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = signal::ctrl_c() => info!("Received Ctrl+C, shutting down"),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                }
                return;
            }
            Err(e) => warn!(error = %e, "Failed to register SIGTERM handler"),
        }
    }

    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => {
            warn!(error = %e, "Failed to listen for Ctrl+C, running until the transport ends");
            std::future::pending::<()>().await;
        }
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for a [`HarkRuntime`] with custom configuration sources.
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
}

impl RuntimeBuilder {
    /// Creates a builder using the default search paths and environment.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new(),
        }
    }

    /// Loads exactly this configuration file.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g. "development", "production").
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Disables `HARK_*` environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges a programmatic base layer beneath files and environment.
    pub fn merge(mut self, config: HarkConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Overrides a single dotted configuration key.
    pub fn set<V: serde::Serialize>(mut self, key: &str, value: V) -> Self {
        self.config_loader = self.config_loader.set(key, value);
        self
    }

    /// Loads the configuration and builds the runtime.
    pub fn build(self) -> ConfigResult<HarkRuntime> {
        HarkRuntime::from_config(self.config_loader.load()?)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
