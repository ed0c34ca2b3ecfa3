//! CLI runner for common setup.
//!
//! Loads configuration (file, then environment), initializes logging and
//! builds the async runtime so command handlers only deal with their own
//! flags.

use std::path::{Path, PathBuf};

use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;
use tracing::info;

use alertmap::config::{ConfigFile, PipelineConfig};
use alertmap::logging::{default_log_dir, default_log_file, init_logging, LoggingGuard};
use alertmap::provider::ReqwestClient;

use crate::error::CliError;

/// Options shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub config: Option<PathBuf>,
    pub verbose: bool,
}

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Keeps the log file writer alive while the runner exists
    _logging_guard: Option<LoggingGuard>,
    config: ConfigFile,
}

impl CliRunner {
    /// Load configuration and start logging to `logs/alertmap.log`.
    pub fn new(options: &GlobalOptions) -> Result<Self, CliError> {
        let config = load_config(options.config.as_deref())?;

        let level = if options.verbose { "debug" } else { "info" };
        let guard = init_logging(Path::new(default_log_dir()), default_log_file(), level)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            _logging_guard: Some(guard),
            config,
        })
    }

    /// Load configuration without logging, for commands that only print.
    pub fn quiet(options: &GlobalOptions) -> Result<Self, CliError> {
        Ok(Self {
            _logging_guard: None,
            config: load_config(options.config.as_deref())?,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!(
            version = env!("CARGO_PKG_VERSION"),
            command, "alertmap starting"
        );
    }

    /// Multi-threaded runtime for the async stages.
    pub fn runtime(&self) -> Result<Runtime, CliError> {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| CliError::Runtime(format!("Failed to create Tokio runtime: {}", e)))
    }

    /// HTTP client honoring the configured request timeout.
    pub fn http_client(&self, config: &PipelineConfig) -> Result<ReqwestClient, CliError> {
        ReqwestClient::with_timeout(config.request_timeout_secs).map_err(CliError::Http)
    }

    /// Token cancelled on the first Ctrl+C.
    ///
    /// In-flight tile requests finish; nothing new is scheduled.
    pub fn cancel_on_ctrlc(&self) -> Result<CancellationToken, CliError> {
        let token = CancellationToken::new();
        let handler_token = token.clone();

        ctrlc::set_handler(move || {
            eprintln!();
            eprintln!("Received interrupt, finishing in-flight tiles...");
            handler_token.cancel();
        })
        .map_err(|e| CliError::Runtime(format!("Failed to set signal handler: {}", e)))?;

        Ok(token)
    }
}

fn load_config(path: Option<&Path>) -> Result<ConfigFile, CliError> {
    let mut config = match path {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };
    config.apply_environment()?;
    Ok(config)
}
