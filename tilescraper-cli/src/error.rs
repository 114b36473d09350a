//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and a non-zero exit code.

use std::fmt;
use std::process;

use tilescraper::config::ConfigFileError;
use tilescraper::ScrapeError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Invalid command-line argument
    InvalidArgument(String),
    /// The scrape could not be set up
    Setup(ScrapeError),
    /// The scrape ran but failed
    ScrapeFailed(String),
    /// The scrape was interrupted
    Canceled,
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Setup(ScrapeError::ReadOnlySink) => {
                eprintln!();
                eprintln!("The cache directory must be writable by the current user.");
            }
            CliError::Config(_) => {
                eprintln!();
                eprintln!(
                    "Check the configuration file (default: {})",
                    tilescraper::config::config_file_path().display()
                );
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            CliError::Setup(e) => write!(f, "Failed to start scrape: {}", e),
            CliError::ScrapeFailed(detail) => write!(f, "Scrape failed: {}", detail),
            CliError::Canceled => write!(f, "Scrape canceled"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Setup(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ScrapeError> for CliError {
    fn from(e: ScrapeError) -> Self {
        CliError::Setup(e)
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}
