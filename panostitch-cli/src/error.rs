//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use panostitch::config::ConfigFileError;
use panostitch::grid::ResolutionError;
use panostitch::pipeline::PipelineError;
use panostitch::queue::QueueError;
use panostitch::source::SourceError;
use std::fmt;
use std::process;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(ConfigFileError),
    /// Failed to create the HTTP client
    Client(SourceError),
    /// A run failed fatally
    Pipeline(PipelineError),
    /// Queue file problem
    Queue(QueueError),
    /// Bad command-line argument combination
    InvalidArgument(String),
    /// Some identifiers in a batch failed fatally
    Batch { failed: usize, total: usize },
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Pipeline(PipelineError::Resolution(ResolutionError::NotFound {
                ..
            })) => {
                eprintln!();
                eprintln!("The source has no panorama under that identifier. Check the");
                eprintln!("identifier against the panorama's page URL.");
            }
            CliError::Pipeline(PipelineError::Resolution(ResolutionError::Ambiguous {
                ..
            })) => {
                eprintln!();
                eprintln!("The grid shape could not be determined by probing. If the source");
                eprintln!("is flaky right now, retrying later often resolves this.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "configuration error: {}", e),
            CliError::Client(e) => write!(f, "failed to create HTTP client: {}", e),
            CliError::Pipeline(e) => write!(f, "{}", e),
            CliError::Queue(e) => write!(f, "{}", e),
            CliError::InvalidArgument(msg) => write!(f, "{}", msg),
            CliError::Batch { failed, total } => {
                write!(f, "{} of {} identifiers failed", failed, total)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Client(e) => Some(e),
            CliError::Pipeline(e) => Some(e),
            CliError::Queue(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PipelineError> for CliError {
    fn from(e: PipelineError) -> Self {
        CliError::Pipeline(e)
    }
}

impl From<ResolutionError> for CliError {
    fn from(e: ResolutionError) -> Self {
        CliError::Pipeline(PipelineError::Resolution(e))
    }
}

impl From<QueueError> for CliError {
    fn from(e: QueueError) -> Self {
        CliError::Queue(e)
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}
