//! crates/logging/src/subscriber.rs
//! Builds and installs the fmt subscriber.

use std::io;

use thiserror::Error;
use tracing::Subscriber;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

use crate::config::VerbosityConfig;

/// Failure to set up logging.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The filter directive could not be parsed.
    #[error("invalid log filter '{directive}': {source}")]
    Filter {
        /// The rejected directive.
        directive: String,
        /// Parser error.
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },
    /// A global subscriber was already installed.
    #[error("a global tracing subscriber is already installed")]
    AlreadyInstalled(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Parses the filter `config` describes.
pub fn build_filter(config: &VerbosityConfig) -> Result<EnvFilter, LoggingError> {
    let directive = config.directive();
    EnvFilter::try_new(&directive).map_err(|source| LoggingError::Filter { directive, source })
}

/// Builds a subscriber that writes events accepted by `config` to `writer`.
pub fn subscriber<W>(
    config: &VerbosityConfig,
    writer: W,
) -> Result<impl Subscriber + Send + Sync + 'static, LoggingError>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = build_filter(config)?;
    Ok(tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(config.ansi_enabled())
        .with_target(config.level() >= 2)
        .without_time()
        .finish())
}

/// Installs the global subscriber, writing to standard error.
///
/// # Errors
///
/// Fails when the directive does not parse or a subscriber is already
/// installed; logging stays as it was.
pub fn init_tracing(config: &VerbosityConfig) -> Result<(), LoggingError> {
    let subscriber = subscriber(config, io::stderr)?;
    tracing::subscriber::set_global_default(subscriber)?;
    tracing::debug!(
        target: "facl::logging",
        directive = %config.directive(),
        "logging initialised"
    );
    Ok(())
}
