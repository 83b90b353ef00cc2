#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logging` turns the command line's `-v` count into a `tracing`
//! subscriber. The library crates only emit events through the `tracing`
//! facade under `facl::` targets; this crate decides which of them reach
//! standard error.
//!
//! # Design
//!
//! [`VerbosityConfig`] maps the verbosity count to an
//! [`EnvFilter`](tracing_subscriber::EnvFilter) directive. The
//! [`LOG_ENV`] variable, when set, replaces that directive wholesale.
//! [`subscriber`] builds a fmt subscriber over any writer and
//! [`init_tracing`] installs one on standard error as the global default.
//!
//! # Invariants
//!
//! - Level 0 only shows warnings and errors.
//! - Events outside the `facl` targets never go below `warn` before level 3.
//!
//! # Errors
//!
//! [`LoggingError`] reports an unparseable override or a second
//! installation attempt.
//!
//! # Examples
//!
//! ```
//! use logging::VerbosityConfig;
//!
//! let config = VerbosityConfig::from_verbose_level(2);
//! assert_eq!(config.directive(), "warn,facl=debug");
//! logging::build_filter(&config).unwrap();
//! ```

mod config;
mod subscriber;

pub use crate::config::{LOG_ENV, TARGET_PREFIX, VerbosityConfig};
pub use crate::subscriber::{LoggingError, build_filter, init_tracing, subscriber};
