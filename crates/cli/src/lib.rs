#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `cli` implements the `oc-facl` command: `get`, `set` and `remove` over
//! the portable ACL store.
//!
//! ```text
//! oc-facl [-v...] [--no-dereference] [--strict-ids] get [--json] PATH...
//! oc-facl [-v...] [--no-dereference] [--strict-ids] set [--json] [--file FILE] PATH...
//! oc-facl [-v...] [--no-dereference] [--strict-ids] remove PATH...
//! ```
//!
//! # Design
//!
//! [`run`] parses arguments with clap, installs logging, builds an
//! [`AclStore`](store::AclStore) for the build target and hands off to
//! [`execute`], which is generic over the store so it can be driven by the
//! recording double in tests. Output streams are parameters; nothing writes
//! to the process's stdout or stderr directly.
//!
//! # Invariants
//!
//! - `set` parses its input once and applies the same ACL to every path.
//! - A failing path does not stop the remaining paths.
//!
//! # Errors
//!
//! Exit status is [`EXIT_SUCCESS`] when every path succeeded,
//! [`EXIT_FAILURE`] when any path or the ACL input failed, and
//! [`EXIT_USAGE`] for command-line mistakes.
//!
//! # Examples
//!
//! ```
//! let mut stdout = Vec::new();
//! let mut stderr = Vec::new();
//! let status = cli::run(["oc-facl", "--version"], &mut stdout, &mut stderr);
//! assert_eq!(status, cli::EXIT_SUCCESS);
//! assert!(String::from_utf8(stdout).unwrap().starts_with("oc-facl"));
//! ```

use std::ffi::OsString;
use std::io::{self, Write};
use std::sync::Arc;

use clap::error::ErrorKind;
use identity::{IdentityResolver, ResolverConfig};
use logging::{LoggingError, VerbosityConfig};
use store::{AclStore, StoreOptions};

mod args;
mod command;
mod document;
mod execute;

pub use crate::args::{AclSource, Action, Format, Invocation, parse_args};
pub use crate::command::PROGRAM_NAME;
pub use crate::document::{AclDocument, InputError, parse_json, parse_text, write_json, write_text};
pub use crate::execute::{EXIT_FAILURE, EXIT_SUCCESS, EXIT_USAGE, execute};

/// Parses `arguments` and runs the command against the native ACLs of the
/// build target, reading `set` input from standard input.
pub fn run<I, S, Out, Err>(arguments: I, stdout: &mut Out, stderr: &mut Err) -> i32
where
    I: IntoIterator<Item = S>,
    S: Into<OsString> + Clone,
    Out: Write,
    Err: Write,
{
    let invocation = match parse_args(arguments) {
        Ok(invocation) => invocation,
        Err(error) => return report_clap_error(&error, stdout, stderr),
    };

    let config = VerbosityConfig::from_verbose_level(invocation.verbosity).with_env();
    match logging::init_tracing(&config) {
        Ok(()) | Err(LoggingError::AlreadyInstalled(_)) => {}
        Err(error) => {
            let _ = writeln!(stderr, "{PROGRAM_NAME}: {error}");
            return EXIT_USAGE;
        }
    }

    let resolver = Arc::new(IdentityResolver::system(
        ResolverConfig::new().strict_ids(invocation.strict_ids),
    ));
    let options = StoreOptions::new().follow_symlinks(invocation.follow_symlinks);
    let store = AclStore::platform(resolver, options);
    execute(&invocation, &store, &mut io::stdin().lock(), stdout, stderr)
}

/// Converts a status returned by [`run`] into a process exit code.
#[must_use]
pub fn exit_code_from(status: i32) -> std::process::ExitCode {
    std::process::ExitCode::from(status.clamp(0, i32::from(u8::MAX)) as u8)
}

fn report_clap_error<Out: Write, Err: Write>(
    error: &clap::Error,
    stdout: &mut Out,
    stderr: &mut Err,
) -> i32 {
    match error.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = write!(stdout, "{error}");
            EXIT_SUCCESS
        }
        ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
            let _ = write!(stderr, "{error}");
            EXIT_USAGE
        }
        _ => {
            let _ = write!(stderr, "{}", error.render());
            EXIT_USAGE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_clamp_into_range() {
        assert_eq!(exit_code_from(0), std::process::ExitCode::SUCCESS);
        assert_eq!(exit_code_from(-3), std::process::ExitCode::SUCCESS);
        assert_eq!(exit_code_from(700), std::process::ExitCode::from(255));
    }

    #[test]
    fn missing_subcommand_is_a_usage_error() {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        assert_eq!(run(["oc-facl"], &mut stdout, &mut stderr), EXIT_USAGE);
        assert!(stdout.is_empty());
        assert!(!stderr.is_empty());
    }

    #[test]
    fn help_goes_to_stdout() {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        assert_eq!(run(["oc-facl", "--help"], &mut stdout, &mut stderr), EXIT_SUCCESS);
        let help = String::from_utf8(stdout).unwrap();
        assert!(help.contains("remove"));
        assert!(stderr.is_empty());
    }
}
