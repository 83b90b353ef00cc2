//! crates/cli/src/args.rs
//! Parsed command-line arguments.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::ArgMatches;

use crate::command::clap_command;

/// Where `set` reads the new ACL from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AclSource {
    /// Standard input.
    Stdin,
    /// A file.
    File(PathBuf),
}

/// Format of ACL input and output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
    /// `getfacl`-style text.
    #[default]
    Text,
    /// JSON documents.
    Json,
}

/// The requested subcommand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// `get`: print each path's ACL.
    Get {
        /// Output format.
        format: Format,
        /// Paths to read.
        paths: Vec<PathBuf>,
    },
    /// `set`: apply one ACL to every path.
    Set {
        /// Input format.
        format: Format,
        /// Where the ACL comes from.
        source: AclSource,
        /// Paths to change.
        paths: Vec<PathBuf>,
    },
    /// `remove`: strip every path to its minimal ACL.
    Remove {
        /// Paths to change.
        paths: Vec<PathBuf>,
    },
}

impl Action {
    /// Returns the paths the action applies to.
    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        match self {
            Self::Get { paths, .. } | Self::Set { paths, .. } | Self::Remove { paths } => paths,
        }
    }
}

/// A fully parsed command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    /// Number of `-v` flags.
    pub verbosity: u8,
    /// Whether symbolic links are followed.
    pub follow_symlinks: bool,
    /// Whether numeric ids must exist in the account database.
    pub strict_ids: bool,
    /// The subcommand.
    pub action: Action,
}

/// Parses `args`, the first of which is the program name.
///
/// # Errors
///
/// Returns clap's error for usage mistakes and for `--help`/`--version`.
pub fn parse_args<I, S>(args: I) -> Result<Invocation, clap::Error>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString> + Clone,
{
    let matches = clap_command().try_get_matches_from(args)?;
    Ok(Invocation {
        verbosity: matches.get_count("verbose"),
        follow_symlinks: !matches.get_flag("no-dereference"),
        strict_ids: matches.get_flag("strict-ids"),
        action: action(&matches),
    })
}

fn action(matches: &ArgMatches) -> Action {
    match matches.subcommand() {
        Some(("set", sub)) => Action::Set {
            format: format(sub),
            source: match sub.get_one::<PathBuf>("file") {
                Some(file) if file.as_os_str() != "-" => AclSource::File(file.clone()),
                _ => AclSource::Stdin,
            },
            paths: paths(sub),
        },
        Some(("remove", sub)) => Action::Remove { paths: paths(sub) },
        Some((_, sub)) => Action::Get {
            format: format(sub),
            paths: paths(sub),
        },
        None => Action::Get {
            format: Format::Text,
            paths: Vec::new(),
        },
    }
}

fn format(matches: &ArgMatches) -> Format {
    if matches.get_flag("json") {
        Format::Json
    } else {
        Format::Text
    }
}

fn paths(matches: &ArgMatches) -> Vec<PathBuf> {
    matches
        .get_many::<PathBuf>("paths")
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}
