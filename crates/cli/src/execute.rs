//! crates/cli/src/execute.rs
//! Runs a parsed [`Invocation`] against an [`AclStore`].

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use identity::Directory;
use model::{Acl, Subject};
use store::{AclStore, AclSystem, StoreError};

use crate::args::{AclSource, Action, Format, Invocation};
use crate::command::PROGRAM_NAME;
use crate::document::{self, AclDocument, InputError, principal_label};

/// Exit status for success.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit status when any path failed.
pub const EXIT_FAILURE: i32 = 1;
/// Exit status for usage errors.
pub const EXIT_USAGE: i32 = 2;

const CLI_TARGET: &str = "facl::cli";

/// Executes `invocation`, reporting one error line per failed path on
/// `stderr` and carrying on with the remaining paths.
pub fn execute<S, D, In, Out, Err>(
    invocation: &Invocation,
    store: &AclStore<S, D>,
    stdin: &mut In,
    stdout: &mut Out,
    stderr: &mut Err,
) -> i32
where
    S: AclSystem,
    D: Directory,
    In: Read,
    Out: Write,
    Err: Write,
{
    let operation = match &invocation.action {
        Action::Get { format, .. } => Operation::Get(*format),
        Action::Set { format, source, .. } => match read_input(*format, source, stdin) {
            Ok(acl) => Operation::Set(acl),
            Err(message) => {
                let _ = writeln!(stderr, "{PROGRAM_NAME}: {message}");
                return EXIT_FAILURE;
            }
        },
        Action::Remove { .. } => Operation::Remove,
    };

    let mut status = EXIT_SUCCESS;
    for path in invocation.action.paths() {
        let result = match &operation {
            Operation::Get(format) => print_acl(store, path, *format, stdout),
            Operation::Set(acl) => store.set_acl(path, acl).map_err(Failure::Store),
            Operation::Remove => store.remove_acl(path).map_err(Failure::Store),
        };
        if let Err(failure) = result {
            tracing::debug!(target: CLI_TARGET, path = %path.display(), error = %failure, "path failed");
            let _ = writeln!(stderr, "{PROGRAM_NAME}: {failure}");
            status = EXIT_FAILURE;
        }
    }
    status
}

enum Operation {
    Get(Format),
    Set(Acl),
    Remove,
}

#[derive(Debug, thiserror::Error)]
enum Failure {
    #[error(transparent)]
    Store(StoreError),
    #[error("{}: failed to write output: {source}", path.display())]
    Output {
        path: std::path::PathBuf,
        source: io::Error,
    },
}

fn read_input<In: Read>(format: Format, source: &AclSource, stdin: &mut In) -> Result<Acl, String> {
    let text = match source {
        AclSource::Stdin => {
            let mut text = String::new();
            stdin
                .read_to_string(&mut text)
                .map_err(|error| format!("failed to read standard input: {error}"))?;
            text
        }
        AclSource::File(file) => fs::read_to_string(file)
            .map_err(|error| format!("failed to read '{}': {error}", file.display()))?,
    };
    let parsed = match format {
        Format::Text => document::parse_text(&text),
        Format::Json => document::parse_json(&text),
    };
    parsed.map_err(|error: InputError| error.to_string())
}

fn print_acl<S, D, Out>(
    store: &AclStore<S, D>,
    path: &Path,
    format: Format,
    stdout: &mut Out,
) -> Result<(), Failure>
where
    S: AclSystem,
    D: Directory,
    Out: Write,
{
    let stat = store.stat(path).map_err(Failure::Store)?;
    let acl = store.get_acl(path).map_err(Failure::Store)?;
    let written = match format {
        Format::Text => {
            let resolver = store.resolver();
            let owner = principal_label(
                resolver.display_name(Subject::User(stat.uid)),
                Subject::User(stat.uid),
            );
            let group = principal_label(
                resolver.display_name(Subject::Group(stat.gid)),
                Subject::Group(stat.gid),
            );
            document::write_text(stdout, path, &owner, &group, &acl)
        }
        Format::Json => document::write_json(
            stdout,
            &AclDocument {
                file: path.display().to_string(),
                owner: stat.uid,
                group: stat.gid,
                acl,
            },
        ),
    };
    written.map_err(|source| Failure::Output {
        path: path.to_path_buf(),
        source,
    })
}
