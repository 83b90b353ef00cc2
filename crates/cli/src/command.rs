//! crates/cli/src/command.rs
//! The clap command tree.

use std::path::PathBuf;

use clap::{Arg, ArgAction, Command as ClapCommand, value_parser};

/// Name the binary is installed under.
pub const PROGRAM_NAME: &str = "oc-facl";

fn paths_arg() -> Arg {
    Arg::new("paths")
        .value_name("PATH")
        .help("Files or directories to operate on.")
        .num_args(1..)
        .required(true)
        .action(ArgAction::Append)
        .value_parser(value_parser!(PathBuf))
}

fn json_arg() -> Arg {
    Arg::new("json")
        .long("json")
        .help("Use JSON instead of ACL text.")
        .action(ArgAction::SetTrue)
}

pub(crate) fn clap_command() -> ClapCommand {
    ClapCommand::new(PROGRAM_NAME)
        .version(env!("CARGO_PKG_VERSION"))
        .about("Read and change POSIX.1e and macOS extended ACLs.")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Increase verbosity; may be supplied multiple times.")
                .action(ArgAction::Count)
                .global(true),
        )
        .arg(
            Arg::new("no-dereference")
                .long("no-dereference")
                .short('P')
                .help("Operate on symbolic links themselves rather than their targets.")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("strict-ids")
                .long("strict-ids")
                .help("Reject numeric ids the account database does not know.")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            ClapCommand::new("get")
                .about("Print the ACL of each PATH.")
                .arg(json_arg())
                .arg(paths_arg()),
        )
        .subcommand(
            ClapCommand::new("set")
                .about("Replace the ACL of each PATH.")
                .arg(json_arg())
                .arg(
                    Arg::new("file")
                        .long("file")
                        .short('f')
                        .value_name("FILE")
                        .help("Read the ACL from FILE instead of standard input ('-' for stdin).")
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(paths_arg()),
        )
        .subcommand(
            ClapCommand::new("remove")
                .about("Strip each PATH down to the ACL its mode implies.")
                .arg(paths_arg()),
        )
}
