//! User and group name lookups from the local account database.

use std::io;

/// Returns the login name of `uid`, or `None` when no account exists.
#[cfg(unix)]
pub fn user_name(uid: u32) -> io::Result<Option<String>> {
    use nix::unistd::{Uid, User};

    User::from_uid(Uid::from_raw(uid))
        .map(|user| user.map(|user| user.name))
        .map_err(io::Error::from)
}

/// Returns the name of `gid`, or `None` when no group exists.
#[cfg(unix)]
pub fn group_name(gid: u32) -> io::Result<Option<String>> {
    use nix::unistd::{Gid, Group};

    Group::from_gid(Gid::from_raw(gid))
        .map(|group| group.map(|group| group.name))
        .map_err(io::Error::from)
}

#[cfg(not(unix))]
#[allow(missing_docs)]
pub fn user_name(_uid: u32) -> io::Result<Option<String>> {
    Ok(None)
}

#[cfg(not(unix))]
#[allow(missing_docs)]
pub fn group_name(_gid: u32) -> io::Result<Option<String>> {
    Ok(None)
}
