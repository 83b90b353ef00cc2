#![deny(unsafe_code)]
#![deny(missing_docs)]

//! # Overview
//!
//! `platform` is the only oc-facl crate that talks to the operating system's
//! ACL and identity interfaces. Everything above it works with plain data:
//! kernel ACL blobs on Linux, [`ExtendedAce`] records on macOS, and numeric or
//! GUID identities.
//!
//! # Design
//!
//! - [`posix`] reads and writes the `system.posix_acl_access` and
//!   `system.posix_acl_default` extended attributes through the `xattr` crate,
//!   so no libacl is linked.
//! - [`extended`] walks and rebuilds libSystem `acl_t` values on macOS. The
//!   record type and its constants compile everywhere so codecs can be tested
//!   on any host.
//! - [`membership`] wraps the macOS `mbr_*` GUID mapping calls.
//! - [`users`] looks up user and group names through `nix`.
//!
//! # Invariants
//!
//! - Raw pointers returned by libSystem are released through `acl_free` before
//!   the owning wrapper is dropped.
//! - Unsupported platforms report [`std::io::ErrorKind::Unsupported`] instead
//!   of failing to build.
//!
//! # Errors
//!
//! All functions return [`std::io::Error`] so callers keep the OS errno.

pub mod extended;
pub mod membership;
pub mod posix;
pub mod users;

#[cfg(target_os = "macos")]
mod macos;

pub use extended::ExtendedAce;
pub use membership::IdKind;

use std::io;

pub(crate) fn unsupported(what: &'static str) -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        format!("{what} is not available on this platform"),
    )
}
