#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `store` is the entry point for reading and changing filesystem ACLs.
//! [`AclStore`] exposes [`get_acl`](AclStore::get_acl),
//! [`get_default_acl`](AclStore::get_default_acl),
//! [`set_acl`](AclStore::set_acl) and [`remove_acl`](AclStore::remove_acl)
//! over canonical [`model::Acl`] values.
//!
//! # Design
//!
//! Native calls go through the [`AclSystem`] trait. [`PosixSystem`] drives
//! Linux extended attributes, [`ExtendedSystem`] drives the macOS `acl_*`
//! API, and [`PlatformSystem`] picks one for the build target. Each system
//! names the [`codec::NativeCodec`] for its structures; principals are
//! translated by a shared [`identity::IdentityResolver`].
//!
//! `set_acl` is a typed two-phase commit. Everything that can fail without
//! touching the file (validation, identity resolution, encoding) runs first.
//! Phase one writes the access ACL. Phase two, for directories on systems
//! with a separate default ACL, writes or removes the default ACL.
//!
//! # Invariants
//!
//! - A failed identity resolution means no mutating native call was made.
//! - Identities are resolved from the directory immediately before a write
//!   unless [`StoreOptions::revalidate_identities`] is disabled. A change in
//!   the directory between resolution and the write is not detected.
//! - `remove_acl` is idempotent.
//!
//! # Errors
//!
//! Operations return [`StoreError`], which always names the path. A failure
//! in phase two is reported as [`StoreError::PartialApply`] and never rolled
//! back. An interrupted system call is retried once
//! ([`StoreOptions::retry_interrupted`]); nothing else is retried.
//!
//! # Examples
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use identity::{IdentityResolver, ResolverConfig};
//! use store::{AclStore, StoreOptions};
//!
//! let resolver = Arc::new(IdentityResolver::system(ResolverConfig::new()));
//! let store = AclStore::platform(resolver, StoreOptions::new());
//! let acl = store.get_acl(Path::new("/srv/share"))?;
//! println!("{acl}");
//! # Ok::<(), store::StoreError>(())
//! ```

mod error;
mod options;
#[cfg(any(test, feature = "test-support"))]
mod recording;
mod store;
mod system;

pub use crate::error::{CommitPhase, StoreError};
pub use crate::options::StoreOptions;
#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub use crate::recording::{Op, RecordedRaw, RecordingExtended, RecordingPosix, RecordingSystem};
pub use crate::store::AclStore;
pub use crate::system::{AclSystem, ExtendedSystem, FileStat, PlatformSystem, PosixSystem};
