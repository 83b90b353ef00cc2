#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `identity` translates between the principals native ACLs name (POSIX tags,
//! UIDs, GIDs, macOS GUIDs) and the canonical [`model::Subject`]. The
//! [`IdentityResolver`] is constructed explicitly and passed to whoever needs
//! it; there is no process-wide singleton.
//!
//! # Design
//!
//! Directory access goes through the [`Directory`] trait:
//! [`SystemDirectory`] queries the local account database and the macOS
//! membership service, [`StaticDirectory`] serves seeded records for tests.
//! Results that needed the directory, including "not found", are kept in
//! bounded caches with approximate least-recently-used eviction and an
//! optional time-to-live ([`ResolverConfig`]).
//!
//! [`IdentityResolver::for_scheme`] returns a [`model::IdentityMap`] that
//! native codecs use without knowing about the resolver.
//!
//! # Invariants
//!
//! - Well-known GUIDs (`everyone@`, `owner@`, `group@`) map to symbolic
//!   subjects without a directory lookup; `nobody` is rejected.
//! - Numeric UIDs and GIDs always map to `User`/`Group`, even when no account
//!   exists, unless strict ids are configured for writing.
//! - [`IdentityResolver::revalidate`] never answers from the cache.
//!
//! # Errors
//!
//! Every failure is a [`model::IdentityError`] carrying the principal that
//! could not be translated. Directory I/O failures are not cached.
//!
//! # Examples
//!
//! ```
//! use identity::{IdentityResolver, ResolverConfig, StaticDirectory, well_known_guid, EVERYONE};
//! use model::{NativeIdentity, Subject};
//!
//! let resolver = IdentityResolver::new(StaticDirectory::new(), ResolverConfig::new());
//! let everyone = NativeIdentity::Guid(well_known_guid(EVERYONE));
//! assert_eq!(resolver.to_subject(everyone), Ok(Subject::Other));
//! ```

mod cache;
mod config;
mod directory;
mod resolver;
mod wellknown;

pub use crate::cache::CacheStats;
pub use crate::config::{DEFAULT_CAPACITY, ResolverConfig};
pub use crate::directory::{Directory, StaticDirectory, SystemDirectory};
pub use crate::resolver::{IdentityResolver, SchemeView};
pub use crate::wellknown::{EVERYONE, GROUP, NOBODY, OWNER, guid as well_known_guid};
pub use platform::IdKind;
