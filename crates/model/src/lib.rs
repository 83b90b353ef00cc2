#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `model` defines the canonical, platform-independent vocabulary shared by the
//! oc-facl crates: the [`Acl`] value type, its [`AclEntry`] members, the
//! [`Subject`] an entry applies to, and the [`Permissions`] and [`EntryFlags`]
//! bit sets. It also defines the identity seam ([`NativeIdentity`],
//! [`IdentityMap`], [`IdentityError`]) that lets native codecs translate
//! principals without depending on a particular resolver.
//!
//! # Design
//!
//! An [`Acl`] is an ordered list of entries. Structural equality is
//! order-sensitive so an unmodified ACL can be written back bit-for-bit, while
//! [`Acl::permission_equivalent`] compares allow-only entries as a multiset for callers
//! that only care about effective rights. Construction helpers never insert
//! missing entries; [`Acl::validate`] detects incomplete ACLs instead of
//! repairing them.
//!
//! # Invariants
//!
//! - Within each scope (access, default) of a POSIX.1e ACL, `Owner`,
//!   `OwningGroup` and `Other` appear exactly once and `Mask` at most once.
//! - A `Mask` entry is required whenever a scope holds named `User`/`Group`
//!   entries.
//! - Directory-scoped entries (default ACL entries and inheritance markers) are
//!   only valid on directories.
//!
//! # Errors
//!
//! Validation failures are reported as [`ValidationError`] naming the scope and
//! subject involved. Text parsing failures are reported as [`TextError`].
//!
//! # Examples
//!
//! ```
//! use model::{Acl, AclEntry, Permissions, Subject};
//!
//! let mut acl = Acl::from_mode(0o644);
//! acl.push(AclEntry::new(Subject::User(1000), Permissions::READ | Permissions::EXECUTE));
//! acl.push(AclEntry::new(Subject::Mask, Permissions::ALL));
//! acl.validate(false).expect("complete POSIX.1e ACL");
//!
//! assert_eq!(acl.mode_bits(), Some(0o674));
//! ```

mod acl;
mod entry;
mod identity;
mod perms;
mod text;
mod validate;

pub use crate::acl::{Acl, Layout, Scope};
pub use crate::entry::{AclEntry, VendorBits};
pub use crate::identity::{
    IdentityError, IdentityMap, IdentityScheme, NativeIdentity, PosixTag, Principal, Subject,
};
pub use crate::perms::{EntryFlags, ParseFlagError, ParsePermissionsError, Permissions};
pub use crate::text::TextError;
pub use crate::validate::ValidationError;
