#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `codec` converts between the structures the operating system stores for an
//! ACL and the canonical [`model::Acl`]. There are two backends behind one
//! trait, [`NativeCodec`]:
//!
//! - [`PosixCodec`] reads and writes the Linux `system.posix_acl_access` and
//!   `system.posix_acl_default` extended attribute blobs.
//! - [`ExtendedCodec`] walks macOS `ACL_TYPE_EXTENDED` entries keyed by GUID.
//!
//! [`PlatformCodec`] names the backend for the build target.
//!
//! # Design
//!
//! Codecs are pure: they never touch the filesystem and never look up
//! identities themselves. Principals are translated through a
//! [`model::IdentityMap`] supplied by the caller, so the identity resolver and
//! the codecs do not depend on each other.
//!
//! # Invariants
//!
//! - Decoding and re-encoding an unmodified ACL yields the same native
//!   structure, including permission and flag bits with no canonical meaning.
//! - Entries are emitted in the order the [`model::Acl`] holds them.
//! - Directory-scoped entries are rejected unless the target is a directory.
//!
//! # Errors
//!
//! Every failure is a [`CodecError`] identifying the offending entry by index.
//!
//! # Examples
//!
//! ```
//! use codec::{NativeCodec, PosixCodec};
//! use model::{Acl, IdentityError, IdentityMap, NativeIdentity, PosixTag, Subject};
//!
//! struct TagsOnly;
//!
//! impl IdentityMap for TagsOnly {
//!     fn to_subject(&self, native: NativeIdentity) -> Result<Subject, IdentityError> {
//!         match native {
//!             NativeIdentity::Tag(PosixTag::UserObj) => Ok(Subject::Owner),
//!             NativeIdentity::Tag(PosixTag::GroupObj) => Ok(Subject::OwningGroup),
//!             NativeIdentity::Tag(PosixTag::Other) => Ok(Subject::Other),
//!             other => Err(IdentityError::NotFound(other.into())),
//!         }
//!     }
//!
//!     fn to_native(&self, subject: Subject) -> Result<NativeIdentity, IdentityError> {
//!         match subject {
//!             Subject::Owner => Ok(NativeIdentity::Tag(PosixTag::UserObj)),
//!             Subject::OwningGroup => Ok(NativeIdentity::Tag(PosixTag::GroupObj)),
//!             Subject::Other => Ok(NativeIdentity::Tag(PosixTag::Other)),
//!             other => Err(IdentityError::NotFound(other.into())),
//!         }
//!     }
//! }
//!
//! let acl = Acl::from_mode(0o640);
//! let raw = PosixCodec::encode(&acl, false, &TagsOnly).unwrap();
//! assert_eq!(raw.mode, 0o640);
//! assert_eq!(PosixCodec::decode(&raw, false, &TagsOnly).unwrap(), acl);
//! ```

mod error;
mod extended;
mod posix;

pub use crate::error::CodecError;
pub use crate::extended::ExtendedCodec;
pub use crate::posix::{
    PosixAcl, PosixCodec, TAG_GROUP, TAG_GROUP_OBJ, TAG_MASK, TAG_OTHER, TAG_USER, TAG_USER_OBJ,
    UNDEFINED_ID, XATTR_VERSION, canonical_order,
};

use model::{Acl, IdentityMap, IdentityScheme, Layout};

pub(crate) const CODEC_TARGET: &str = "facl::codec";

/// Translation between one platform's native ACL structure and [`Acl`].
pub trait NativeCodec {
    /// Native representation read from and written to the filesystem.
    type Raw;

    /// Entry layout rules the backend enforces.
    const LAYOUT: Layout;

    /// How the backend names principals.
    const SCHEME: IdentityScheme;

    /// Decodes `raw` into a canonical ACL.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] when the structure is malformed, uses a feature
    /// the canonical model cannot express, names an unknown principal, or
    /// carries directory-scoped entries while `is_directory` is `false`.
    fn decode(raw: &Self::Raw, is_directory: bool, ids: &dyn IdentityMap)
    -> Result<Acl, CodecError>;

    /// Encodes `acl` for a file (`is_directory == false`) or a directory.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] when an entry cannot be represented, an identity
    /// cannot be translated, or the ACL violates the backend's layout rules.
    fn encode(acl: &Acl, is_directory: bool, ids: &dyn IdentityMap)
    -> Result<Self::Raw, CodecError>;
}

/// Codec for the build target: [`ExtendedCodec`] on macOS, [`PosixCodec`]
/// elsewhere.
#[cfg(target_os = "macos")]
pub type PlatformCodec = ExtendedCodec;

/// Codec for the build target: [`ExtendedCodec`] on macOS, [`PosixCodec`]
/// elsewhere.
#[cfg(not(target_os = "macos"))]
pub type PlatformCodec = PosixCodec;
