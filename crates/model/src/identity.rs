//! crates/model/src/identity.rs
//!
//! Canonical subjects, native identities, and the seam codecs use to translate
//! between them.

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

/// The principal an ACL entry applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "kind", content = "id", rename_all = "snake_case")
)]
pub enum Subject {
    /// The file's owning user.
    Owner,
    /// A named user, by UID.
    User(u32),
    /// The file's owning group.
    OwningGroup,
    /// A named group, by GID.
    Group(u32),
    /// The effective-rights mask for named entries and the owning group.
    Mask,
    /// Everyone not matched by another entry.
    Other,
}

impl Subject {
    /// Returns `true` for the variants that may appear at most once per scope.
    #[must_use]
    pub const fn is_symbolic(self) -> bool {
        !self.is_named()
    }

    /// Returns `true` for `User` and `Group`.
    #[must_use]
    pub const fn is_named(self) -> bool {
        matches!(self, Self::User(_) | Self::Group(_))
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Owner => f.write_str("owner"),
            Self::User(uid) => write!(f, "user {uid}"),
            Self::OwningGroup => f.write_str("owning group"),
            Self::Group(gid) => write!(f, "group {gid}"),
            Self::Mask => f.write_str("mask"),
            Self::Other => f.write_str("other"),
        }
    }
}

/// POSIX.1e entry tags that carry no qualifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PosixTag {
    /// `ACL_USER_OBJ`.
    UserObj,
    /// `ACL_GROUP_OBJ`.
    GroupObj,
    /// `ACL_MASK`.
    Mask,
    /// `ACL_OTHER`.
    Other,
}

/// An identity as a native ACL names it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NativeIdentity {
    /// A qualifier-less POSIX tag.
    Tag(PosixTag),
    /// A numeric user ID.
    Uid(u32),
    /// A numeric group ID.
    Gid(u32),
    /// A directory-service GUID.
    Guid(Uuid),
}

impl fmt::Display for NativeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(tag) => write!(f, "tag {tag:?}"),
            Self::Uid(uid) => write!(f, "uid {uid}"),
            Self::Gid(gid) => write!(f, "gid {gid}"),
            Self::Guid(guid) => write!(f, "guid {}", guid.hyphenated()),
        }
    }
}

/// How a platform names ACL principals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IdentityScheme {
    /// Numeric UIDs/GIDs plus symbolic POSIX tags (Linux).
    Numeric,
    /// Directory-service GUIDs (macOS).
    Guid,
}

impl IdentityScheme {
    /// Returns the scheme used by the platform this crate was built for.
    #[must_use]
    pub const fn native() -> Self {
        if cfg!(target_os = "macos") {
            Self::Guid
        } else {
            Self::Numeric
        }
    }
}

/// Either side of an identity translation, for error reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Principal {
    /// A native identity that could not be translated.
    Native(NativeIdentity),
    /// A canonical subject that could not be translated.
    Subject(Subject),
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native(native) => native.fmt(f),
            Self::Subject(subject) => subject.fmt(f),
        }
    }
}

impl From<NativeIdentity> for Principal {
    fn from(native: NativeIdentity) -> Self {
        Self::Native(native)
    }
}

impl From<Subject> for Principal {
    fn from(subject: Subject) -> Self {
        Self::Subject(subject)
    }
}

/// Failure to translate between a native identity and a [`Subject`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    /// The identity directory has no record of the principal.
    #[error("no identity found for {0}")]
    NotFound(Principal),
    /// The GUID's domain could not be classified as user or group.
    #[error("cannot classify guid {} (id type {id_type})", guid.hyphenated())]
    AmbiguousDomain {
        /// GUID that failed classification.
        guid: Uuid,
        /// Raw id type reported by the directory service.
        id_type: i32,
    },
    /// The platform cannot represent the principal.
    #[error("{0} cannot be represented on this platform")]
    Unsupported(Principal),
}

impl IdentityError {
    /// Returns the principal involved, when one is known.
    #[must_use]
    pub const fn principal(&self) -> Option<Principal> {
        match self {
            Self::NotFound(principal) | Self::Unsupported(principal) => Some(*principal),
            Self::AmbiguousDomain { guid, .. } => {
                Some(Principal::Native(NativeIdentity::Guid(*guid)))
            }
        }
    }
}

/// Translation seam between native identities and canonical subjects.
///
/// Codecs call through this trait while walking native entries; the identity
/// resolver implements it, and tests substitute fixed tables.
pub trait IdentityMap {
    /// Translates a native identity into a canonical subject.
    fn to_subject(&self, native: NativeIdentity) -> Result<Subject, IdentityError>;

    /// Translates a canonical subject into the native identity to write.
    fn to_native(&self, subject: Subject) -> Result<NativeIdentity, IdentityError>;
}

impl<M: IdentityMap + ?Sized> IdentityMap for &M {
    fn to_subject(&self, native: NativeIdentity) -> Result<Subject, IdentityError> {
        (**self).to_subject(native)
    }

    fn to_native(&self, subject: Subject) -> Result<NativeIdentity, IdentityError> {
        (**self).to_native(subject)
    }
}
