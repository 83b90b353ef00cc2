//! GUID mapping through the macOS membership API.

use std::io;

use uuid::Uuid;

/// `ID_TYPE_UID` from `<membership.h>`.
pub const ID_TYPE_UID: i32 = 0;
/// `ID_TYPE_GID` from `<membership.h>`.
pub const ID_TYPE_GID: i32 = 1;

/// Domain a GUID resolved into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IdKind {
    /// The GUID names a user.
    User,
    /// The GUID names a group.
    Group,
    /// The directory returned an id type this crate does not map.
    Other(i32),
}

impl IdKind {
    /// Classifies a raw membership id type.
    #[must_use]
    pub const fn from_raw(id_type: i32) -> Self {
        match id_type {
            ID_TYPE_UID => Self::User,
            ID_TYPE_GID => Self::Group,
            other => Self::Other(other),
        }
    }
}

/// Returns the GUID of `uid`, or `None` when the directory has no record.
pub fn uid_to_guid(uid: u32) -> io::Result<Option<Uuid>> {
    #[cfg(target_os = "macos")]
    {
        crate::macos::uid_to_guid(uid)
    }
    #[cfg(not(target_os = "macos"))]
    {
        let _ = uid;
        Err(crate::unsupported("GUID membership lookups"))
    }
}

/// Returns the GUID of `gid`, or `None` when the directory has no record.
pub fn gid_to_guid(gid: u32) -> io::Result<Option<Uuid>> {
    #[cfg(target_os = "macos")]
    {
        crate::macos::gid_to_guid(gid)
    }
    #[cfg(not(target_os = "macos"))]
    {
        let _ = gid;
        Err(crate::unsupported("GUID membership lookups"))
    }
}

/// Resolves a GUID to a numeric id and its domain, or `None` when unknown.
pub fn guid_to_id(guid: Uuid) -> io::Result<Option<(u32, IdKind)>> {
    #[cfg(target_os = "macos")]
    {
        crate::macos::guid_to_id(guid)
    }
    #[cfg(not(target_os = "macos"))]
    {
        let _ = guid;
        Err(crate::unsupported("GUID membership lookups"))
    }
}
