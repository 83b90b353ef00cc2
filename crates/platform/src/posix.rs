//! Linux POSIX.1e ACLs stored as `system.posix_acl_*` extended attributes.

use std::io;
use std::path::Path;

/// Extended attribute holding the access ACL.
pub const ACCESS_XATTR: &str = "system.posix_acl_access";
/// Extended attribute holding a directory's default ACL.
pub const DEFAULT_XATTR: &str = "system.posix_acl_default";

/// Which of the two POSIX ACL attributes to touch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AclKind {
    /// The access ACL.
    Access,
    /// The default ACL of a directory.
    Default,
}

impl AclKind {
    /// Returns the attribute name for this kind.
    #[must_use]
    pub const fn xattr_name(self) -> &'static str {
        match self {
            Self::Access => ACCESS_XATTR,
            Self::Default => DEFAULT_XATTR,
        }
    }
}

/// Reads the raw ACL blob, or `None` when the file has no such ACL.
///
/// Linux ACLs cannot be read from a symbolic link itself, so callers must
/// pass paths they want dereferenced.
#[cfg(target_os = "linux")]
pub fn read(path: &Path, kind: AclKind) -> io::Result<Option<Vec<u8>>> {
    match xattr::get_deref(path, kind.xattr_name()) {
        Err(error) if error.raw_os_error() == Some(libc::ENODATA) => Ok(None),
        other => other,
    }
}

/// Replaces the ACL blob.
#[cfg(target_os = "linux")]
pub fn write(path: &Path, kind: AclKind, blob: &[u8]) -> io::Result<()> {
    xattr::set_deref(path, kind.xattr_name(), blob)
}

/// Removes the ACL blob. Removing an absent ACL succeeds.
#[cfg(target_os = "linux")]
pub fn remove(path: &Path, kind: AclKind) -> io::Result<()> {
    match xattr::remove_deref(path, kind.xattr_name()) {
        Err(error) if error.raw_os_error() == Some(libc::ENODATA) => Ok(()),
        other => other,
    }
}

#[cfg(not(target_os = "linux"))]
#[allow(missing_docs)]
pub fn read(_path: &Path, _kind: AclKind) -> io::Result<Option<Vec<u8>>> {
    Err(crate::unsupported("POSIX ACL extended attributes"))
}

#[cfg(not(target_os = "linux"))]
#[allow(missing_docs)]
pub fn write(_path: &Path, _kind: AclKind, _blob: &[u8]) -> io::Result<()> {
    Err(crate::unsupported("POSIX ACL extended attributes"))
}

#[cfg(not(target_os = "linux"))]
#[allow(missing_docs)]
pub fn remove(_path: &Path, _kind: AclKind) -> io::Result<()> {
    Err(crate::unsupported("POSIX ACL extended attributes"))
}
