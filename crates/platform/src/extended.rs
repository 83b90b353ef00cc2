//! macOS extended ACL entries as plain data.
//!
//! [`ExtendedAce`] mirrors one `acl_entry_t` of an `ACL_TYPE_EXTENDED` ACL:
//! the tag, the GUID qualifier, the full permission mask and the entry flags.
//! The constants below are the libSystem values from `<sys/acl.h>`.

use std::io;
use std::path::Path;

use uuid::Uuid;

/// `ACL_EXTENDED_ALLOW`.
pub const TAG_ALLOW: u32 = 1;
/// `ACL_EXTENDED_DENY`.
pub const TAG_DENY: u32 = 2;

/// `ACL_READ_DATA` / `ACL_LIST_DIRECTORY`.
pub const PERM_READ_DATA: u64 = 1 << 1;
/// `ACL_WRITE_DATA` / `ACL_ADD_FILE`.
pub const PERM_WRITE_DATA: u64 = 1 << 2;
/// `ACL_EXECUTE` / `ACL_SEARCH`.
pub const PERM_EXECUTE: u64 = 1 << 3;
/// `ACL_DELETE`.
pub const PERM_DELETE: u64 = 1 << 4;
/// `ACL_APPEND_DATA` / `ACL_ADD_SUBDIRECTORY`.
pub const PERM_APPEND_DATA: u64 = 1 << 5;
/// `ACL_DELETE_CHILD`.
pub const PERM_DELETE_CHILD: u64 = 1 << 6;
/// `ACL_READ_ATTRIBUTES`.
pub const PERM_READ_ATTRIBUTES: u64 = 1 << 7;
/// `ACL_WRITE_ATTRIBUTES`.
pub const PERM_WRITE_ATTRIBUTES: u64 = 1 << 8;
/// `ACL_READ_EXTATTRIBUTES`.
pub const PERM_READ_EXTATTRIBUTES: u64 = 1 << 9;
/// `ACL_WRITE_EXTATTRIBUTES`.
pub const PERM_WRITE_EXTATTRIBUTES: u64 = 1 << 10;
/// `ACL_READ_SECURITY`.
pub const PERM_READ_SECURITY: u64 = 1 << 11;
/// `ACL_WRITE_SECURITY`.
pub const PERM_WRITE_SECURITY: u64 = 1 << 12;
/// `ACL_CHANGE_OWNER`.
pub const PERM_CHANGE_OWNER: u64 = 1 << 13;
/// `ACL_SYNCHRONIZE`.
pub const PERM_SYNCHRONIZE: u64 = 1 << 20;

/// Every permission bit libSystem defines.
pub const PERM_ALL: [u64; 14] = [
    PERM_READ_DATA,
    PERM_WRITE_DATA,
    PERM_EXECUTE,
    PERM_DELETE,
    PERM_APPEND_DATA,
    PERM_DELETE_CHILD,
    PERM_READ_ATTRIBUTES,
    PERM_WRITE_ATTRIBUTES,
    PERM_READ_EXTATTRIBUTES,
    PERM_WRITE_EXTATTRIBUTES,
    PERM_READ_SECURITY,
    PERM_WRITE_SECURITY,
    PERM_CHANGE_OWNER,
    PERM_SYNCHRONIZE,
];

/// `ACL_ENTRY_INHERITED`.
pub const FLAG_INHERITED: u32 = 1 << 4;
/// `ACL_ENTRY_FILE_INHERIT`.
pub const FLAG_FILE_INHERIT: u32 = 1 << 5;
/// `ACL_ENTRY_DIRECTORY_INHERIT`.
pub const FLAG_DIRECTORY_INHERIT: u32 = 1 << 6;
/// `ACL_ENTRY_LIMIT_INHERIT`.
pub const FLAG_LIMIT_INHERIT: u32 = 1 << 7;
/// `ACL_ENTRY_ONLY_INHERIT`.
pub const FLAG_ONLY_INHERIT: u32 = 1 << 8;

/// Every entry-level flag libSystem defines.
pub const FLAG_ALL: [u32; 5] = [
    FLAG_INHERITED,
    FLAG_FILE_INHERIT,
    FLAG_DIRECTORY_INHERIT,
    FLAG_LIMIT_INHERIT,
    FLAG_ONLY_INHERIT,
];

/// One entry of a macOS extended ACL.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ExtendedAce {
    /// [`TAG_ALLOW`], [`TAG_DENY`], or an unrecognised tag value.
    pub tag: u32,
    /// GUID of the user or group the entry applies to.
    pub qualifier: Uuid,
    /// Permission mask (`PERM_*` bits).
    pub perms: u64,
    /// Entry flags (`FLAG_*` bits).
    pub flags: u32,
}

/// Reads the extended ACL of `path`. A file without an ACL yields no entries.
///
/// With `follow_symlinks == false` a symbolic link's own ACL is read.
pub fn read(path: &Path, follow_symlinks: bool) -> io::Result<Vec<ExtendedAce>> {
    #[cfg(target_os = "macos")]
    {
        crate::macos::read_extended(path, follow_symlinks)
    }
    #[cfg(not(target_os = "macos"))]
    {
        let _ = (path, follow_symlinks);
        Err(crate::unsupported("extended ACLs"))
    }
}

/// Replaces the extended ACL of `path` with `entries`. An empty slice
/// leaves the file with no extended entries.
pub fn write(path: &Path, entries: &[ExtendedAce], follow_symlinks: bool) -> io::Result<()> {
    #[cfg(target_os = "macos")]
    {
        crate::macos::write_extended(path, entries, follow_symlinks)
    }
    #[cfg(not(target_os = "macos"))]
    {
        let _ = (path, entries, follow_symlinks);
        Err(crate::unsupported("extended ACLs"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_bits_are_distinct() {
        let combined = PERM_ALL.iter().fold(0u64, |acc, bit| {
            assert_eq!(acc & bit, 0);
            acc | bit
        });
        assert_eq!(combined.count_ones(), 14);
    }

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn other_platforms_report_unsupported() {
        let error = read(Path::new("/"), true).expect_err("no extended ACLs here");
        assert_eq!(error.kind(), io::ErrorKind::Unsupported);
    }
}
