//! crates/store/src/system.rs
//!
//! The native calls the store is allowed to make, behind one trait so the
//! commit protocol can be exercised without a filesystem.

use std::fs;
use std::io;
use std::path::Path;

use codec::{ExtendedCodec, NativeCodec, PosixAcl, PosixCodec};
use platform::ExtendedAce;
use platform::posix::AclKind;

/// File attributes the store needs before touching an ACL.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileStat {
    /// Permission bits (`0o7777`).
    pub mode: u32,
    /// Owning user.
    pub uid: u32,
    /// Owning group.
    pub gid: u32,
    /// Whether the path is a directory.
    pub is_dir: bool,
}

impl FileStat {
    /// Reads the attributes of `path`, or of the link itself when
    /// `follow_symlinks` is `false`.
    pub fn of(path: &Path, follow_symlinks: bool) -> io::Result<Self> {
        let metadata = if follow_symlinks {
            fs::metadata(path)?
        } else {
            fs::symlink_metadata(path)?
        };
        Ok(Self::from_metadata(&metadata))
    }

    #[cfg(unix)]
    fn from_metadata(metadata: &fs::Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;
        Self {
            mode: metadata.mode() & 0o7777,
            uid: metadata.uid(),
            gid: metadata.gid(),
            is_dir: metadata.is_dir(),
        }
    }

    #[cfg(not(unix))]
    fn from_metadata(metadata: &fs::Metadata) -> Self {
        Self {
            mode: if metadata.permissions().readonly() { 0o444 } else { 0o644 },
            uid: 0,
            gid: 0,
            is_dir: metadata.is_dir(),
        }
    }
}

/// Native ACL calls for one platform family.
///
/// Only [`write_access`](AclSystem::write_access),
/// [`write_default`](AclSystem::write_default) and
/// [`remove_default`](AclSystem::remove_default) mutate the filesystem.
pub trait AclSystem {
    /// Codec that understands this system's native structures.
    type Codec: NativeCodec;

    /// Whether directories carry a default ACL separate from the access ACL.
    const SEPARATE_DEFAULT: bool;

    /// Reads the attributes of `path`.
    fn stat(&self, path: &Path, follow_symlinks: bool) -> io::Result<FileStat>;

    /// Reads the native ACL of `path`.
    fn read(
        &self,
        path: &Path,
        stat: &FileStat,
        follow_symlinks: bool,
    ) -> io::Result<<Self::Codec as NativeCodec>::Raw>;

    /// Replaces the access ACL (for extended systems, the only ACL).
    fn write_access(
        &self,
        path: &Path,
        raw: &<Self::Codec as NativeCodec>::Raw,
        follow_symlinks: bool,
    ) -> io::Result<()>;

    /// Replaces the default ACL of a directory.
    fn write_default(
        &self,
        path: &Path,
        raw: &<Self::Codec as NativeCodec>::Raw,
        follow_symlinks: bool,
    ) -> io::Result<()>;

    /// Deletes the default ACL of a directory. Succeeds when there is none.
    fn remove_default(&self, path: &Path, follow_symlinks: bool) -> io::Result<()>;
}

/// Linux POSIX.1e ACLs stored in `system.posix_acl_*` extended attributes.
#[derive(Clone, Copy, Debug, Default)]
pub struct PosixSystem;

impl PosixSystem {
    fn require_follow(follow_symlinks: bool) -> io::Result<()> {
        if follow_symlinks {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "POSIX ACLs cannot be set on symbolic links",
            ))
        }
    }
}

fn sorted(blob: &[u8]) -> io::Result<Vec<u8>> {
    codec::canonical_order(blob).map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))
}

impl AclSystem for PosixSystem {
    type Codec = PosixCodec;

    const SEPARATE_DEFAULT: bool = true;

    fn stat(&self, path: &Path, follow_symlinks: bool) -> io::Result<FileStat> {
        Self::require_follow(follow_symlinks)?;
        FileStat::of(path, true)
    }

    fn read(&self, path: &Path, stat: &FileStat, follow_symlinks: bool) -> io::Result<PosixAcl> {
        Self::require_follow(follow_symlinks)?;
        let access = platform::posix::read(path, AclKind::Access)?;
        let default = if stat.is_dir {
            platform::posix::read(path, AclKind::Default)?
        } else {
            None
        };
        Ok(PosixAcl {
            access,
            default,
            mode: stat.mode & 0o777,
        })
    }

    fn write_access(&self, path: &Path, raw: &PosixAcl, follow_symlinks: bool) -> io::Result<()> {
        Self::require_follow(follow_symlinks)?;
        let Some(blob) = &raw.access else {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "no access ACL to write"));
        };
        platform::posix::write(path, AclKind::Access, &sorted(blob)?)
    }

    fn write_default(&self, path: &Path, raw: &PosixAcl, follow_symlinks: bool) -> io::Result<()> {
        Self::require_follow(follow_symlinks)?;
        match &raw.default {
            Some(blob) => platform::posix::write(path, AclKind::Default, &sorted(blob)?),
            None => platform::posix::remove(path, AclKind::Default),
        }
    }

    fn remove_default(&self, path: &Path, follow_symlinks: bool) -> io::Result<()> {
        Self::require_follow(follow_symlinks)?;
        platform::posix::remove(path, AclKind::Default)
    }
}

/// macOS extended ACLs through libSystem's `acl_*` calls.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExtendedSystem;

impl AclSystem for ExtendedSystem {
    type Codec = ExtendedCodec;

    const SEPARATE_DEFAULT: bool = false;

    fn stat(&self, path: &Path, follow_symlinks: bool) -> io::Result<FileStat> {
        FileStat::of(path, follow_symlinks)
    }

    fn read(
        &self,
        path: &Path,
        _stat: &FileStat,
        follow_symlinks: bool,
    ) -> io::Result<Vec<ExtendedAce>> {
        platform::extended::read(path, follow_symlinks)
    }

    fn write_access(
        &self,
        path: &Path,
        raw: &Vec<ExtendedAce>,
        follow_symlinks: bool,
    ) -> io::Result<()> {
        platform::extended::write(path, raw, follow_symlinks)
    }

    fn write_default(&self, _path: &Path, _raw: &Vec<ExtendedAce>, _follow: bool) -> io::Result<()> {
        Err(no_default_acl())
    }

    fn remove_default(&self, _path: &Path, _follow: bool) -> io::Result<()> {
        Err(no_default_acl())
    }
}

fn no_default_acl() -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        "extended ACLs have no separate default ACL",
    )
}

/// Native ACL system of the build target.
#[cfg(target_os = "macos")]
pub type PlatformSystem = ExtendedSystem;

/// Native ACL system of the build target.
#[cfg(not(target_os = "macos"))]
pub type PlatformSystem = PosixSystem;
