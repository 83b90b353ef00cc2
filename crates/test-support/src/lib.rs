#![deny(unsafe_code)]

//! Scratch files and directories for filesystem tests across the workspace.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Creates an empty scratch directory that is removed when dropped.
pub fn scratch_dir() -> io::Result<TempDir> {
    tempfile::Builder::new().prefix("oc-facl-").tempdir()
}

/// Creates `name` under `dir` with the given permission bits.
pub fn file_with_mode(dir: &Path, name: &str, mode: u32) -> io::Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, b"")?;
    set_mode(&path, mode)?;
    Ok(path)
}

/// Creates the directory `name` under `dir` with the given permission bits.
pub fn dir_with_mode(dir: &Path, name: &str, mode: u32) -> io::Result<PathBuf> {
    let path = dir.join(name);
    fs::create_dir(&path)?;
    set_mode(&path, mode)?;
    Ok(path)
}

/// Returns the permission bits of `path`.
pub fn mode_of(path: &Path) -> io::Result<u32> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        Ok(fs::metadata(path)?.permissions().mode() & 0o7777)
    }
    #[cfg(not(unix))]
    {
        let readonly = fs::metadata(path)?.permissions().readonly();
        Ok(if readonly { 0o444 } else { 0o644 })
    }
}

fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode))
    }
    #[cfg(not(unix))]
    {
        let _ = (path, mode);
        Ok(())
    }
}
