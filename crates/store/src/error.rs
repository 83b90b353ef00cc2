use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use codec::CodecError;
use model::{IdentityError, Principal, ValidationError};
use thiserror::Error;

/// Last phase of a commit that reached the filesystem.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitPhase {
    /// The access ACL was written.
    Access,
    /// The default ACL was written or removed.
    Default,
}

impl fmt::Display for CommitPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Access => "access",
            Self::Default => "default",
        })
    }
}

/// Error produced by an [`AclStore`](crate::AclStore) operation.
///
/// Every variant names the path it concerns. Variants produced by a failed
/// system call keep the [`io::Error`] so the errno stays available.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The path does not exist.
    #[error("'{}' does not exist", path.display())]
    NotFound {
        /// Path that was looked up.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// The caller may not read or change the ACL.
    #[error("permission denied: cannot {context} '{}'", path.display())]
    PermissionDenied {
        /// Operation that was refused.
        context: &'static str,
        /// Path of the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// The access ACL was written but the default ACL was not. The file is
    /// left as it is.
    #[error("ACL of '{}' partially applied ({applied} ACL written): {source}", path.display())]
    PartialApply {
        /// Path of the directory.
        path: PathBuf,
        /// Last phase that succeeded.
        applied: CommitPhase,
        /// Failure of the following phase.
        #[source]
        source: io::Error,
    },
    /// A system call was interrupted by a signal, and the retry was too.
    #[error("interrupted while trying to {context} '{}'", path.display())]
    Interrupted {
        /// Operation that was interrupted.
        context: &'static str,
        /// Path of the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// The filesystem or platform has no ACL support for this operation.
    #[error("cannot {context} '{}': not supported: {source}", path.display())]
    Unsupported {
        /// Operation that was attempted.
        context: &'static str,
        /// Path of the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// Any other system call failure.
    #[error("failed to {context} '{}': {source}", path.display())]
    Io {
        /// Operation that failed.
        context: &'static str,
        /// Path of the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// A principal of the ACL could not be resolved.
    #[error("'{}': {source}", path.display())]
    Identity {
        /// Path of the file.
        path: PathBuf,
        /// Principal that failed to resolve.
        principal: Option<Principal>,
        /// Resolver failure.
        #[source]
        source: IdentityError,
    },
    /// The native ACL could not be decoded or the ACL could not be encoded.
    #[error("'{}': {source}", path.display())]
    Codec {
        /// Path of the file.
        path: PathBuf,
        /// Codec failure.
        #[source]
        source: CodecError,
    },
    /// The ACL is not valid for the target.
    #[error("invalid ACL for '{}': {source}", path.display())]
    Validation {
        /// Path of the file.
        path: PathBuf,
        /// First violated rule.
        #[source]
        source: ValidationError,
    },
}

impl StoreError {
    /// Classifies a failed system call on `path`.
    pub(crate) fn from_io(context: &'static str, path: &Path, source: io::Error) -> Self {
        let path = path.to_path_buf();
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound { path, source },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                context,
                path,
                source,
            },
            io::ErrorKind::Interrupted => Self::Interrupted {
                context,
                path,
                source,
            },
            _ if is_unsupported(&source) => Self::Unsupported {
                context,
                path,
                source,
            },
            _ => Self::Io {
                context,
                path,
                source,
            },
        }
    }

    pub(crate) fn identity(path: &Path, source: IdentityError) -> Self {
        Self::Identity {
            path: path.to_path_buf(),
            principal: source.principal(),
            source,
        }
    }

    /// Identity failures inside the codec keep their own variant.
    pub(crate) fn codec(path: &Path, source: CodecError) -> Self {
        match source {
            CodecError::Identity { source, .. } => Self::identity(path, source),
            CodecError::Validation(source) => Self::Validation {
                path: path.to_path_buf(),
                source,
            },
            source => Self::Codec {
                path: path.to_path_buf(),
                source,
            },
        }
    }

    /// Returns the path the error concerns.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound { path, .. }
            | Self::PermissionDenied { path, .. }
            | Self::PartialApply { path, .. }
            | Self::Interrupted { path, .. }
            | Self::Unsupported { path, .. }
            | Self::Io { path, .. }
            | Self::Identity { path, .. }
            | Self::Codec { path, .. }
            | Self::Validation { path, .. } => path,
        }
    }

    /// Returns the underlying OS error, when a system call failed.
    #[must_use]
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            Self::NotFound { source, .. }
            | Self::PermissionDenied { source, .. }
            | Self::PartialApply { source, .. }
            | Self::Interrupted { source, .. }
            | Self::Unsupported { source, .. }
            | Self::Io { source, .. } => Some(source),
            Self::Identity { .. } | Self::Codec { .. } | Self::Validation { .. } => None,
        }
    }

    /// Returns `true` when repeating the operation may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Interrupted { .. })
    }
}

fn is_unsupported(error: &io::Error) -> bool {
    if error.kind() == io::ErrorKind::Unsupported {
        return true;
    }
    #[cfg(unix)]
    {
        matches!(
            error.raw_os_error(),
            Some(code) if code == libc::EOPNOTSUPP || code == libc::ENOTSUP || code == libc::ENOSYS
        )
    }
    #[cfg(not(unix))]
    {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::Subject;

    fn path() -> &'static Path {
        Path::new("/srv/share")
    }

    #[test]
    fn io_errors_are_classified_by_kind() {
        let not_found = StoreError::from_io("stat", path(), io::ErrorKind::NotFound.into());
        assert!(matches!(not_found, StoreError::NotFound { .. }));

        let denied =
            StoreError::from_io("write ACL of", path(), io::ErrorKind::PermissionDenied.into());
        assert!(matches!(denied, StoreError::PermissionDenied { context: "write ACL of", .. }));

        let interrupted = StoreError::from_io("read ACL of", path(), io::ErrorKind::Interrupted.into());
        assert!(interrupted.is_retryable());
        assert!(!denied.is_retryable());

        let other = StoreError::from_io("read ACL of", path(), io::Error::other("boom"));
        assert!(matches!(other, StoreError::Io { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn eopnotsupp_is_unsupported() {
        let error = io::Error::from_raw_os_error(libc::EOPNOTSUPP);
        let mapped = StoreError::from_io("read ACL of", path(), error);
        assert!(matches!(mapped, StoreError::Unsupported { .. }));
        assert_eq!(
            mapped.io_error().and_then(io::Error::raw_os_error),
            Some(libc::EOPNOTSUPP)
        );
    }

    #[test]
    fn codec_identity_failures_become_identity_errors() {
        let source = IdentityError::NotFound(Principal::Subject(Subject::User(4242)));
        let mapped = StoreError::codec(path(), CodecError::Identity { index: 3, source });
        match mapped {
            StoreError::Identity { principal, .. } => {
                assert_eq!(principal, Some(Principal::Subject(Subject::User(4242))));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn messages_name_the_path() {
        let error = StoreError::PartialApply {
            path: path().to_path_buf(),
            applied: CommitPhase::Access,
            source: io::Error::other("disk full"),
        };
        assert_eq!(
            error.to_string(),
            "ACL of '/srv/share' partially applied (access ACL written): disk full"
        );
        assert_eq!(error.path(), path());
    }
}
