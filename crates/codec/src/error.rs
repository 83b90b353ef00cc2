use model::{IdentityError, Subject, ValidationError};
use thiserror::Error;

/// Failure to translate between a native ACL and an [`Acl`](model::Acl).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// A directory-only entry was found on, or requested for, a non-directory,
    /// or the backend has no such scope.
    #[error("entry {index} ({subject}) is not valid in this scope")]
    InvalidScope {
        /// Position of the entry.
        index: usize,
        /// Subject of the entry.
        subject: Subject,
    },
    /// The native representation could not be parsed.
    #[error("malformed native ACL: {reason}")]
    MalformedNative {
        /// What was wrong with the input.
        reason: String,
    },
    /// An entry uses a tag, flag or feature the backend cannot express.
    #[error("entry {index} cannot be represented: {reason}")]
    UnsupportedEntry {
        /// Position of the entry.
        index: usize,
        /// What the backend could not represent.
        reason: String,
    },
    /// An entry's principal could not be translated.
    #[error("entry {index}: {source}")]
    Identity {
        /// Position of the entry.
        index: usize,
        /// The translation failure.
        #[source]
        source: IdentityError,
    },
    /// The ACL does not satisfy the backend's layout rules.
    #[error(transparent)]
    Validation(ValidationError),
}

impl CodecError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedNative {
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported(index: usize, reason: impl Into<String>) -> Self {
        Self::UnsupportedEntry {
            index,
            reason: reason.into(),
        }
    }

    pub(crate) const fn identity(index: usize, source: IdentityError) -> Self {
        Self::Identity { index, source }
    }
}

impl From<ValidationError> for CodecError {
    fn from(error: ValidationError) -> Self {
        match error {
            ValidationError::ScopeMismatch { subject, index } => {
                Self::InvalidScope { index, subject }
            }
            other => Self::Validation(other),
        }
    }
}
