//! crates/model/src/validate.rs
//!
//! Structural checks applied before an ACL is encoded.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::acl::{Layout, Scope};
use crate::entry::AclEntry;
use crate::identity::Subject;
use crate::perms::EntryFlags;

/// Reasons an [`Acl`](crate::Acl) fails validation.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A scope lacks one of the owner, owning group or other entries.
    #[error("{scope} ACL is missing its {subject} entry")]
    MissingRequiredEntry {
        /// Scope being validated.
        scope: Scope,
        /// Subject that must be present.
        subject: Subject,
    },
    /// A symbolic subject appears more than once in a scope.
    #[error("{scope} ACL has a second {subject} entry at position {index}")]
    DuplicateSymbolicEntry {
        /// Scope being validated.
        scope: Scope,
        /// Repeated subject.
        subject: Subject,
        /// Position of the repeat within the ACL.
        index: usize,
    },
    /// A named user or group appears more than once in a scope.
    #[error("{scope} ACL has a second entry for {subject} at position {index}")]
    DuplicateQualifiedEntry {
        /// Scope being validated.
        scope: Scope,
        /// Repeated subject.
        subject: Subject,
        /// Position of the repeat within the ACL.
        index: usize,
    },
    /// A scope holds named entries but no mask.
    #[error("{scope} ACL has named entries but no mask")]
    MissingMask {
        /// Scope being validated.
        scope: Scope,
    },
    /// An entry carries directory-only flags on a non-directory.
    #[error("entry {index} ({subject}) is only valid on a directory")]
    ScopeMismatch {
        /// Offending subject.
        subject: Subject,
        /// Position of the entry within the ACL.
        index: usize,
    },
}

pub(crate) fn validate(
    entries: &[AclEntry],
    is_directory: bool,
    layout: Layout,
) -> Result<(), ValidationError> {
    if !is_directory {
        if let Some((index, entry)) = entries
            .iter()
            .enumerate()
            .find(|(_, entry)| entry.flags.intersects(EntryFlags::DIRECTORY_SCOPED))
        {
            return Err(ValidationError::ScopeMismatch {
                subject: entry.subject,
                index,
            });
        }
    }

    if layout == Layout::Extended {
        return Ok(());
    }

    validate_scope(entries, Scope::Access)?;
    if entries.iter().any(AclEntry::is_default) {
        validate_scope(entries, Scope::Default)?;
    }
    Ok(())
}

fn validate_scope(entries: &[AclEntry], scope: Scope) -> Result<(), ValidationError> {
    let mut symbolic = BTreeSet::new();
    let mut named = BTreeSet::new();

    let in_scope = entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| Scope::of(entry) == scope);

    for (index, entry) in in_scope {
        let subject = entry.subject;
        if subject.is_named() {
            if !named.insert(subject) {
                return Err(ValidationError::DuplicateQualifiedEntry {
                    scope,
                    subject,
                    index,
                });
            }
        } else if !symbolic.insert(subject) {
            return Err(ValidationError::DuplicateSymbolicEntry {
                scope,
                subject,
                index,
            });
        }
    }

    for subject in [Subject::Owner, Subject::OwningGroup, Subject::Other] {
        if !symbolic.contains(&subject) {
            return Err(ValidationError::MissingRequiredEntry { scope, subject });
        }
    }

    if !named.is_empty() && !symbolic.contains(&Subject::Mask) {
        return Err(ValidationError::MissingMask { scope });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perms::Permissions;

    fn base(flags: EntryFlags) -> Vec<AclEntry> {
        [
            (Subject::Owner, Permissions::ALL),
            (Subject::OwningGroup, Permissions::READ),
            (Subject::Other, Permissions::NONE),
        ]
        .into_iter()
        .map(|(subject, perms)| AclEntry::new(subject, perms).with_flags(flags))
        .collect()
    }

    #[test]
    fn minimal_access_acl_is_valid() {
        assert_eq!(validate(&base(EntryFlags::empty()), false, Layout::Posix1e), Ok(()));
    }

    #[test]
    fn empty_access_scope_is_missing_owner() {
        assert_eq!(
            validate(&[], false, Layout::Posix1e),
            Err(ValidationError::MissingRequiredEntry {
                scope: Scope::Access,
                subject: Subject::Owner,
            })
        );
    }

    #[test]
    fn named_entry_requires_mask() {
        let mut entries = base(EntryFlags::empty());
        entries.push(AclEntry::new(Subject::Group(20), Permissions::READ));
        assert_eq!(
            validate(&entries, false, Layout::Posix1e),
            Err(ValidationError::MissingMask { scope: Scope::Access })
        );
        entries.push(AclEntry::new(Subject::Mask, Permissions::READ));
        assert_eq!(validate(&entries, false, Layout::Posix1e), Ok(()));
    }

    #[test]
    fn mask_without_named_entries_is_allowed() {
        let mut entries = base(EntryFlags::empty());
        entries.push(AclEntry::new(Subject::Mask, Permissions::READ));
        assert_eq!(validate(&entries, false, Layout::Posix1e), Ok(()));
    }

    #[test]
    fn duplicates_report_the_second_position() {
        let mut entries = base(EntryFlags::empty());
        entries.push(AclEntry::new(Subject::User(7), Permissions::READ));
        entries.push(AclEntry::new(Subject::User(7), Permissions::ALL));
        assert_eq!(
            validate(&entries, false, Layout::Posix1e),
            Err(ValidationError::DuplicateQualifiedEntry {
                scope: Scope::Access,
                subject: Subject::User(7),
                index: 4,
            })
        );
    }

    #[test]
    fn default_scope_is_checked_separately() {
        let mut entries = base(EntryFlags::empty());
        entries.extend(base(EntryFlags::DEFAULT));
        assert_eq!(validate(&entries, true, Layout::Posix1e), Ok(()));

        entries.pop();
        assert_eq!(
            validate(&entries, true, Layout::Posix1e),
            Err(ValidationError::MissingRequiredEntry {
                scope: Scope::Default,
                subject: Subject::Other,
            })
        );
    }

    #[test]
    fn default_entries_on_a_file_are_a_scope_mismatch() {
        let mut entries = base(EntryFlags::empty());
        entries.extend(base(EntryFlags::DEFAULT));
        assert_eq!(
            validate(&entries, false, Layout::Posix1e),
            Err(ValidationError::ScopeMismatch {
                subject: Subject::Owner,
                index: 3,
            })
        );
    }

    #[test]
    fn extended_layout_skips_required_entries() {
        let entries = [
            AclEntry::new(Subject::User(501), Permissions::READ),
            AclEntry::new(Subject::User(501), Permissions::WRITE).with_flags(EntryFlags::DENY),
        ];
        assert_eq!(validate(&entries, false, Layout::Extended), Ok(()));

        let inherit = [AclEntry::new(Subject::Group(12), Permissions::READ)
            .with_flags(EntryFlags::FILE_INHERIT)];
        assert!(matches!(
            validate(&inherit, false, Layout::Extended),
            Err(ValidationError::ScopeMismatch { index: 0, .. })
        ));
        assert_eq!(validate(&inherit, true, Layout::Extended), Ok(()));
    }
}
