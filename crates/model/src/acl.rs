//! crates/model/src/acl.rs
//!
//! The canonical ACL value and its scope-aware helpers.

use std::cmp::Ordering;
use std::fmt;

use crate::entry::AclEntry;
use crate::identity::Subject;
use crate::perms::{EntryFlags, Permissions};
use crate::validate::{self, ValidationError};

/// Which of a directory's two POSIX.1e ACLs an entry belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    /// Governs access to the object itself.
    Access,
    /// Inherited by objects created inside a directory.
    Default,
}

impl Scope {
    /// Returns the scope an entry belongs to.
    #[must_use]
    pub const fn of(entry: &AclEntry) -> Self {
        if entry.is_default() {
            Self::Default
        } else {
            Self::Access
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Access => "access",
            Self::Default => "default",
        })
    }
}

/// The native ACL model an [`Acl`] is laid out for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Layout {
    /// POSIX.1e: required owner/group/other entries, mask, default scope.
    Posix1e,
    /// Extended (NFSv4-style): free-form allow/deny entries with inheritance.
    Extended,
}

impl Layout {
    /// Returns the layout of the platform this crate was built for.
    #[must_use]
    pub const fn native() -> Self {
        if cfg!(target_os = "macos") {
            Self::Extended
        } else {
            Self::Posix1e
        }
    }
}

/// An ordered list of ACL entries.
///
/// `==` compares entries in order; use [`Acl::permission_equivalent`] to
/// ignore ordering.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct Acl {
    entries: Vec<AclEntry>,
}

impl Acl {
    /// Creates an empty ACL.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Builds the three-entry POSIX.1e ACL equivalent to `mode`'s permission
    /// bits.
    #[must_use]
    pub fn from_mode(mode: u32) -> Self {
        Self::from_entries(vec![
            AclEntry::new(Subject::Owner, Permissions::from_mode_bits(mode >> 6)),
            AclEntry::new(Subject::OwningGroup, Permissions::from_mode_bits(mode >> 3)),
            AclEntry::new(Subject::Other, Permissions::from_mode_bits(mode)),
        ])
    }

    /// Returns the smallest valid ACL for `layout`: the mode-derived entries
    /// for POSIX.1e, no entries for the extended model.
    #[must_use]
    pub fn minimal(layout: Layout, mode: u32) -> Self {
        match layout {
            Layout::Posix1e => Self::from_mode(mode),
            Layout::Extended => Self::new(),
        }
    }

    /// Wraps an existing entry list without checking it.
    #[must_use]
    pub const fn from_entries(entries: Vec<AclEntry>) -> Self {
        Self { entries }
    }

    /// Appends an entry.
    pub fn push(&mut self, entry: AclEntry) {
        self.entries.push(entry);
    }

    /// Returns all entries in order.
    #[must_use]
    pub fn entries(&self) -> &[AclEntry] {
        &self.entries
    }

    /// Returns the entries for in-place editing.
    pub fn entries_mut(&mut self) -> &mut Vec<AclEntry> {
        &mut self.entries
    }

    /// Consumes the ACL, returning its entries.
    #[must_use]
    pub fn into_entries(self) -> Vec<AclEntry> {
        self.entries
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the ACL has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the access-scope entries.
    pub fn access_entries(&self) -> impl Iterator<Item = &AclEntry> {
        self.entries.iter().filter(|entry| !entry.is_default())
    }

    /// Iterates over the default-scope entries.
    pub fn default_entries(&self) -> impl Iterator<Item = &AclEntry> {
        self.entries.iter().filter(|entry| entry.is_default())
    }

    /// Returns a copy holding only the entries of `scope`, order preserved.
    #[must_use]
    pub fn scoped(&self, scope: Scope) -> Self {
        Self::from_entries(
            self.entries
                .iter()
                .filter(|entry| Scope::of(entry) == scope)
                .copied()
                .collect(),
        )
    }

    /// Returns `true` when the ACL says more than the file mode can: named
    /// entries, a mask, default entries, or any flagged entry.
    #[must_use]
    pub fn has_extended_entries(&self) -> bool {
        self.entries.iter().any(|entry| {
            !entry.flags.is_empty()
                || !matches!(
                    entry.subject,
                    Subject::Owner | Subject::OwningGroup | Subject::Other
                )
        })
    }

    /// Derives the permission bits of a file mode from the access scope.
    ///
    /// The group triplet comes from the mask when one is present, as the
    /// kernel does. Returns `None` when a required entry is missing.
    #[must_use]
    pub fn mode_bits(&self) -> Option<u32> {
        let perms = |subject: Subject| {
            self.access_entries()
                .find(|entry| entry.subject == subject)
                .map(|entry| entry.permissions.mode_bits())
        };

        let owner = perms(Subject::Owner)?;
        let group = perms(Subject::Mask).or_else(|| perms(Subject::OwningGroup))?;
        perms(Subject::OwningGroup)?;
        let other = perms(Subject::Other)?;
        Some((owner << 6) | (group << 3) | other)
    }

    /// Checks the POSIX.1e invariants for a file (`is_directory == false`) or
    /// a directory.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found: scope violations first,
    /// then duplicates, missing required entries, and a missing mask.
    pub fn validate(&self, is_directory: bool) -> Result<(), ValidationError> {
        self.validate_for(is_directory, Layout::Posix1e)
    }

    /// Checks the invariants of `layout`. The extended layout only enforces
    /// directory-scoped flags.
    ///
    /// # Errors
    ///
    /// See [`Acl::validate`].
    pub fn validate_for(&self, is_directory: bool, layout: Layout) -> Result<(), ValidationError> {
        validate::validate(&self.entries, is_directory, layout)
    }

    /// Compares the rights two ACLs grant, ignoring vendor bits.
    ///
    /// Entries are evaluated first-match once a deny entry is present, so
    /// ACLs containing one compare in order. Allow-only ACLs compare as
    /// multisets.
    #[must_use]
    pub fn permission_equivalent(&self, other: &Self) -> bool {
        if self.entries.len() != other.entries.len() {
            return false;
        }
        let mut lhs: Vec<_> = self.entries.iter().map(entry_key).collect();
        let mut rhs: Vec<_> = other.entries.iter().map(entry_key).collect();
        let ordered = self.entries.iter().chain(&other.entries).any(AclEntry::is_deny);
        if !ordered {
            lhs.sort_unstable();
            rhs.sort_unstable();
        }
        lhs == rhs
    }

    /// Reorders entries into canonical order: access before default,
    /// explicit before inherited, deny before allow, then owner, users by id, owning
    /// group, groups by id, mask and other. The sort is stable.
    pub fn sort_canonical(&mut self) {
        self.entries.sort_by(canonical_order);
    }
}

fn entry_key(entry: &AclEntry) -> (Subject, EntryFlags, Permissions) {
    (entry.subject, entry.flags, entry.permissions)
}

const fn subject_rank(subject: Subject) -> (u8, u32) {
    match subject {
        Subject::Owner => (0, 0),
        Subject::User(uid) => (1, uid),
        Subject::OwningGroup => (2, 0),
        Subject::Group(gid) => (3, gid),
        Subject::Mask => (4, 0),
        Subject::Other => (5, 0),
    }
}

fn canonical_order(lhs: &AclEntry, rhs: &AclEntry) -> Ordering {
    let key = |entry: &AclEntry| {
        (
            Scope::of(entry),
            entry.flags.contains(EntryFlags::INHERITED),
            !entry.is_deny(),
            subject_rank(entry.subject),
        )
    };
    key(lhs).cmp(&key(rhs))
}

impl fmt::Display for Acl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl FromIterator<AclEntry> for Acl {
    fn from_iter<I: IntoIterator<Item = AclEntry>>(iter: I) -> Self {
        Self::from_entries(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Acl {
    type Item = &'a AclEntry;
    type IntoIter = std::slice::Iter<'a, AclEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_mode_builds_three_entries_without_mask() {
        let acl = Acl::from_mode(0o640);
        assert_eq!(
            acl.entries(),
            [
                AclEntry::new(Subject::Owner, Permissions::READ | Permissions::WRITE),
                AclEntry::new(Subject::OwningGroup, Permissions::READ),
                AclEntry::new(Subject::Other, Permissions::NONE),
            ]
        );
        assert!(!acl.has_extended_entries());
        assert_eq!(acl.mode_bits(), Some(0o640));
    }

    #[test]
    fn minimal_extended_acl_is_empty() {
        assert!(Acl::minimal(Layout::Extended, 0o755).is_empty());
        assert_eq!(Acl::minimal(Layout::Posix1e, 0o755), Acl::from_mode(0o755));
    }

    #[test]
    fn mode_bits_use_the_mask_for_the_group_triplet() {
        let mut acl = Acl::from_mode(0o640);
        acl.push(AclEntry::new(Subject::User(1000), Permissions::ALL));
        acl.push(AclEntry::new(Subject::Mask, Permissions::READ | Permissions::EXECUTE));
        assert_eq!(acl.mode_bits(), Some(0o650));
        assert!(acl.has_extended_entries());
    }

    #[test]
    fn mode_bits_need_the_required_entries() {
        let acl = Acl::from_entries(vec![AclEntry::new(Subject::Owner, Permissions::ALL)]);
        assert_eq!(acl.mode_bits(), None);
    }

    #[test]
    fn equality_is_order_sensitive_but_equivalence_is_not() {
        let acl = Acl::from_mode(0o754);
        let mut reversed = acl.clone();
        reversed.entries_mut().reverse();
        assert_ne!(acl, reversed);
        assert!(acl.permission_equivalent(&reversed));
        assert!(!acl.permission_equivalent(&Acl::from_mode(0o755)));
    }

    #[test]
    fn reordering_deny_and_allow_changes_the_rights() {
        let deny = AclEntry::new(Subject::User(501), Permissions::READ).with_flags(EntryFlags::DENY);
        let allow = AclEntry::new(Subject::User(501), Permissions::READ);
        let deny_first: Acl = [deny, allow].into_iter().collect();
        let allow_first: Acl = [allow, deny].into_iter().collect();

        assert!(deny_first.permission_equivalent(&[deny, allow].into_iter().collect()));
        assert!(!deny_first.permission_equivalent(&allow_first));
        assert!(!allow_first.permission_equivalent(&deny_first));
    }

    #[test]
    fn scopes_split_access_and_default_entries() {
        let mut acl = Acl::from_mode(0o750);
        acl.push(AclEntry::default_scope(Subject::Owner, Permissions::ALL));
        assert_eq!(acl.access_entries().count(), 3);
        assert_eq!(acl.default_entries().count(), 1);
        assert_eq!(acl.scoped(Scope::Default).len(), 1);
    }

    #[test]
    fn sort_canonical_orders_posix_entries() {
        let mut acl: Acl = [
            AclEntry::new(Subject::Other, Permissions::NONE),
            AclEntry::default_scope(Subject::Owner, Permissions::ALL),
            AclEntry::new(Subject::Mask, Permissions::ALL),
            AclEntry::new(Subject::Group(30), Permissions::READ),
            AclEntry::new(Subject::User(20), Permissions::READ),
            AclEntry::new(Subject::User(10), Permissions::READ),
            AclEntry::new(Subject::OwningGroup, Permissions::READ),
            AclEntry::new(Subject::Owner, Permissions::ALL),
        ]
        .into_iter()
        .collect();
        acl.sort_canonical();

        let subjects: Vec<_> = acl.entries().iter().map(|entry| entry.subject).collect();
        assert_eq!(
            subjects,
            [
                Subject::Owner,
                Subject::User(10),
                Subject::User(20),
                Subject::OwningGroup,
                Subject::Group(30),
                Subject::Mask,
                Subject::Other,
                Subject::Owner,
            ]
        );
        assert!(acl.entries()[7].is_default());
    }

    #[test]
    fn sort_canonical_puts_deny_first_and_inherited_last() {
        let mut acl: Acl = [
            AclEntry::new(Subject::User(1), Permissions::READ).with_flags(EntryFlags::INHERITED),
            AclEntry::new(Subject::User(2), Permissions::READ),
            AclEntry::new(Subject::User(3), Permissions::READ).with_flags(EntryFlags::DENY),
        ]
        .into_iter()
        .collect();
        acl.sort_canonical();

        let subjects: Vec<_> = acl.entries().iter().map(|entry| entry.subject).collect();
        assert_eq!(subjects, [Subject::User(3), Subject::User(2), Subject::User(1)]);
    }
}
