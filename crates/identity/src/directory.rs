//! Identity directory services the resolver consults on a cache miss.

use std::collections::BTreeMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};

use platform::IdKind;
use uuid::Uuid;

/// A source of user, group and GUID records.
///
/// `Ok(None)` means the directory answered and has no record; `Err` means it
/// could not answer.
pub trait Directory: Send + Sync {
    /// Looks up the login name of `uid`.
    fn user_name(&self, uid: u32) -> io::Result<Option<String>>;

    /// Looks up the name of `gid`.
    fn group_name(&self, gid: u32) -> io::Result<Option<String>>;

    /// Resolves a GUID to a numeric id and its domain.
    fn guid_to_id(&self, guid: Uuid) -> io::Result<Option<(u32, IdKind)>>;

    /// Returns the GUID assigned to `uid`.
    fn uid_to_guid(&self, uid: u32) -> io::Result<Option<Uuid>>;

    /// Returns the GUID assigned to `gid`.
    fn gid_to_guid(&self, gid: u32) -> io::Result<Option<Uuid>>;
}

/// The local operating system's account database and membership service.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemDirectory;

impl Directory for SystemDirectory {
    fn user_name(&self, uid: u32) -> io::Result<Option<String>> {
        platform::users::user_name(uid)
    }

    fn group_name(&self, gid: u32) -> io::Result<Option<String>> {
        platform::users::group_name(gid)
    }

    fn guid_to_id(&self, guid: Uuid) -> io::Result<Option<(u32, IdKind)>> {
        platform::membership::guid_to_id(guid)
    }

    fn uid_to_guid(&self, uid: u32) -> io::Result<Option<Uuid>> {
        platform::membership::uid_to_guid(uid)
    }

    fn gid_to_guid(&self, gid: u32) -> io::Result<Option<Uuid>> {
        platform::membership::gid_to_guid(gid)
    }
}

/// A fixed, in-memory directory.
///
/// Every call increments a counter so tests can observe how often the
/// resolver reached past its cache.
#[derive(Debug, Default)]
pub struct StaticDirectory {
    users: BTreeMap<u32, String>,
    groups: BTreeMap<u32, String>,
    guids: BTreeMap<Uuid, (u32, IdKind)>,
    lookups: AtomicUsize,
}

impl StaticDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a named user.
    #[must_use]
    pub fn with_user(mut self, uid: u32, name: &str) -> Self {
        self.users.insert(uid, name.to_owned());
        self
    }

    /// Adds a named group.
    #[must_use]
    pub fn with_group(mut self, gid: u32, name: &str) -> Self {
        self.groups.insert(gid, name.to_owned());
        self
    }

    /// Assigns `guid` to a user.
    #[must_use]
    pub fn with_user_guid(self, uid: u32, guid: Uuid) -> Self {
        self.with_guid(guid, uid, IdKind::User)
    }

    /// Assigns `guid` to a group.
    #[must_use]
    pub fn with_group_guid(self, gid: u32, guid: Uuid) -> Self {
        self.with_guid(guid, gid, IdKind::Group)
    }

    /// Records a GUID with an arbitrary domain.
    #[must_use]
    pub fn with_guid(mut self, guid: Uuid, id: u32, kind: IdKind) -> Self {
        self.guids.insert(guid, (id, kind));
        self
    }

    /// Returns how many lookups have been served.
    #[must_use]
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }

    fn count(&self) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
    }

    fn guid_of(&self, id: u32, kind: IdKind) -> Option<Uuid> {
        self.guids
            .iter()
            .find(|(_, entry)| **entry == (id, kind))
            .map(|(guid, _)| *guid)
    }
}

impl Directory for StaticDirectory {
    fn user_name(&self, uid: u32) -> io::Result<Option<String>> {
        self.count();
        Ok(self.users.get(&uid).cloned())
    }

    fn group_name(&self, gid: u32) -> io::Result<Option<String>> {
        self.count();
        Ok(self.groups.get(&gid).cloned())
    }

    fn guid_to_id(&self, guid: Uuid) -> io::Result<Option<(u32, IdKind)>> {
        self.count();
        Ok(self.guids.get(&guid).copied())
    }

    fn uid_to_guid(&self, uid: u32) -> io::Result<Option<Uuid>> {
        self.count();
        Ok(self.guid_of(uid, IdKind::User))
    }

    fn gid_to_guid(&self, gid: u32) -> io::Result<Option<Uuid>> {
        self.count();
        Ok(self.guid_of(gid, IdKind::Group))
    }
}

impl<D: Directory + ?Sized> Directory for &D {
    fn user_name(&self, uid: u32) -> io::Result<Option<String>> {
        (**self).user_name(uid)
    }

    fn group_name(&self, gid: u32) -> io::Result<Option<String>> {
        (**self).group_name(gid)
    }

    fn guid_to_id(&self, guid: Uuid) -> io::Result<Option<(u32, IdKind)>> {
        (**self).guid_to_id(guid)
    }

    fn uid_to_guid(&self, uid: u32) -> io::Result<Option<Uuid>> {
        (**self).uid_to_guid(uid)
    }

    fn gid_to_guid(&self, gid: u32) -> io::Result<Option<Uuid>> {
        (**self).gid_to_guid(gid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_directory_answers_seeded_records() {
        let guid = Uuid::from_u128(0xFFFF_EEEE_DDDD_CCCC_BBBB_AAAA_0000_0059);
        let directory = StaticDirectory::new()
            .with_user(89, "_spotlight")
            .with_user_guid(89, guid);

        assert_eq!(directory.user_name(89).expect("lookup").as_deref(), Some("_spotlight"));
        assert_eq!(directory.uid_to_guid(89).expect("lookup"), Some(guid));
        assert_eq!(directory.gid_to_guid(89).expect("lookup"), None);
        assert_eq!(directory.guid_to_id(guid).expect("lookup"), Some((89, IdKind::User)));
        assert_eq!(directory.lookups(), 4);
    }
}
