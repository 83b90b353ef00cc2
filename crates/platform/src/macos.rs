#![allow(unsafe_code)]

//! libSystem bindings for extended ACLs and GUID membership.

use std::ffi::CString;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::ptr;

use uuid::Uuid;

use crate::extended::{ExtendedAce, FLAG_ALL};
use crate::membership::IdKind;

mod sys {
    #![allow(non_camel_case_types)]

    use libc::{c_char, c_int, c_uchar, c_uint, c_void, gid_t, id_t, uid_t};

    pub type acl_t = *mut c_void;
    pub type acl_entry_t = *mut c_void;
    pub type acl_flagset_t = *mut c_void;
    pub type acl_type_t = c_int;
    pub type acl_tag_t = c_uint;
    pub type acl_flag_t = c_uint;
    pub type acl_permset_mask_t = u64;

    pub const ACL_TYPE_EXTENDED: acl_type_t = 0x0000_0100;
    pub const ACL_FIRST_ENTRY: c_int = 0;
    pub const ACL_NEXT_ENTRY: c_int = -1;

    unsafe extern "C" {
        pub fn acl_get_file(path_p: *const c_char, ty: acl_type_t) -> acl_t;
        pub fn acl_get_link_np(path_p: *const c_char, ty: acl_type_t) -> acl_t;
        pub fn acl_set_file(path_p: *const c_char, ty: acl_type_t, acl: acl_t) -> c_int;
        pub fn acl_set_link_np(path_p: *const c_char, ty: acl_type_t, acl: acl_t) -> c_int;
        pub fn acl_init(count: c_int) -> acl_t;
        pub fn acl_free(obj_p: *mut c_void) -> c_int;
        pub fn acl_get_entry(acl: acl_t, entry_id: c_int, entry_p: *mut acl_entry_t) -> c_int;
        pub fn acl_create_entry(acl_p: *mut acl_t, entry_p: *mut acl_entry_t) -> c_int;
        pub fn acl_get_tag_type(entry_d: acl_entry_t, tag_type_p: *mut acl_tag_t) -> c_int;
        pub fn acl_set_tag_type(entry_d: acl_entry_t, tag_type: acl_tag_t) -> c_int;
        pub fn acl_get_qualifier(entry_d: acl_entry_t) -> *mut c_void;
        pub fn acl_set_qualifier(entry_d: acl_entry_t, qualifier_p: *const c_void) -> c_int;
        pub fn acl_get_permset_mask_np(
            entry_d: acl_entry_t,
            mask_p: *mut acl_permset_mask_t,
        ) -> c_int;
        pub fn acl_set_permset_mask_np(entry_d: acl_entry_t, mask: acl_permset_mask_t) -> c_int;
        pub fn acl_get_flagset_np(obj_p: *mut c_void, flagset_p: *mut acl_flagset_t) -> c_int;
        pub fn acl_set_flagset_np(obj_p: *mut c_void, flagset_d: acl_flagset_t) -> c_int;
        pub fn acl_get_flag_np(flagset_d: acl_flagset_t, flag: acl_flag_t) -> c_int;
        pub fn acl_add_flag_np(flagset_d: acl_flagset_t, flag: acl_flag_t) -> c_int;
        pub fn acl_clear_flags_np(flagset_d: acl_flagset_t) -> c_int;

        pub fn mbr_uid_to_uuid(uid: uid_t, uu: *mut c_uchar) -> c_int;
        pub fn mbr_gid_to_uuid(gid: gid_t, uu: *mut c_uchar) -> c_int;
        pub fn mbr_uuid_to_id(uu: *const c_uchar, id: *mut id_t, id_type: *mut c_int) -> c_int;
    }
}

/// Owned `acl_t`, released with `acl_free`.
struct OwnedAcl(sys::acl_t);

impl OwnedAcl {
    fn with_capacity(count: usize) -> io::Result<Self> {
        let count = libc::c_int::try_from(count)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "too many ACL entries"))?;
        // Safety: acl_init has no preconditions beyond a non-negative count.
        let acl = unsafe { sys::acl_init(count) };
        if acl.is_null() {
            Err(io::Error::last_os_error())
        } else {
            Ok(Self(acl))
        }
    }

    fn entries(&self) -> io::Result<Vec<ExtendedAce>> {
        let mut entries = Vec::new();
        let mut entry: sys::acl_entry_t = ptr::null_mut();
        let mut which = sys::ACL_FIRST_ENTRY;
        // Safety: self.0 is a live ACL and entry is a valid out-pointer. macOS
        // returns 0 while entries remain and -1 once the walk is exhausted.
        while unsafe { sys::acl_get_entry(self.0, which, &mut entry) } == 0 {
            entries.push(read_entry(entry)?);
            which = sys::ACL_NEXT_ENTRY;
        }
        Ok(entries)
    }

    fn push(&mut self, ace: &ExtendedAce) -> io::Result<()> {
        let mut entry: sys::acl_entry_t = ptr::null_mut();
        // Safety: acl_create_entry may reallocate the ACL and updates self.0
        // through the pointer we hand it.
        check(unsafe { sys::acl_create_entry(&mut self.0, &mut entry) })?;
        // Safety: entry was just created inside self.0 and stays valid until
        // the next reallocation, which only happens on the next push.
        unsafe {
            check(sys::acl_set_tag_type(entry, ace.tag))?;
            let guid = ace.qualifier.into_bytes();
            check(sys::acl_set_qualifier(entry, guid.as_ptr().cast()))?;
            check(sys::acl_set_permset_mask_np(entry, ace.perms))?;

            let mut flagset: sys::acl_flagset_t = ptr::null_mut();
            check(sys::acl_get_flagset_np(entry, &mut flagset))?;
            check(sys::acl_clear_flags_np(flagset))?;
            for flag in FLAG_ALL.into_iter().filter(|flag| ace.flags & flag != 0) {
                check(sys::acl_add_flag_np(flagset, flag))?;
            }
            check(sys::acl_set_flagset_np(entry, flagset))?;
        }
        Ok(())
    }
}

impl Drop for OwnedAcl {
    fn drop(&mut self) {
        if !self.0.is_null() {
            // Safety: the pointer came from acl_init or acl_get_*.
            unsafe {
                sys::acl_free(self.0);
            }
        }
    }
}

fn check(result: libc::c_int) -> io::Result<()> {
    if result == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

fn read_entry(entry: sys::acl_entry_t) -> io::Result<ExtendedAce> {
    let mut tag: sys::acl_tag_t = 0;
    let mut perms: sys::acl_permset_mask_t = 0;
    let mut flagset: sys::acl_flagset_t = ptr::null_mut();

    // Safety: entry is a live entry of an ACL owned by the caller.
    unsafe {
        check(sys::acl_get_tag_type(entry, &mut tag))?;
        check(sys::acl_get_permset_mask_np(entry, &mut perms))?;
        check(sys::acl_get_flagset_np(entry, &mut flagset))?;
    }

    let flags = FLAG_ALL
        .into_iter()
        // Safety: flagset was filled in by acl_get_flagset_np above.
        .filter(|flag| unsafe { sys::acl_get_flag_np(flagset, *flag) } == 1)
        .fold(0, |acc, flag| acc | flag);

    // Safety: the qualifier of an extended entry is a 16-byte guid_t that
    // must be released with acl_free.
    let qualifier = unsafe {
        let raw = sys::acl_get_qualifier(entry);
        if raw.is_null() {
            return Err(io::Error::last_os_error());
        }
        let bytes = *raw.cast::<[u8; 16]>();
        sys::acl_free(raw);
        Uuid::from_bytes(bytes)
    };

    Ok(ExtendedAce {
        tag,
        qualifier,
        perms,
        flags,
    })
}

fn c_path(path: &Path) -> io::Result<CString> {
    CString::new(path.as_os_str().as_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains interior NUL"))
}

pub(crate) fn read_extended(path: &Path, follow_symlinks: bool) -> io::Result<Vec<ExtendedAce>> {
    let c_path = c_path(path)?;
    // Safety: c_path outlives the call.
    let acl = unsafe {
        if follow_symlinks {
            sys::acl_get_file(c_path.as_ptr(), sys::ACL_TYPE_EXTENDED)
        } else {
            sys::acl_get_link_np(c_path.as_ptr(), sys::ACL_TYPE_EXTENDED)
        }
    };
    if acl.is_null() {
        let error = io::Error::last_os_error();
        // ENOENT for an existing path means "no ACL".
        let exists = if follow_symlinks {
            path.exists()
        } else {
            path.symlink_metadata().is_ok()
        };
        if error.raw_os_error() == Some(libc::ENOENT) && exists {
            return Ok(Vec::new());
        }
        return Err(error);
    }
    OwnedAcl(acl).entries()
}

pub(crate) fn write_extended(
    path: &Path,
    entries: &[ExtendedAce],
    follow_symlinks: bool,
) -> io::Result<()> {
    let c_path = c_path(path)?;
    let mut acl = OwnedAcl::with_capacity(entries.len().max(1))?;
    for ace in entries {
        acl.push(ace)?;
    }
    // Safety: c_path and acl outlive the call.
    let result = unsafe {
        if follow_symlinks {
            sys::acl_set_file(c_path.as_ptr(), sys::ACL_TYPE_EXTENDED, acl.0)
        } else {
            sys::acl_set_link_np(c_path.as_ptr(), sys::ACL_TYPE_EXTENDED, acl.0)
        }
    };
    check(result)
}

fn guid_lookup(result: libc::c_int, bytes: [u8; 16]) -> io::Result<Option<Uuid>> {
    match result {
        0 => Ok(Some(Uuid::from_bytes(bytes))),
        libc::ENOENT => Ok(None),
        errno => Err(io::Error::from_raw_os_error(errno)),
    }
}

pub(crate) fn uid_to_guid(uid: u32) -> io::Result<Option<Uuid>> {
    let mut bytes = [0u8; 16];
    // Safety: bytes is a 16-byte uuid_t buffer.
    let result = unsafe { sys::mbr_uid_to_uuid(uid, bytes.as_mut_ptr()) };
    guid_lookup(result, bytes)
}

pub(crate) fn gid_to_guid(gid: u32) -> io::Result<Option<Uuid>> {
    let mut bytes = [0u8; 16];
    // Safety: bytes is a 16-byte uuid_t buffer.
    let result = unsafe { sys::mbr_gid_to_uuid(gid, bytes.as_mut_ptr()) };
    guid_lookup(result, bytes)
}

pub(crate) fn guid_to_id(guid: Uuid) -> io::Result<Option<(u32, IdKind)>> {
    let bytes = guid.into_bytes();
    let mut id: libc::id_t = 0;
    let mut id_type: libc::c_int = 0;
    // Safety: bytes is a 16-byte uuid_t and both out-pointers are valid.
    let result = unsafe { sys::mbr_uuid_to_id(bytes.as_ptr(), &mut id, &mut id_type) };
    match result {
        0 => Ok(Some((id, IdKind::from_raw(id_type)))),
        libc::ENOENT => Ok(None),
        errno => Err(io::Error::from_raw_os_error(errno)),
    }
}
