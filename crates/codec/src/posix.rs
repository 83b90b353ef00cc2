//! POSIX.1e ACLs in the Linux kernel's extended attribute format.
//!
//! # Wire Format
//!
//! ```text
//! header : u32 LE   // POSIX_ACL_XATTR_VERSION = 0x0002
//! For each entry:
//!   tag  : u16 LE   // USER_OBJ 0x01, USER 0x02, GROUP_OBJ 0x04,
//!                   // GROUP 0x08, MASK 0x10, OTHER 0x20
//!   perm : u16 LE   // READ 4, WRITE 2, EXECUTE 1
//!   id   : u32 LE   // uid/gid for USER/GROUP, 0xFFFFFFFF otherwise
//! ```
//!
//! [`PosixCodec::encode`] keeps the caller's entry order so a decoded ACL
//! re-encodes to the same bytes. The kernel only accepts entries sorted by tag
//! and id; [`canonical_order`] produces that order just before the attribute
//! is written.

use model::{
    Acl, AclEntry, EntryFlags, IdentityError, IdentityMap, IdentityScheme, Layout, NativeIdentity,
    Permissions, PosixTag, Principal, Scope, VendorBits,
};

use crate::NativeCodec;
use crate::error::CodecError;

/// `POSIX_ACL_XATTR_VERSION`.
pub const XATTR_VERSION: u32 = 0x0002;
/// `ACL_USER_OBJ`.
pub const TAG_USER_OBJ: u16 = 0x01;
/// `ACL_USER`.
pub const TAG_USER: u16 = 0x02;
/// `ACL_GROUP_OBJ`.
pub const TAG_GROUP_OBJ: u16 = 0x04;
/// `ACL_GROUP`.
pub const TAG_GROUP: u16 = 0x08;
/// `ACL_MASK`.
pub const TAG_MASK: u16 = 0x10;
/// `ACL_OTHER`.
pub const TAG_OTHER: u16 = 0x20;
/// `ACL_UNDEFINED_ID`.
pub const UNDEFINED_ID: u32 = u32::MAX;

const HEADER_LEN: usize = 4;
const ENTRY_LEN: usize = 8;
const RWX: u16 = 0o7;

/// Native POSIX ACL state of one file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PosixAcl {
    /// `system.posix_acl_access`, or `None` when the file has no access ACL.
    pub access: Option<Vec<u8>>,
    /// `system.posix_acl_default`, or `None` when there is none. On encode,
    /// `None` for a directory means the default ACL is to be removed.
    pub default: Option<Vec<u8>>,
    /// Permission bits of the file mode.
    pub mode: u32,
}

/// Codec for Linux POSIX.1e ACLs.
#[derive(Clone, Copy, Debug, Default)]
pub struct PosixCodec;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct RawEntry {
    tag: u16,
    perm: u16,
    id: u32,
}

impl NativeCodec for PosixCodec {
    type Raw = PosixAcl;

    const LAYOUT: Layout = Layout::Posix1e;
    const SCHEME: IdentityScheme = IdentityScheme::Numeric;

    fn decode(raw: &PosixAcl, is_directory: bool, ids: &dyn IdentityMap) -> Result<Acl, CodecError> {
        let mut acl = match &raw.access {
            Some(blob) => {
                let mut acl = Acl::new();
                decode_blob(blob, EntryFlags::empty(), ids, &mut acl)?;
                acl
            }
            None => Acl::from_mode(raw.mode),
        };

        if let Some(blob) = &raw.default {
            let first = acl.len();
            decode_blob(blob, EntryFlags::DEFAULT, ids, &mut acl)?;
            if !is_directory {
                return Err(match acl.entries().get(first) {
                    Some(entry) => CodecError::InvalidScope {
                        index: first,
                        subject: entry.subject,
                    },
                    None => CodecError::malformed("default ACL present on a non-directory"),
                });
            }
        }

        tracing::trace!(
            target: crate::CODEC_TARGET,
            entries = acl.len(),
            "decoded POSIX ACL"
        );
        Ok(acl)
    }

    fn encode(acl: &Acl, is_directory: bool, ids: &dyn IdentityMap) -> Result<PosixAcl, CodecError> {
        for (index, entry) in acl.entries().iter().enumerate() {
            let extra = entry.flags - EntryFlags::DEFAULT;
            if !extra.is_empty() {
                let names: Vec<_> = extra.names().collect();
                return Err(CodecError::unsupported(
                    index,
                    format!("POSIX ACLs have no {} entries", names.join("/")),
                ));
            }
        }
        acl.validate_for(is_directory, Layout::Posix1e)?;

        let mut access = Vec::new();
        let mut default = Vec::new();
        for (index, entry) in acl.entries().iter().enumerate() {
            let raw = encode_entry(index, entry, ids)?;
            match Scope::of(entry) {
                Scope::Access => access.push(raw),
                Scope::Default => default.push(raw),
            }
        }

        let mode = acl
            .mode_bits()
            .ok_or_else(|| CodecError::malformed("access ACL has no mode equivalent"))?;

        Ok(PosixAcl {
            access: Some(write_blob(&access)),
            default: (is_directory && !default.is_empty()).then(|| write_blob(&default)),
            mode,
        })
    }
}

fn decode_blob(
    blob: &[u8],
    flags: EntryFlags,
    ids: &dyn IdentityMap,
    acl: &mut Acl,
) -> Result<(), CodecError> {
    for raw in parse_blob(blob)? {
        let index = acl.len();
        let native = match raw.tag {
            TAG_USER_OBJ => NativeIdentity::Tag(PosixTag::UserObj),
            TAG_USER => NativeIdentity::Uid(raw.id),
            TAG_GROUP_OBJ => NativeIdentity::Tag(PosixTag::GroupObj),
            TAG_GROUP => NativeIdentity::Gid(raw.id),
            TAG_MASK => NativeIdentity::Tag(PosixTag::Mask),
            TAG_OTHER => NativeIdentity::Tag(PosixTag::Other),
            other => {
                return Err(CodecError::unsupported(index, format!("unknown tag {other:#06x}")));
            }
        };
        let subject = ids
            .to_subject(native)
            .map_err(|source| CodecError::identity(index, source))?;

        let entry = AclEntry::new(subject, Permissions::from_mode_bits(u32::from(raw.perm)))
            .with_flags(flags)
            .with_vendor_bits(VendorBits {
                perms: u64::from(raw.perm & !RWX),
                flags: 0,
            });
        acl.push(entry);
    }
    Ok(())
}

fn encode_entry(
    index: usize,
    entry: &AclEntry,
    ids: &dyn IdentityMap,
) -> Result<RawEntry, CodecError> {
    let native = ids
        .to_native(entry.subject)
        .map_err(|source| CodecError::identity(index, source))?;

    let (tag, id) = match native {
        NativeIdentity::Tag(PosixTag::UserObj) => (TAG_USER_OBJ, UNDEFINED_ID),
        NativeIdentity::Tag(PosixTag::GroupObj) => (TAG_GROUP_OBJ, UNDEFINED_ID),
        NativeIdentity::Tag(PosixTag::Mask) => (TAG_MASK, UNDEFINED_ID),
        NativeIdentity::Tag(PosixTag::Other) => (TAG_OTHER, UNDEFINED_ID),
        NativeIdentity::Uid(uid) => (TAG_USER, uid),
        NativeIdentity::Gid(gid) => (TAG_GROUP, gid),
        NativeIdentity::Guid(_) => {
            return Err(CodecError::identity(
                index,
                IdentityError::Unsupported(Principal::Native(native)),
            ));
        }
    };

    let vendor = entry
        .retained_vendor_bits()
        .and_then(|bits| u16::try_from(bits.perms).ok())
        .unwrap_or(0);
    // Perms are three bits; the cast cannot truncate.
    #[allow(clippy::cast_possible_truncation)]
    let perm = entry.permissions.mode_bits() as u16 | (vendor & !RWX);

    Ok(RawEntry { tag, perm, id })
}

fn parse_blob(blob: &[u8]) -> Result<Vec<RawEntry>, CodecError> {
    let Some((header, body)) = blob.split_first_chunk::<HEADER_LEN>() else {
        return Err(CodecError::malformed(format!(
            "{} bytes is shorter than the header",
            blob.len()
        )));
    };
    let version = u32::from_le_bytes(*header);
    if version != XATTR_VERSION {
        return Err(CodecError::malformed(format!("unsupported version {version:#x}")));
    }
    if body.len() % ENTRY_LEN != 0 {
        return Err(CodecError::malformed(format!(
            "{} trailing bytes after the last entry",
            body.len() % ENTRY_LEN
        )));
    }

    Ok(body
        .chunks_exact(ENTRY_LEN)
        .map(|chunk| RawEntry {
            tag: u16::from_le_bytes([chunk[0], chunk[1]]),
            perm: u16::from_le_bytes([chunk[2], chunk[3]]),
            id: u32::from_le_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]),
        })
        .collect())
}

fn write_blob(entries: &[RawEntry]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(HEADER_LEN + entries.len() * ENTRY_LEN);
    blob.extend_from_slice(&XATTR_VERSION.to_le_bytes());
    for entry in entries {
        blob.extend_from_slice(&entry.tag.to_le_bytes());
        blob.extend_from_slice(&entry.perm.to_le_bytes());
        blob.extend_from_slice(&entry.id.to_le_bytes());
    }
    blob
}

/// Reorders a blob's entries into the order the kernel requires: by tag
/// (`USER_OBJ`, `USER`, `GROUP_OBJ`, `GROUP`, `MASK`, `OTHER`), then by id.
///
/// # Errors
///
/// Returns [`CodecError::MalformedNative`] when `blob` cannot be parsed.
pub fn canonical_order(blob: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut entries = parse_blob(blob)?;
    entries.sort_by_key(|entry| (entry.tag, entry.id));
    Ok(write_blob(&entries))
}
