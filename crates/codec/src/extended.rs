//! macOS extended ACLs (`ACL_TYPE_EXTENDED`).
//!
//! Every entry names a GUID and is either an allow or a deny entry. There is
//! no owner/group/other triplet (the file mode carries that), no mask, and no
//! separate default ACL: inheritance is expressed through per-entry flags.
//!
//! Only read, write and execute map onto [`Permissions`]. The remaining
//! libSystem rights (`delete`, `append`, `writesecurity`, ...) and any flag
//! bits this module does not know are kept as [`VendorBits`] so a decoded
//! entry re-encodes without losing them.

use model::{
    Acl, AclEntry, EntryFlags, IdentityError, IdentityMap, IdentityScheme, Layout, NativeIdentity,
    Permissions, Principal, Subject, VendorBits,
};
use platform::ExtendedAce;
use platform::extended::{
    FLAG_DIRECTORY_INHERIT, FLAG_FILE_INHERIT, FLAG_INHERITED, FLAG_LIMIT_INHERIT,
    FLAG_ONLY_INHERIT, PERM_EXECUTE, PERM_READ_DATA, PERM_WRITE_DATA, TAG_ALLOW, TAG_DENY,
};

use crate::NativeCodec;
use crate::error::CodecError;

const PERMS: [(u64, Permissions); 3] = [
    (PERM_READ_DATA, Permissions::READ),
    (PERM_WRITE_DATA, Permissions::WRITE),
    (PERM_EXECUTE, Permissions::EXECUTE),
];

const FLAGS: [(u32, EntryFlags); 5] = [
    (FLAG_INHERITED, EntryFlags::INHERITED),
    (FLAG_FILE_INHERIT, EntryFlags::FILE_INHERIT),
    (FLAG_DIRECTORY_INHERIT, EntryFlags::DIRECTORY_INHERIT),
    (FLAG_LIMIT_INHERIT, EntryFlags::LIMIT_INHERIT),
    (FLAG_ONLY_INHERIT, EntryFlags::ONLY_INHERIT),
];

const RWX_MASK: u64 = PERM_READ_DATA | PERM_WRITE_DATA | PERM_EXECUTE;
const FLAG_MASK: u32 = FLAG_INHERITED
    | FLAG_FILE_INHERIT
    | FLAG_DIRECTORY_INHERIT
    | FLAG_LIMIT_INHERIT
    | FLAG_ONLY_INHERIT;

/// Codec for macOS GUID-based extended ACLs.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExtendedCodec;

impl NativeCodec for ExtendedCodec {
    type Raw = Vec<ExtendedAce>;

    const LAYOUT: Layout = Layout::Extended;
    const SCHEME: IdentityScheme = IdentityScheme::Guid;

    fn decode(
        raw: &Vec<ExtendedAce>,
        is_directory: bool,
        ids: &dyn IdentityMap,
    ) -> Result<Acl, CodecError> {
        let acl = raw
            .iter()
            .enumerate()
            .map(|(index, ace)| decode_entry(index, ace, ids))
            .collect::<Result<Acl, _>>()?;
        acl.validate_for(is_directory, Layout::Extended)?;

        tracing::trace!(
            target: crate::CODEC_TARGET,
            entries = acl.len(),
            "decoded extended ACL"
        );
        Ok(acl)
    }

    fn encode(
        acl: &Acl,
        is_directory: bool,
        ids: &dyn IdentityMap,
    ) -> Result<Vec<ExtendedAce>, CodecError> {
        for (index, entry) in acl.entries().iter().enumerate() {
            if entry.is_default() {
                return Err(CodecError::InvalidScope {
                    index,
                    subject: entry.subject,
                });
            }
        }
        acl.validate_for(is_directory, Layout::Extended)?;

        acl.entries()
            .iter()
            .enumerate()
            .map(|(index, entry)| encode_entry(index, entry, ids))
            .collect()
    }
}

fn decode_entry(
    index: usize,
    ace: &ExtendedAce,
    ids: &dyn IdentityMap,
) -> Result<AclEntry, CodecError> {
    let mut flags = match ace.tag {
        TAG_ALLOW => EntryFlags::empty(),
        TAG_DENY => EntryFlags::DENY,
        other => return Err(CodecError::unsupported(index, format!("unknown tag {other}"))),
    };
    for (bit, flag) in FLAGS {
        if ace.flags & bit != 0 {
            flags |= flag;
        }
    }

    let permissions = PERMS
        .iter()
        .filter(|(bit, _)| ace.perms & bit != 0)
        .fold(Permissions::NONE, |acc, (_, perm)| acc | *perm);

    let subject = ids
        .to_subject(NativeIdentity::Guid(ace.qualifier))
        .map_err(|source| CodecError::identity(index, source))?;

    Ok(AclEntry::new(subject, permissions)
        .with_flags(flags)
        .with_vendor_bits(VendorBits {
            perms: ace.perms & !RWX_MASK,
            flags: ace.flags & !FLAG_MASK,
        }))
}

fn encode_entry(
    index: usize,
    entry: &AclEntry,
    ids: &dyn IdentityMap,
) -> Result<ExtendedAce, CodecError> {
    if entry.subject == Subject::Mask {
        return Err(CodecError::identity(
            index,
            IdentityError::Unsupported(Principal::Subject(Subject::Mask)),
        ));
    }
    let qualifier = match ids
        .to_native(entry.subject)
        .map_err(|source| CodecError::identity(index, source))?
    {
        NativeIdentity::Guid(guid) => guid,
        other => {
            return Err(CodecError::identity(
                index,
                IdentityError::Unsupported(Principal::Native(other)),
            ));
        }
    };

    let vendor = entry.retained_vendor_bits().unwrap_or_default();
    let perms = PERMS
        .iter()
        .filter(|(_, perm)| entry.permissions.contains(*perm))
        .fold(vendor.perms & !RWX_MASK, |acc, (bit, _)| acc | bit);
    let flags = FLAGS
        .iter()
        .filter(|(_, flag)| entry.flags.contains(*flag))
        .fold(vendor.flags & !FLAG_MASK, |acc, (bit, _)| acc | bit);

    Ok(ExtendedAce {
        tag: if entry.is_deny() { TAG_DENY } else { TAG_ALLOW },
        qualifier,
        perms,
        flags,
    })
}
