#![allow(dead_code)]

use model::{IdentityError, IdentityMap, NativeIdentity, PosixTag, Subject};
use uuid::Uuid;

const USER_PREFIX: u128 = 0xFFFF_EEEE_DDDD_CCCC_BBBB_AAAA_0000_0000;
const GROUP_PREFIX: u128 = 0xABCD_EFAB_CDEF_ABCD_EFAB_CDEF_0000_0000;
const ID_MASK: u128 = 0xFFFF_FFFF;

const EVERYONE: u128 = GROUP_PREFIX | 0x0C;
const OWNER: u128 = GROUP_PREFIX | 0x0A;
const GROUP: u128 = GROUP_PREFIX | 0x10;

/// Maps POSIX tags and ids one to one.
pub struct NumericIds;

impl IdentityMap for NumericIds {
    fn to_subject(&self, native: NativeIdentity) -> Result<Subject, IdentityError> {
        match native {
            NativeIdentity::Tag(PosixTag::UserObj) => Ok(Subject::Owner),
            NativeIdentity::Tag(PosixTag::GroupObj) => Ok(Subject::OwningGroup),
            NativeIdentity::Tag(PosixTag::Mask) => Ok(Subject::Mask),
            NativeIdentity::Tag(PosixTag::Other) => Ok(Subject::Other),
            NativeIdentity::Uid(uid) => Ok(Subject::User(uid)),
            NativeIdentity::Gid(gid) => Ok(Subject::Group(gid)),
            NativeIdentity::Guid(_) => Err(IdentityError::Unsupported(native.into())),
        }
    }

    fn to_native(&self, subject: Subject) -> Result<NativeIdentity, IdentityError> {
        Ok(match subject {
            Subject::Owner => NativeIdentity::Tag(PosixTag::UserObj),
            Subject::OwningGroup => NativeIdentity::Tag(PosixTag::GroupObj),
            Subject::Mask => NativeIdentity::Tag(PosixTag::Mask),
            Subject::Other => NativeIdentity::Tag(PosixTag::Other),
            Subject::User(uid) => NativeIdentity::Uid(uid),
            Subject::Group(gid) => NativeIdentity::Gid(gid),
        })
    }
}

/// Synthesizes GUIDs the way the membership service does for accounts
/// without a directory record.
pub struct SynthesizedGuids;

impl IdentityMap for SynthesizedGuids {
    fn to_subject(&self, native: NativeIdentity) -> Result<Subject, IdentityError> {
        let NativeIdentity::Guid(guid) = native else {
            return Err(IdentityError::Unsupported(native.into()));
        };
        let value = guid.as_u128();
        #[allow(clippy::cast_possible_truncation)]
        let id = (value & ID_MASK) as u32;
        match value {
            EVERYONE => Ok(Subject::Other),
            OWNER => Ok(Subject::Owner),
            GROUP => Ok(Subject::OwningGroup),
            _ if value & !ID_MASK == USER_PREFIX => Ok(Subject::User(id)),
            _ if value & !ID_MASK == GROUP_PREFIX => Ok(Subject::Group(id)),
            _ => Err(IdentityError::NotFound(native.into())),
        }
    }

    fn to_native(&self, subject: Subject) -> Result<NativeIdentity, IdentityError> {
        let value = match subject {
            Subject::Other => EVERYONE,
            Subject::Owner => OWNER,
            Subject::OwningGroup => GROUP,
            Subject::User(uid) => USER_PREFIX | u128::from(uid),
            Subject::Group(gid) => GROUP_PREFIX | u128::from(gid),
            Subject::Mask => return Err(IdentityError::Unsupported(subject.into())),
        };
        Ok(NativeIdentity::Guid(Uuid::from_u128(value)))
    }
}
