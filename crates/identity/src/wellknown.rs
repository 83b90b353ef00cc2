//! Well-known macOS principals encoded directly in a GUID.
//!
//! These GUIDs share the fingerprint `ABCDEFAB-CDEF-ABCD-EFAB-CDEF` and carry
//! a 32-bit code in their last four bytes. They never reach the directory
//! service.

use model::Subject;
use uuid::Uuid;

const FINGERPRINT: [u8; 12] = [
    0xAB, 0xCD, 0xEF, 0xAB, 0xCD, 0xEF, 0xAB, 0xCD, 0xEF, 0xAB, 0xCD, 0xEF,
];

/// `everyone@`.
pub const EVERYONE: u32 = 0x0000_000C;
/// `owner@`.
pub const OWNER: u32 = 0x0000_000A;
/// `group@`.
pub const GROUP: u32 = 0x0000_0010;
/// `nobody`.
pub const NOBODY: u32 = 0xFFFF_FFFE;

/// Outcome of classifying a GUID.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum WellKnown {
    Subject(Subject),
    Nobody,
}

/// Builds the well-known GUID carrying `code`.
#[must_use]
pub fn guid(code: u32) -> Uuid {
    let mut bytes = [0u8; 16];
    bytes[..12].copy_from_slice(&FINGERPRINT);
    bytes[12..].copy_from_slice(&code.to_be_bytes());
    Uuid::from_bytes(bytes)
}

pub(crate) fn classify(guid: Uuid) -> Option<WellKnown> {
    let bytes = guid.as_bytes();
    if bytes[..12] != FINGERPRINT {
        return None;
    }
    let code = u32::from_be_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);
    match code {
        EVERYONE => Some(WellKnown::Subject(Subject::Other)),
        OWNER => Some(WellKnown::Subject(Subject::Owner)),
        GROUP => Some(WellKnown::Subject(Subject::OwningGroup)),
        NOBODY => Some(WellKnown::Nobody),
        _ => None,
    }
}

pub(crate) fn for_subject(subject: Subject) -> Option<Uuid> {
    match subject {
        Subject::Owner => Some(guid(OWNER)),
        Subject::OwningGroup => Some(guid(GROUP)),
        Subject::Other => Some(guid(EVERYONE)),
        Subject::User(_) | Subject::Group(_) | Subject::Mask => None,
    }
}
