//! crates/model/src/entry.rs
//!
//! A single ACL entry and the native bits it carries through a round trip.

use crate::identity::Subject;
use crate::perms::{EntryFlags, Permissions};

/// Native bits with no canonical counterpart.
///
/// Codecs capture these on decode (extended permission bits such as
/// `delete` or `write_security`, unknown flag bits) and re-emit them on encode
/// so that reading and rewriting an ACL does not silently drop rights.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VendorBits {
    /// Native permission bits outside read/write/execute.
    pub perms: u64,
    /// Native flag bits outside the known inheritance markers.
    pub flags: u32,
}

impl VendorBits {
    /// Returns `true` when no bits were captured.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.perms == 0 && self.flags == 0
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Capture {
    bits: VendorBits,
    subject: Subject,
    permissions: Permissions,
    flags: EntryFlags,
}

/// One ACL entry: who it applies to, what it grants, and how.
///
/// Equality compares subject, permissions, flags and the vendor bits that
/// would be re-emitted on encode.
#[derive(Clone, Copy, Debug, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "EntryRepr", into = "EntryRepr")
)]
pub struct AclEntry {
    /// Principal the entry applies to.
    pub subject: Subject,
    /// Rights granted (or denied, with [`EntryFlags::DENY`]).
    pub permissions: Permissions,
    /// Scope and inheritance modifiers.
    pub flags: EntryFlags,
    vendor: Option<Capture>,
}

/// Serialized form of [`AclEntry`]: vendor bits appear only while retained.
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct EntryRepr {
    subject: Subject,
    permissions: Permissions,
    #[serde(default)]
    flags: EntryFlags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    vendor: Option<VendorBits>,
}

#[cfg(feature = "serde")]
impl From<EntryRepr> for AclEntry {
    fn from(repr: EntryRepr) -> Self {
        let entry = Self::new(repr.subject, repr.permissions).with_flags(repr.flags);
        match repr.vendor {
            Some(bits) => entry.with_vendor_bits(bits),
            None => entry,
        }
    }
}

#[cfg(feature = "serde")]
impl From<AclEntry> for EntryRepr {
    fn from(entry: AclEntry) -> Self {
        Self {
            subject: entry.subject,
            permissions: entry.permissions,
            flags: entry.flags,
            vendor: entry.retained_vendor_bits(),
        }
    }
}

impl AclEntry {
    /// Creates an entry with no flags.
    #[must_use]
    pub const fn new(subject: Subject, permissions: Permissions) -> Self {
        Self {
            subject,
            permissions,
            flags: EntryFlags::empty(),
            vendor: None,
        }
    }

    /// Creates an entry in the default ACL scope.
    #[must_use]
    pub const fn default_scope(subject: Subject, permissions: Permissions) -> Self {
        Self::new(subject, permissions).with_flags(EntryFlags::DEFAULT)
    }

    /// Replaces the entry's flags.
    #[must_use]
    pub const fn with_flags(mut self, flags: EntryFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Attaches native bits captured while decoding this entry.
    ///
    /// The bits are anchored to the entry's current subject, permissions and
    /// flags; changing any of them afterwards drops the bits on encode.
    #[must_use]
    pub fn with_vendor_bits(mut self, bits: VendorBits) -> Self {
        self.vendor = (!bits.is_empty()).then_some(Capture {
            bits,
            subject: self.subject,
            permissions: self.permissions,
            flags: self.flags,
        });
        self
    }

    /// Returns the captured vendor bits, whether or not they are still valid.
    #[must_use]
    pub fn vendor_bits(&self) -> Option<VendorBits> {
        self.vendor.map(|capture| capture.bits)
    }

    /// Returns the vendor bits to re-emit, or `None` when the entry was
    /// modified since decode.
    #[must_use]
    pub fn retained_vendor_bits(&self) -> Option<VendorBits> {
        self.vendor
            .filter(|capture| {
                capture.subject == self.subject
                    && capture.permissions == self.permissions
                    && capture.flags == self.flags
            })
            .map(|capture| capture.bits)
    }

    /// Drops any captured vendor bits.
    pub fn clear_vendor_bits(&mut self) {
        self.vendor = None;
    }

    /// Returns `true` when the entry belongs to the default ACL scope.
    #[must_use]
    pub const fn is_default(&self) -> bool {
        self.flags.contains(EntryFlags::DEFAULT)
    }

    /// Returns `true` for a deny entry.
    #[must_use]
    pub const fn is_deny(&self) -> bool {
        self.flags.contains(EntryFlags::DENY)
    }
}

impl PartialEq for AclEntry {
    fn eq(&self, other: &Self) -> bool {
        self.subject == other.subject
            && self.permissions == other.permissions
            && self.flags == other.flags
            && self.retained_vendor_bits() == other.retained_vendor_bits()
    }
}
