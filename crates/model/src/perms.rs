//! crates/model/src/perms.rs
//!
//! Permission and entry-flag bit sets.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Sub};
use std::str::FromStr;

use thiserror::Error;

/// Read/write/execute rights granted by an ACL entry.
///
/// The bit layout matches the `rwx` triplets of a file mode, so
/// `Permissions::from_mode_bits(mode >> 6)` yields the owner's rights.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(into = "String", try_from = "String")
)]
pub struct Permissions(u8);

impl Permissions {
    /// No rights.
    pub const NONE: Self = Self(0);
    /// Execute (or search, for directories).
    pub const EXECUTE: Self = Self(0b001);
    /// Write.
    pub const WRITE: Self = Self(0b010);
    /// Read.
    pub const READ: Self = Self(0b100);
    /// Read, write and execute.
    pub const ALL: Self = Self(0b111);

    /// Builds a permission set from the low three bits of a mode triplet.
    #[must_use]
    pub const fn from_mode_bits(bits: u32) -> Self {
        Self((bits & 0o7) as u8)
    }

    /// Returns the permission set as a mode triplet (`0..=7`).
    #[must_use]
    pub const fn mode_bits(self) -> u32 {
        self.0 as u32
    }

    /// Returns `true` when every right in `other` is also granted here.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` when no rights are granted.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` when read access is granted.
    #[must_use]
    pub const fn read(self) -> bool {
        self.contains(Self::READ)
    }

    /// Returns `true` when write access is granted.
    #[must_use]
    pub const fn write(self) -> bool {
        self.contains(Self::WRITE)
    }

    /// Returns `true` when execute access is granted.
    #[must_use]
    pub const fn execute(self) -> bool {
        self.contains(Self::EXECUTE)
    }
}

impl BitOr for Permissions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Permissions {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Permissions {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = if self.read() { 'r' } else { '-' };
        let w = if self.write() { 'w' } else { '-' };
        let x = if self.execute() { 'x' } else { '-' };
        write!(f, "{r}{w}{x}")
    }
}

/// Error returned when a permission string such as `rw-` cannot be parsed.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("invalid permission string '{0}'")]
pub struct ParsePermissionsError(String);

impl FromStr for Permissions {
    type Err = ParsePermissionsError;

    /// Parses a fixed-position `rwx` triplet; `-` leaves a slot unset.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let invalid = || ParsePermissionsError(text.to_owned());
        let bytes = text.as_bytes();
        if bytes.len() != 3 {
            return Err(invalid());
        }
        let slots = [(b'r', Self::READ), (b'w', Self::WRITE), (b'x', Self::EXECUTE)];
        bytes
            .iter()
            .zip(slots)
            .try_fold(Self::NONE, |perms, (byte, (letter, bit))| match *byte {
                b'-' => Ok(perms),
                b if b == letter => Ok(perms | bit),
                _ => Err(invalid()),
            })
    }
}

impl From<Permissions> for String {
    fn from(perms: Permissions) -> Self {
        perms.to_string()
    }
}

impl TryFrom<String> for Permissions {
    type Error = ParsePermissionsError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        text.parse()
    }
}

/// Platform-specific modifiers attached to an ACL entry.
///
/// `DEFAULT` marks a Linux default-ACL entry; `DENY` marks a macOS deny entry;
/// the remaining bits are macOS inheritance markers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(into = "Vec<String>", try_from = "Vec<String>")
)]
pub struct EntryFlags(u32);

impl EntryFlags {
    /// Entry belongs to a directory's default ACL.
    pub const DEFAULT: Self = Self(0x0001);
    /// Entry denies rather than grants its permissions.
    pub const DENY: Self = Self(0x0002);
    /// Entry was inherited from the parent directory.
    pub const INHERITED: Self = Self(0x0010);
    /// Entry is inherited by files created in the directory.
    pub const FILE_INHERIT: Self = Self(0x0020);
    /// Entry is inherited by subdirectories.
    pub const DIRECTORY_INHERIT: Self = Self(0x0040);
    /// Inherited copies drop `DIRECTORY_INHERIT`.
    pub const LIMIT_INHERIT: Self = Self(0x0080);
    /// Entry is only inherited and does not apply to the directory itself.
    pub const ONLY_INHERIT: Self = Self(0x0100);

    /// Flags that only make sense on a directory.
    pub const DIRECTORY_SCOPED: Self = Self(
        Self::DEFAULT.0
            | Self::FILE_INHERIT.0
            | Self::DIRECTORY_INHERIT.0
            | Self::LIMIT_INHERIT.0
            | Self::ONLY_INHERIT.0,
    );

    /// Inheritance markers understood by the extended ACL model.
    pub const INHERITANCE: Self = Self(
        Self::INHERITED.0
            | Self::FILE_INHERIT.0
            | Self::DIRECTORY_INHERIT.0
            | Self::LIMIT_INHERIT.0
            | Self::ONLY_INHERIT.0,
    );

    const NAMES: [(Self, &'static str); 7] = [
        (Self::DEFAULT, "default"),
        (Self::DENY, "deny"),
        (Self::INHERITED, "inherited"),
        (Self::FILE_INHERIT, "file_inherit"),
        (Self::DIRECTORY_INHERIT, "directory_inherit"),
        (Self::LIMIT_INHERIT, "limit_inherit"),
        (Self::ONLY_INHERIT, "only_inherit"),
    ];

    /// Returns an empty flag set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Returns the raw flag bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns `true` when every flag in `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` when any flag in `other` is set.
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Returns `true` when no flags are set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates over the names of the flags that are set.
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        Self::NAMES
            .into_iter()
            .filter(move |(flag, _)| self.contains(*flag))
            .map(|(_, name)| name)
    }

    /// Looks up a single flag by its name.
    pub fn from_name(name: &str) -> Result<Self, ParseFlagError> {
        Self::NAMES
            .iter()
            .find(|(_, candidate)| *candidate == name)
            .map(|(flag, _)| *flag)
            .ok_or_else(|| ParseFlagError(name.to_owned()))
    }
}

impl BitOr for EntryFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for EntryFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for EntryFlags {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Sub for EntryFlags {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 & !rhs.0)
    }
}

/// Error returned for an unrecognised entry flag name.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown ACL entry flag '{0}'")]
pub struct ParseFlagError(String);

impl From<EntryFlags> for Vec<String> {
    fn from(flags: EntryFlags) -> Self {
        flags.names().map(str::to_owned).collect()
    }
}

impl TryFrom<Vec<String>> for EntryFlags {
    type Error = ParseFlagError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        names.iter().try_fold(Self::empty(), |flags, name| {
            Ok(flags | Self::from_name(name)?)
        })
    }
}
