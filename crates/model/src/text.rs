//! crates/model/src/text.rs
//!
//! A small `getfacl`-style text form for ACLs.
//!
//! Each entry is `[default:|d:]<tag>:<qualifier>:<perms>[:<flag>[/<flag>...]]`.
//! Native bits a codec captured travel in the flag field as
//! `vendor_perms=0x..` and `vendor_flags=0x..`.
//! Entries are separated by newlines or commas and `#` starts a comment. Only
//! numeric qualifiers are accepted; names are a presentation concern.

use std::str::FromStr;

use thiserror::Error;

use crate::acl::Acl;
use crate::entry::{AclEntry, VendorBits};
use crate::identity::Subject;
use crate::perms::{EntryFlags, Permissions};

/// Error produced while parsing ACL text.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TextError {
    /// The entry does not have the `tag:qualifier:perms` shape.
    #[error("line {line}: malformed entry '{entry}'")]
    Malformed {
        /// 1-based line number.
        line: usize,
        /// Offending entry text.
        entry: String,
    },
    /// The tag is not one of `user`, `group`, `mask`, `other`.
    #[error("line {line}: unknown tag '{tag}'")]
    UnknownTag {
        /// 1-based line number.
        line: usize,
        /// Offending tag.
        tag: String,
    },
    /// The qualifier is not a numeric id, or is present on a tag that takes none.
    #[error("line {line}: invalid qualifier '{qualifier}'")]
    InvalidQualifier {
        /// 1-based line number.
        line: usize,
        /// Offending qualifier.
        qualifier: String,
    },
    /// The permission field is not a fixed-position `rwx` triplet.
    #[error("line {line}: invalid permissions '{perms}'")]
    InvalidPermissions {
        /// 1-based line number.
        line: usize,
        /// Offending permission text.
        perms: String,
    },
    /// A flag name is not recognised.
    #[error("line {line}: unknown flag '{flag}'")]
    UnknownFlag {
        /// 1-based line number.
        line: usize,
        /// Offending flag.
        flag: String,
    },
    /// A `vendor_perms=`/`vendor_flags=` value is not a hexadecimal number.
    #[error("line {line}: invalid vendor bits '{value}'")]
    InvalidVendorBits {
        /// 1-based line number.
        line: usize,
        /// Offending token.
        value: String,
    },
}

impl Acl {
    /// Renders the ACL one entry per line.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for entry in self.entries() {
            render_entry(entry, &mut out);
            out.push('\n');
        }
        out
    }

    /// Parses ACL text. Entries keep the order they appear in.
    ///
    /// # Errors
    ///
    /// Returns a [`TextError`] naming the line of the first bad entry. The
    /// result is not validated.
    pub fn from_text(text: &str) -> Result<Self, TextError> {
        let mut acl = Self::new();
        for (index, line) in text.lines().enumerate() {
            let content = line.split_once('#').map_or(line, |(before, _)| before);
            for entry in content.split(',').map(str::trim).filter(|e| !e.is_empty()) {
                acl.push(parse_entry(entry, index + 1)?);
            }
        }
        Ok(acl)
    }
}

impl FromStr for Acl {
    type Err = TextError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::from_text(text)
    }
}

fn render_entry(entry: &AclEntry, out: &mut String) {
    use std::fmt::Write as _;

    if entry.is_default() {
        out.push_str("default:");
    }
    let (tag, qualifier) = match entry.subject {
        Subject::Owner => ("user", None),
        Subject::User(uid) => ("user", Some(uid)),
        Subject::OwningGroup => ("group", None),
        Subject::Group(gid) => ("group", Some(gid)),
        Subject::Mask => ("mask", None),
        Subject::Other => ("other", None),
    };
    out.push_str(tag);
    out.push(':');
    if let Some(id) = qualifier {
        let _ = write!(out, "{id}");
    }
    let _ = write!(out, ":{}", entry.permissions);

    let mut extra: Vec<String> = (entry.flags - EntryFlags::DEFAULT)
        .names()
        .map(str::to_owned)
        .collect();
    if let Some(vendor) = entry.retained_vendor_bits() {
        if vendor.perms != 0 {
            extra.push(format!("{VENDOR_PERMS}{:#x}", vendor.perms));
        }
        if vendor.flags != 0 {
            extra.push(format!("{VENDOR_FLAGS}{:#x}", vendor.flags));
        }
    }
    if !extra.is_empty() {
        out.push(':');
        out.push_str(&extra.join("/"));
    }
}

const VENDOR_PERMS: &str = "vendor_perms=";
const VENDOR_FLAGS: &str = "vendor_flags=";

fn parse_hex(text: &str) -> Option<u64> {
    let digits = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X"))?;
    u64::from_str_radix(digits, 16).ok()
}

fn parse_entry(entry: &str, line: usize) -> Result<AclEntry, TextError> {
    let malformed = || TextError::Malformed {
        line,
        entry: entry.to_owned(),
    };

    let mut fields: Vec<&str> = entry.split(':').map(str::trim).collect();
    let mut flags = EntryFlags::empty();
    if matches!(fields.first(), Some(&("default" | "d"))) {
        flags |= EntryFlags::DEFAULT;
        fields.remove(0);
    }

    let (tag, qualifier, perms, extra) = match fields.as_slice() {
        [tag, qualifier, perms] => (*tag, *qualifier, *perms, None),
        [tag, qualifier, perms, extra] => (*tag, *qualifier, *perms, Some(*extra)),
        _ => return Err(malformed()),
    };

    let id = if qualifier.is_empty() {
        None
    } else {
        Some(
            qualifier
                .parse::<u32>()
                .map_err(|_| TextError::InvalidQualifier {
                    line,
                    qualifier: qualifier.to_owned(),
                })?,
        )
    };

    let subject = match (tag, id) {
        ("user" | "u", None) => Subject::Owner,
        ("user" | "u", Some(uid)) => Subject::User(uid),
        ("group" | "g", None) => Subject::OwningGroup,
        ("group" | "g", Some(gid)) => Subject::Group(gid),
        ("mask" | "m", None) => Subject::Mask,
        ("other" | "o", None) => Subject::Other,
        ("mask" | "m" | "other" | "o", Some(_)) => {
            return Err(TextError::InvalidQualifier {
                line,
                qualifier: qualifier.to_owned(),
            });
        }
        _ => {
            return Err(TextError::UnknownTag {
                line,
                tag: tag.to_owned(),
            });
        }
    };

    let permissions = perms.parse::<Permissions>().map_err(|_| TextError::InvalidPermissions {
        line,
        perms: perms.to_owned(),
    })?;

    let mut vendor = VendorBits::default();
    for name in extra.into_iter().flat_map(|text| text.split('/')).map(str::trim) {
        let invalid_vendor = || TextError::InvalidVendorBits {
            line,
            value: name.to_owned(),
        };
        if let Some(value) = name.strip_prefix(VENDOR_PERMS) {
            vendor.perms = parse_hex(value).ok_or_else(invalid_vendor)?;
            continue;
        }
        if let Some(value) = name.strip_prefix(VENDOR_FLAGS) {
            vendor.flags = parse_hex(value)
                .and_then(|bits| u32::try_from(bits).ok())
                .ok_or_else(invalid_vendor)?;
            continue;
        }
        match EntryFlags::from_name(name) {
            Ok(flag) if flag != EntryFlags::DEFAULT => flags |= flag,
            _ => {
                return Err(TextError::UnknownFlag {
                    line,
                    flag: name.to_owned(),
                });
            }
        }
    }

    Ok(AclEntry::new(subject, permissions)
        .with_flags(flags)
        .with_vendor_bits(vendor))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_posix_entries() {
        let mut acl = Acl::from_mode(0o640);
        acl.push(AclEntry::new(Subject::User(1000), Permissions::READ | Permissions::EXECUTE));
        acl.push(AclEntry::new(Subject::Mask, Permissions::ALL));
        acl.push(AclEntry::default_scope(Subject::Group(5), Permissions::READ));

        assert_eq!(
            acl.to_text(),
            "user::rw-\ngroup::r--\nother::---\nuser:1000:r-x\nmask::rwx\ndefault:group:5:r--\n"
        );
    }

    #[test]
    fn renders_flags_after_permissions() {
        let acl: Acl = [AclEntry::new(Subject::Group(12), Permissions::READ)
            .with_flags(EntryFlags::DENY | EntryFlags::FILE_INHERIT)]
        .into_iter()
        .collect();
        assert_eq!(acl.to_text(), "group:12:r--:deny/file_inherit\n");
    }

    #[test]
    fn parses_what_it_renders() {
        let mut acl = Acl::from_mode(0o755);
        acl.push(AclEntry::new(Subject::User(7), Permissions::WRITE));
        acl.push(AclEntry::new(Subject::Mask, Permissions::ALL));
        acl.push(
            AclEntry::default_scope(Subject::Other, Permissions::NONE)
                .with_flags(EntryFlags::DEFAULT | EntryFlags::ONLY_INHERIT),
        );
        assert_eq!(Acl::from_text(&acl.to_text()), Ok(acl));
    }

    #[test]
    fn vendor_bits_survive_a_text_round_trip() {
        let entry = AclEntry::new(Subject::User(501), Permissions::READ)
            .with_flags(EntryFlags::DENY)
            .with_vendor_bits(VendorBits {
                perms: 1 << 4,
                flags: 0x200,
            });
        let acl: Acl = [entry].into_iter().collect();
        let text = acl.to_text();
        assert_eq!(text, "user:501:r--:deny/vendor_perms=0x10/vendor_flags=0x200\n");

        let back = Acl::from_text(&text).expect("valid text");
        assert_eq!(back, acl);
        assert_eq!(back.entries()[0].retained_vendor_bits(), entry.retained_vendor_bits());
    }

    #[test]
    fn stale_vendor_bits_are_not_rendered() {
        let mut entry = AclEntry::new(Subject::User(501), Permissions::READ)
            .with_vendor_bits(VendorBits { perms: 1 << 4, flags: 0 });
        entry.permissions = Permissions::ALL;
        let acl: Acl = [entry].into_iter().collect();
        assert_eq!(acl.to_text(), "user:501:rwx\n");
    }

    #[test]
    fn rejects_malformed_vendor_bits() {
        assert!(matches!(
            Acl::from_text("user:501:r--:vendor_perms=16"),
            Err(TextError::InvalidVendorBits { line: 1, .. })
        ));
        assert!(matches!(
            Acl::from_text("user:501:r--:vendor_flags=0x1ffffffff"),
            Err(TextError::InvalidVendorBits { .. })
        ));
    }

    #[test]
    fn accepts_short_tags_commas_and_comments() {
        let acl: Acl = "# file: demo\nu::rwx, g::r-x # group\no::---\nd:u:42:r--"
            .parse()
            .expect("valid text");
        assert_eq!(acl.len(), 4);
        assert_eq!(acl.entries()[3], AclEntry::default_scope(Subject::User(42), Permissions::READ));
    }

    #[test]
    fn reports_the_offending_line() {
        assert_eq!(
            Acl::from_text("user::rwx\nwheel::r--"),
            Err(TextError::UnknownTag {
                line: 2,
                tag: "wheel".to_owned(),
            })
        );
        assert!(matches!(
            Acl::from_text("user:alice:rwx"),
            Err(TextError::InvalidQualifier { line: 1, .. })
        ));
        assert!(matches!(
            Acl::from_text("other:5:rwx"),
            Err(TextError::InvalidQualifier { .. })
        ));
        assert!(matches!(Acl::from_text("user::xrw"), Err(TextError::InvalidPermissions { .. })));
        assert!(matches!(Acl::from_text("user::rwx:sticky"), Err(TextError::UnknownFlag { .. })));
        assert!(matches!(Acl::from_text("user::rwx:default"), Err(TextError::UnknownFlag { .. })));
        assert!(matches!(Acl::from_text("user:rwx"), Err(TextError::Malformed { .. })));
    }
}
