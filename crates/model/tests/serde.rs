#![cfg(feature = "serde")]

use model::{Acl, AclEntry, EntryFlags, Permissions, Subject, VendorBits};

#[test]
fn acl_serializes_as_an_entry_array() {
    let mut acl = Acl::from_mode(0o640);
    acl.push(
        AclEntry::new(Subject::Group(20), Permissions::READ)
            .with_flags(EntryFlags::DENY | EntryFlags::FILE_INHERIT),
    );

    let json = serde_json::to_value(&acl).expect("serialize");
    assert_eq!(
        json[3],
        serde_json::json!({
            "subject": { "kind": "group", "id": 20 },
            "permissions": "r--",
            "flags": ["deny", "file_inherit"],
        })
    );
    assert_eq!(json[0]["subject"], serde_json::json!({ "kind": "owner" }));

    let back: Acl = serde_json::from_value(json).expect("deserialize");
    assert_eq!(back, acl);
}

#[test]
fn flags_default_to_empty() {
    let entry: AclEntry = serde_json::from_str(
        r#"{ "subject": { "kind": "other" }, "permissions": "r-x" }"#,
    )
    .expect("deserialize");
    assert_eq!(entry, AclEntry::new(Subject::Other, Permissions::READ | Permissions::EXECUTE));
}

#[test]
fn bad_permission_text_is_rejected() {
    let result: Result<AclEntry, _> =
        serde_json::from_str(r#"{ "subject": { "kind": "mask" }, "permissions": "rwz" }"#);
    assert!(result.is_err());
}

#[test]
fn vendor_bits_round_trip_through_json() {
    let entry = AclEntry::new(Subject::User(501), Permissions::READ)
        .with_flags(EntryFlags::FILE_INHERIT)
        .with_vendor_bits(VendorBits {
            perms: 1 << 4,
            flags: 0x200,
        });

    let json = serde_json::to_value(entry).expect("serialize");
    assert_eq!(json["vendor"], serde_json::json!({ "perms": 16, "flags": 512 }));

    let back: AclEntry = serde_json::from_value(json).expect("deserialize");
    assert_eq!(back, entry);
    assert_eq!(back.retained_vendor_bits(), entry.retained_vendor_bits());
}

#[test]
fn stale_vendor_bits_are_not_serialized() {
    let mut entry = AclEntry::new(Subject::User(501), Permissions::READ)
        .with_vendor_bits(VendorBits { perms: 1 << 4, flags: 0 });
    entry.permissions = Permissions::ALL;

    let json = serde_json::to_value(entry).expect("serialize");
    assert!(json.get("vendor").is_none(), "{json}");
}

#[test]
fn permission_letters_must_be_in_position() {
    let result: Result<AclEntry, _> =
        serde_json::from_str(r#"{ "subject": { "kind": "other" }, "permissions": "xwr" }"#);
    assert!(result.is_err());
}
