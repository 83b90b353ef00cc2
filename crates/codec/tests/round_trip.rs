mod support;

use codec::{ExtendedCodec, NativeCodec, PosixCodec, canonical_order};
use model::{Acl, AclEntry, EntryFlags, Permissions, Subject};
use platform::ExtendedAce;
use platform::extended::{
    FLAG_DIRECTORY_INHERIT, FLAG_FILE_INHERIT, FLAG_INHERITED, PERM_ALL, TAG_ALLOW, TAG_DENY,
};
use proptest::prelude::*;

use support::{NumericIds, SynthesizedGuids};

fn perms() -> impl Strategy<Value = Permissions> {
    (0u32..8).prop_map(Permissions::from_mode_bits)
}

fn posix_scope(default: bool) -> impl Strategy<Value = Vec<AclEntry>> {
    let flags = if default {
        EntryFlags::DEFAULT
    } else {
        EntryFlags::empty()
    };
    (
        perms(),
        perms(),
        perms(),
        perms(),
        prop::collection::btree_map(100u32..5000, perms(), 0..4),
        prop::collection::btree_map(100u32..5000, perms(), 0..4),
    )
        .prop_map(move |(owner, group, other, mask, users, groups)| {
            let mut entries = vec![AclEntry::new(Subject::Owner, owner)];
            entries.extend(users.into_iter().map(|(uid, p)| AclEntry::new(Subject::User(uid), p)));
            entries.push(AclEntry::new(Subject::OwningGroup, group));
            entries.extend(groups.iter().map(|(&gid, &p)| AclEntry::new(Subject::Group(gid), p)));
            if entries.len() > 2 {
                entries.push(AclEntry::new(Subject::Mask, mask));
            }
            entries.push(AclEntry::new(Subject::Other, other));
            entries.into_iter().map(|entry| entry.with_flags(flags)).collect()
        })
}

fn posix_acl() -> impl Strategy<Value = (Acl, bool)> {
    (posix_scope(false), any::<bool>(), posix_scope(true)).prop_map(
        |(access, is_dir, default)| {
            let mut entries = access;
            if is_dir {
                entries.extend(default);
            }
            (Acl::from_entries(entries), is_dir)
        },
    )
}

fn extended_entry(is_dir: bool) -> impl Strategy<Value = AclEntry> {
    let subject = prop_oneof![
        Just(Subject::Owner),
        Just(Subject::OwningGroup),
        Just(Subject::Other),
        (100u32..5000).prop_map(Subject::User),
        (100u32..5000).prop_map(Subject::Group),
    ];
    let inheritance = if is_dir {
        prop_oneof![
            Just(EntryFlags::empty()),
            Just(EntryFlags::INHERITED),
            Just(EntryFlags::FILE_INHERIT | EntryFlags::DIRECTORY_INHERIT),
            Just(EntryFlags::DIRECTORY_INHERIT | EntryFlags::ONLY_INHERIT),
        ]
        .boxed()
    } else {
        prop_oneof![Just(EntryFlags::empty()), Just(EntryFlags::INHERITED)].boxed()
    };
    (subject, perms(), inheritance, any::<bool>()).prop_map(|(subject, p, flags, deny)| {
        let flags = if deny { flags | EntryFlags::DENY } else { flags };
        AclEntry::new(subject, p).with_flags(flags)
    })
}

fn extended_acl() -> impl Strategy<Value = (Acl, bool)> {
    any::<bool>().prop_flat_map(|is_dir| {
        (
            prop::collection::vec(extended_entry(is_dir), 0..8).prop_map(Acl::from_entries),
            Just(is_dir),
        )
    })
}

fn native_aces() -> impl Strategy<Value = Vec<ExtendedAce>> {
    let ace = (
        prop_oneof![Just(TAG_ALLOW), Just(TAG_DENY)],
        100u32..5000,
        prop::sample::subsequence(PERM_ALL.to_vec(), 0..=PERM_ALL.len()),
        prop_oneof![Just(0), Just(FLAG_INHERITED), Just(FLAG_FILE_INHERIT | FLAG_DIRECTORY_INHERIT)],
    )
        .prop_map(|(tag, uid, bits, flags)| ExtendedAce {
            tag,
            qualifier: uuid::Uuid::from_u128(
                0xFFFF_EEEE_DDDD_CCCC_BBBB_AAAA_0000_0000 | u128::from(uid),
            ),
            perms: bits.into_iter().fold(0, |acc, bit| acc | bit),
            flags,
        });
    prop::collection::vec(ace, 0..6)
}

proptest! {
    #[test]
    fn posix_acls_round_trip((acl, is_dir) in posix_acl()) {
        let raw = PosixCodec::encode(&acl, is_dir, &NumericIds).expect("encode");
        prop_assert_eq!(raw.default.is_some(), acl.default_entries().next().is_some());
        let decoded = PosixCodec::decode(&raw, is_dir, &NumericIds).expect("decode");
        prop_assert_eq!(decoded, acl);
    }

    #[test]
    fn posix_blobs_reencode_byte_for_byte((acl, is_dir) in posix_acl()) {
        let raw = PosixCodec::encode(&acl, is_dir, &NumericIds).expect("encode");
        let decoded = PosixCodec::decode(&raw, is_dir, &NumericIds).expect("decode");
        prop_assert_eq!(PosixCodec::encode(&decoded, is_dir, &NumericIds).expect("encode"), raw);
    }

    #[test]
    fn canonical_order_is_idempotent((acl, is_dir) in posix_acl()) {
        let raw = PosixCodec::encode(&acl, is_dir, &NumericIds).expect("encode");
        let access = raw.access.expect("access blob");
        let once = canonical_order(&access).expect("parse");
        prop_assert_eq!(canonical_order(&once).expect("parse"), once.clone());
        prop_assert_eq!(once.len(), access.len());
    }

    #[test]
    fn extended_acls_round_trip((acl, is_dir) in extended_acl()) {
        let raw = ExtendedCodec::encode(&acl, is_dir, &SynthesizedGuids).expect("encode");
        prop_assert_eq!(raw.len(), acl.len());
        let decoded = ExtendedCodec::decode(&raw, is_dir, &SynthesizedGuids).expect("decode");
        prop_assert_eq!(decoded, acl);
    }

    #[test]
    fn native_extended_entries_reencode_unchanged(raw in native_aces()) {
        let acl = ExtendedCodec::decode(&raw, true, &SynthesizedGuids).expect("decode");
        let reencoded = ExtendedCodec::encode(&acl, true, &SynthesizedGuids).expect("encode");
        prop_assert_eq!(reencoded, raw);
    }
}
