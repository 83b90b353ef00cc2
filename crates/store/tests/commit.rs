use std::io;
use std::path::Path;
use std::sync::Arc;

use codec::PosixAcl;
use identity::{IdentityResolver, ResolverConfig, StaticDirectory};
use model::{
    Acl, AclEntry, EntryFlags, IdentityError, Permissions, Principal, Subject, ValidationError,
};
use platform::ExtendedAce;
use platform::extended::{PERM_READ_DATA, TAG_ALLOW};
use store::{
    AclStore, CommitPhase, FileStat, Op, RecordingExtended, RecordingPosix, StoreError,
    StoreOptions,
};
use uuid::Uuid;

const FILE: &str = "/data/report.txt";
const DIR: &str = "/data/shared";

fn directory() -> StaticDirectory {
    StaticDirectory::new()
        .with_user(1000, "alice")
        .with_group(50, "staff")
        .with_user_guid(1000, Uuid::from_u128(0xFFFF_EEEE_DDDD_CCCC_BBBB_AAAA_0000_03E8))
        .with_group_guid(50, Uuid::from_u128(0xABCD_EFAB_CDEF_ABCD_EFAB_CDEF_0000_0032))
}

fn resolver(strict: bool) -> Arc<IdentityResolver<StaticDirectory>> {
    Arc::new(IdentityResolver::new(
        directory(),
        ResolverConfig::new().strict_ids(strict),
    ))
}

fn posix_store(strict: bool) -> AclStore<RecordingPosix, StaticDirectory> {
    let system = RecordingPosix::new()
        .with_file(FILE, 0o644, false)
        .with_file(DIR, 0o755, true);
    AclStore::new(system, resolver(strict), StoreOptions::new())
}

fn with_named_user(mode: u32, uid: u32) -> Acl {
    let mut acl = Acl::from_mode(mode);
    acl.push(AclEntry::new(Subject::User(uid), Permissions::READ | Permissions::EXECUTE));
    acl.push(AclEntry::new(Subject::Mask, Permissions::ALL));
    acl.sort_canonical();
    acl
}

fn with_default(mut acl: Acl) -> Acl {
    for entry in Acl::from_mode(0o750).into_entries() {
        acl.push(entry.with_flags(EntryFlags::DEFAULT));
    }
    acl
}

#[test]
fn plain_file_reads_as_its_mode() {
    let store = posix_store(false);
    let acl = store.get_acl(Path::new(FILE)).expect("read");
    assert_eq!(acl, Acl::from_mode(0o644));
    assert!(!acl.has_extended_entries());
}

#[test]
fn set_then_get_returns_the_same_entries() {
    let store = posix_store(false);
    let path = Path::new(FILE);
    let acl = with_named_user(0o644, 1000);

    store.set_acl(path, &acl).expect("set");
    assert_eq!(store.native_system().ops(), [Op::Stat, Op::WriteAccess]);

    let read = store.get_acl(path).expect("read");
    assert!(read.permission_equivalent(&acl));
    assert_eq!(store.stat(path).expect("stat").mode, 0o674);
}

#[test]
fn failed_resolution_makes_no_mutating_call() {
    let store = posix_store(true);
    let path = Path::new(FILE);

    let error = store.set_acl(path, &with_named_user(0o644, 4242)).expect_err("unknown uid");
    match error {
        StoreError::Identity {
            principal, source, ..
        } => {
            assert_eq!(principal, Some(Principal::Subject(Subject::User(4242))));
            assert!(matches!(source, IdentityError::NotFound(_)));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(store.native_system().mutations(), 0);
}

#[test]
fn invalid_acls_are_rejected_before_writing() {
    let store = posix_store(false);
    let mut acl = Acl::from_mode(0o644);
    acl.push(AclEntry::new(Subject::User(1000), Permissions::READ));

    let error = store.set_acl(Path::new(FILE), &acl).expect_err("no mask");
    assert!(matches!(
        error,
        StoreError::Validation {
            source: ValidationError::MissingMask { .. },
            ..
        }
    ));

    let error = store
        .set_acl(Path::new(FILE), &with_default(Acl::from_mode(0o644)))
        .expect_err("default on a file");
    assert!(matches!(
        error,
        StoreError::Validation {
            source: ValidationError::ScopeMismatch { .. },
            ..
        }
    ));
    assert_eq!(store.native_system().mutations(), 0);
}

#[test]
fn directories_commit_access_then_default() {
    let store = posix_store(false);
    let path = Path::new(DIR);
    let acl = with_default(with_named_user(0o755, 1000));

    store.set_acl(path, &acl).expect("set");
    assert_eq!(
        store.native_system().ops(),
        [Op::Stat, Op::WriteAccess, Op::WriteDefault]
    );
    assert_eq!(store.get_acl(path).expect("read"), acl);
    assert_eq!(
        store.get_default_acl(path).expect("read"),
        acl.scoped(model::Scope::Default)
    );
}

#[test]
fn directories_without_default_entries_drop_the_default_acl() {
    let store = posix_store(false);
    let path = Path::new(DIR);
    store
        .set_acl(path, &with_default(Acl::from_mode(0o755)))
        .expect("set");
    store.native_system().clear_calls();

    store.set_acl(path, &Acl::from_mode(0o700)).expect("set");
    assert_eq!(
        store.native_system().ops(),
        [Op::Stat, Op::WriteAccess, Op::RemoveDefault]
    );
    assert!(store.get_default_acl(path).expect("read").is_empty());
}

#[test]
fn failed_default_phase_is_a_partial_apply() {
    let store = posix_store(false);
    let path = Path::new(DIR);
    store
        .native_system()
        .fail_next(Op::WriteDefault, io::ErrorKind::OutOfMemory);

    let acl = with_default(with_named_user(0o755, 1000));
    let error = store.set_acl(path, &acl).expect_err("phase two fails");
    match &error {
        StoreError::PartialApply { applied, source, .. } => {
            assert_eq!(*applied, CommitPhase::Access);
            assert_eq!(source.kind(), io::ErrorKind::OutOfMemory);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(!error.is_retryable());

    let read = store.get_acl(path).expect("read");
    assert!(read.permission_equivalent(&acl.scoped(model::Scope::Access)));
}

#[test]
fn interrupted_calls_are_retried_once() {
    let store = posix_store(false);
    let path = Path::new(FILE);
    store
        .native_system()
        .fail_next(Op::WriteAccess, io::ErrorKind::Interrupted);

    store.set_acl(path, &with_named_user(0o644, 1000)).expect("retried");
    assert_eq!(
        store.native_system().ops(),
        [Op::Stat, Op::WriteAccess, Op::WriteAccess]
    );
}

#[test]
fn repeated_interruptions_are_reported() {
    let store = posix_store(false);
    let path = Path::new(FILE);
    store.native_system().fail_next(Op::Read, io::ErrorKind::Interrupted);
    store.native_system().fail_next(Op::Read, io::ErrorKind::Interrupted);

    let error = store.get_acl(path).expect_err("interrupted twice");
    assert!(matches!(error, StoreError::Interrupted { .. }));
    assert!(error.is_retryable());
}

#[test]
fn retry_can_be_disabled() {
    let system = RecordingPosix::new().with_file(FILE, 0o644, false);
    let store = AclStore::new(
        system,
        resolver(false),
        StoreOptions::new().retry_interrupted(false),
    );
    store.native_system().fail_next(Op::Stat, io::ErrorKind::Interrupted);
    assert!(matches!(
        store.get_acl(Path::new(FILE)),
        Err(StoreError::Interrupted { .. })
    ));
    assert_eq!(store.native_system().ops(), [Op::Stat]);
}

#[test]
fn missing_paths_are_not_found() {
    let store = posix_store(false);
    let error = store.get_acl(Path::new("/nope")).expect_err("missing");
    assert!(matches!(error, StoreError::NotFound { .. }));
    assert_eq!(error.path(), Path::new("/nope"));
}

#[test]
fn remove_acl_is_idempotent() {
    let store = posix_store(false);
    let path = Path::new(DIR);
    store
        .set_acl(path, &with_default(with_named_user(0o750, 1000)))
        .expect("set");
    store.native_system().clear_calls();

    store.remove_acl(path).expect("first remove");
    assert_eq!(
        store.native_system().ops(),
        [Op::Stat, Op::Read, Op::WriteAccess, Op::RemoveDefault]
    );
    let after = store.get_acl(path).expect("read");
    assert!(after.permission_equivalent(&Acl::from_mode(0o750)));

    store.native_system().clear_calls();
    store.remove_acl(path).expect("second remove");
    assert_eq!(store.native_system().mutations(), 0);
    assert!(store.get_acl(path).expect("read").permission_equivalent(&after));
}

#[test]
fn remove_acl_keeps_the_owning_group_not_the_mask() {
    let stat = FileStat {
        mode: 0o674,
        uid: 0,
        gid: 0,
        is_dir: false,
    };
    let store = posix_store(false);
    let acl = with_named_user(0o644, 1000);
    store.set_acl(Path::new(FILE), &acl).expect("set");
    assert_eq!(store.stat(Path::new(FILE)).expect("stat"), stat);

    store.remove_acl(Path::new(FILE)).expect("remove");
    assert_eq!(store.stat(Path::new(FILE)).expect("stat").mode, 0o644);
}

#[test]
fn file_commits_leave_no_default_blob() {
    let store = posix_store(false);
    store
        .set_acl(Path::new(FILE), &with_named_user(0o600, 1000))
        .expect("set");
    let stored: PosixAcl = store.native_system().native(Path::new(FILE)).expect("file");
    assert!(stored.access.is_some());
    assert_eq!(stored.default, None);
}

fn extended_store() -> AclStore<RecordingExtended, StaticDirectory> {
    let system = RecordingExtended::new()
        .with_file(FILE, 0o644, false)
        .with_file(DIR, 0o755, true);
    AclStore::new(system, resolver(false), StoreOptions::new())
}

#[test]
fn extended_set_has_a_single_phase() {
    let store = extended_store();
    let path = Path::new(DIR);
    let acl = Acl::from_entries(vec![
        AclEntry::new(Subject::User(1000), Permissions::READ).with_flags(EntryFlags::DENY),
        AclEntry::new(Subject::Group(50), Permissions::READ | Permissions::EXECUTE)
            .with_flags(EntryFlags::FILE_INHERIT | EntryFlags::DIRECTORY_INHERIT),
    ]);

    store.set_acl(path, &acl).expect("set");
    assert_eq!(store.native_system().ops(), [Op::Stat, Op::WriteAccess]);
    assert_eq!(store.get_acl(path).expect("read"), acl);
    assert_eq!(
        store.get_default_acl(path).expect("read").entries(),
        &acl.entries()[1..]
    );
}

#[test]
fn extended_remove_clears_every_entry() {
    let stat = FileStat {
        mode: 0o644,
        uid: 0,
        gid: 0,
        is_dir: false,
    };
    let ace = ExtendedAce {
        tag: TAG_ALLOW,
        qualifier: Uuid::from_u128(0xFFFF_EEEE_DDDD_CCCC_BBBB_AAAA_0000_03E8),
        perms: PERM_READ_DATA,
        flags: 0,
    };
    let system = RecordingExtended::new().with_native(FILE, stat, vec![ace]);
    let store = AclStore::new(system, resolver(false), StoreOptions::new());
    let path = Path::new(FILE);

    assert_eq!(store.get_acl(path).expect("read").len(), 1);
    store.remove_acl(path).expect("remove");
    assert_eq!(store.native_system().native(path), Some(Vec::new()));
    store.native_system().clear_calls();
    store.remove_acl(path).expect("remove again");
    assert_eq!(store.native_system().mutations(), 0);
}

#[test]
fn extended_mask_entries_fail_before_writing() {
    let store = extended_store();
    let acl = Acl::from_entries(vec![AclEntry::new(Subject::Mask, Permissions::ALL)]);
    let error = store.set_acl(Path::new(FILE), &acl).expect_err("no mask on macOS");
    assert!(matches!(
        error,
        StoreError::Identity {
            source: IdentityError::Unsupported(_),
            ..
        }
    ));
    assert_eq!(store.native_system().mutations(), 0);
}

#[test]
fn extended_inheritance_on_files_is_rejected() {
    let store = extended_store();
    let acl = Acl::from_entries(vec![
        AclEntry::new(Subject::User(1000), Permissions::READ).with_flags(EntryFlags::FILE_INHERIT),
    ]);
    assert!(matches!(
        store.set_acl(Path::new(FILE), &acl),
        Err(StoreError::Validation {
            source: ValidationError::ScopeMismatch { .. },
            ..
        })
    ));
    assert_eq!(store.native_system().mutations(), 0);
}
