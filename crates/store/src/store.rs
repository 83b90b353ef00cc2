use std::io;
use std::path::Path;
use std::sync::Arc;

use codec::NativeCodec;
use identity::{Directory, IdentityResolver, SchemeView, SystemDirectory};
use model::{
    Acl, EntryFlags, IdentityError, IdentityMap, Layout, NativeIdentity, Principal, Scope,
    Subject, ValidationError,
};
use rustc_hash::FxHashMap;

use crate::error::{CommitPhase, StoreError};
use crate::options::StoreOptions;
use crate::system::{AclSystem, FileStat, PlatformSystem};

const STORE_TARGET: &str = "facl::store";

/// Reads and writes the ACLs of filesystem objects.
///
/// The store composes an [`AclSystem`] (native calls), its codec, and a shared
/// [`IdentityResolver`]. It holds no per-path state and takes no locks of its
/// own; concurrent writers to the same path race as they would with any other
/// metadata call.
pub struct AclStore<S = PlatformSystem, D = SystemDirectory> {
    system: S,
    resolver: Arc<IdentityResolver<D>>,
    options: StoreOptions,
}

/// Progress of the two-phase commit.
#[derive(Debug)]
enum Commit {
    /// Phase 1 done and no phase 2 was needed.
    AccessApplied,
    /// Both phases done.
    DefaultApplied,
    /// Phase 1 done, phase 2 failed.
    DefaultFailed(io::Error),
}

impl AclStore<PlatformSystem, SystemDirectory> {
    /// Creates a store for the build target's native ACLs.
    #[must_use]
    pub fn platform(resolver: Arc<IdentityResolver>, options: StoreOptions) -> Self {
        Self::new(PlatformSystem::default(), resolver, options)
    }
}

impl<S: AclSystem, D: Directory> AclStore<S, D> {
    /// Creates a store over `system`.
    #[must_use]
    pub const fn new(system: S, resolver: Arc<IdentityResolver<D>>, options: StoreOptions) -> Self {
        Self {
            system,
            resolver,
            options,
        }
    }

    /// Returns the native system the store calls into.
    #[must_use]
    pub const fn native_system(&self) -> &S {
        &self.system
    }

    /// Returns the shared identity resolver.
    #[must_use]
    pub fn resolver(&self) -> &IdentityResolver<D> {
        &self.resolver
    }

    /// Returns the options in effect.
    #[must_use]
    pub const fn options(&self) -> StoreOptions {
        self.options
    }

    /// Reads the attributes of `path` as the store sees them.
    pub fn stat(&self, path: &Path) -> Result<FileStat, StoreError> {
        let follow = self.options.follows_symlinks();
        self.retry(path, || self.system.stat(path, follow))
            .map_err(|error| StoreError::from_io("stat", path, error))
    }

    /// Reads the ACL of `path`.
    ///
    /// On POSIX systems the result holds the access entries followed, for a
    /// directory, by its default entries; a file without an ACL yields the
    /// entries its mode implies. On macOS only the extended entries are
    /// returned.
    pub fn get_acl(&self, path: &Path) -> Result<Acl, StoreError> {
        let stat = self.stat(path)?;
        let acl = self.read_acl(path, &stat)?;
        tracing::debug!(
            target: STORE_TARGET,
            path = %path.display(),
            entries = acl.len(),
            "read ACL"
        );
        Ok(acl)
    }

    /// Reads the entries newly created children of the directory `path` will
    /// inherit: the default ACL on POSIX systems, the file- and
    /// directory-inheritable entries on macOS. Empty for files.
    pub fn get_default_acl(&self, path: &Path) -> Result<Acl, StoreError> {
        let acl = self.get_acl(path)?;
        Ok(match S::Codec::LAYOUT {
            Layout::Posix1e => acl.scoped(Scope::Default),
            Layout::Extended => acl
                .entries()
                .iter()
                .filter(|entry| {
                    entry
                        .flags
                        .intersects(EntryFlags::FILE_INHERIT | EntryFlags::DIRECTORY_INHERIT)
                })
                .copied()
                .collect(),
        })
    }

    /// Replaces the ACL of `path` with `acl`.
    ///
    /// Validation, identity resolution and encoding all happen before the
    /// first native write; any failure there leaves the file untouched. The
    /// access ACL is written first. For a directory on a system with separate
    /// default ACLs, the default ACL is then written, or removed when `acl`
    /// has no default entries.
    ///
    /// # Errors
    ///
    /// [`StoreError::PartialApply`] when the access ACL was written but the
    /// default ACL could not be. The directory is left in that state.
    pub fn set_acl(&self, path: &Path, acl: &Acl) -> Result<(), StoreError> {
        let stat = self.stat(path)?;
        acl.validate_for(stat.is_dir, S::Codec::LAYOUT)
            .map_err(|source| validation(path, source))?;

        let resolved = self.resolve_subjects(path, acl)?;
        let raw = S::Codec::encode(acl, stat.is_dir, &resolved)
            .map_err(|source| StoreError::codec(path, source))?;

        let has_default = acl.default_entries().next().is_some();
        finish(path, self.commit(path, &stat, &raw, has_default)?)
    }

    /// Strips `path` down to the ACL its permission bits imply.
    ///
    /// On POSIX systems the owner, owning group and other entries are kept
    /// and everything else, including a directory's default ACL, is dropped.
    /// On macOS every extended entry is removed. Already minimal ACLs are not
    /// rewritten, so repeated calls succeed without touching the file.
    pub fn remove_acl(&self, path: &Path) -> Result<(), StoreError> {
        let stat = self.stat(path)?;
        let current = self.read_acl(path, &stat)?;
        let minimal = minimal_acl(S::Codec::LAYOUT, &current, stat.mode);

        if current.permission_equivalent(&minimal) {
            tracing::debug!(target: STORE_TARGET, path = %path.display(), "ACL already minimal");
            return Ok(());
        }

        let raw = S::Codec::encode(
            &minimal,
            stat.is_dir,
            &self.resolver.for_scheme(S::Codec::SCHEME),
        )
        .map_err(|source| StoreError::codec(path, source))?;
        finish(path, self.commit(path, &stat, &raw, false)?)
    }

    fn read_acl(&self, path: &Path, stat: &FileStat) -> Result<Acl, StoreError> {
        let follow = self.options.follows_symlinks();
        let raw = self
            .retry(path, || self.system.read(path, stat, follow))
            .map_err(|error| StoreError::from_io("read ACL of", path, error))?;
        S::Codec::decode(&raw, stat.is_dir, &self.resolver.for_scheme(S::Codec::SCHEME))
            .map_err(|source| StoreError::codec(path, source))
    }

    /// Resolves every distinct subject of `acl` before anything is written.
    fn resolve_subjects(&self, path: &Path, acl: &Acl) -> Result<Resolved<'_, D>, StoreError> {
        let scheme = S::Codec::SCHEME;
        let mut natives = FxHashMap::default();

        for entry in acl.entries() {
            if natives.contains_key(&entry.subject) {
                continue;
            }
            let native = if self.options.revalidates_identities() {
                self.resolver.revalidate(entry.subject, scheme)
            } else {
                self.resolver.to_native(entry.subject, scheme)
            };
            let native = native.map_err(|source| {
                tracing::debug!(
                    target: STORE_TARGET,
                    path = %path.display(),
                    subject = %entry.subject,
                    error = %source,
                    "identity resolution failed; nothing written"
                );
                StoreError::identity(path, source)
            })?;
            natives.insert(entry.subject, native);
        }

        Ok(Resolved {
            natives,
            view: self.resolver.for_scheme(scheme),
        })
    }

    fn commit(
        &self,
        path: &Path,
        stat: &FileStat,
        raw: &<S::Codec as NativeCodec>::Raw,
        has_default: bool,
    ) -> Result<Commit, StoreError> {
        let follow = self.options.follows_symlinks();

        self.retry(path, || self.system.write_access(path, raw, follow))
            .map_err(|error| StoreError::from_io("write access ACL of", path, error))?;
        tracing::debug!(
            target: STORE_TARGET,
            path = %path.display(),
            phase = %CommitPhase::Access,
            "commit phase applied"
        );

        if !(stat.is_dir && S::SEPARATE_DEFAULT) {
            return Ok(Commit::AccessApplied);
        }

        let second = if has_default {
            self.retry(path, || self.system.write_default(path, raw, follow))
        } else {
            self.retry(path, || self.system.remove_default(path, follow))
        };
        Ok(match second {
            Ok(()) => {
                tracing::debug!(
                    target: STORE_TARGET,
                    path = %path.display(),
                    phase = %CommitPhase::Default,
                    "commit phase applied"
                );
                Commit::DefaultApplied
            }
            Err(error) => Commit::DefaultFailed(error),
        })
    }

    /// Runs `call`, repeating it once if it was interrupted.
    fn retry<T>(&self, path: &Path, mut call: impl FnMut() -> io::Result<T>) -> io::Result<T> {
        match call() {
            Err(error)
                if error.kind() == io::ErrorKind::Interrupted
                    && self.options.retries_interrupted() =>
            {
                tracing::debug!(
                    target: STORE_TARGET,
                    path = %path.display(),
                    "native call interrupted; retrying once"
                );
                call()
            }
            result => result,
        }
    }
}

fn validation(path: &Path, source: ValidationError) -> StoreError {
    StoreError::Validation {
        path: path.to_path_buf(),
        source,
    }
}

fn finish(path: &Path, commit: Commit) -> Result<(), StoreError> {
    match commit {
        Commit::AccessApplied | Commit::DefaultApplied => Ok(()),
        Commit::DefaultFailed(source) => {
            tracing::warn!(
                target: STORE_TARGET,
                path = %path.display(),
                error = %source,
                "access ACL applied but default ACL failed"
            );
            Err(StoreError::PartialApply {
                path: path.to_path_buf(),
                applied: CommitPhase::Access,
                source,
            })
        }
    }
}

/// The ACL a file's permission bits imply, using the base entries of
/// `current` where present.
fn minimal_acl(layout: Layout, current: &Acl, mode: u32) -> Acl {
    let triplet = |subject: Subject, shift: u32| {
        current
            .access_entries()
            .find(|entry| entry.subject == subject && !entry.is_deny())
            .map_or((mode >> shift) & 0o7, |entry| entry.permissions.mode_bits())
    };
    let mode = (triplet(Subject::Owner, 6) << 6)
        | (triplet(Subject::OwningGroup, 3) << 3)
        | triplet(Subject::Other, 0);
    Acl::minimal(layout, mode)
}

/// Identities resolved ahead of a commit.
struct Resolved<'a, D> {
    natives: FxHashMap<Subject, NativeIdentity>,
    view: SchemeView<'a, D>,
}

impl<D: Directory> IdentityMap for Resolved<'_, D> {
    fn to_subject(&self, native: NativeIdentity) -> Result<Subject, IdentityError> {
        self.view.to_subject(native)
    }

    fn to_native(&self, subject: Subject) -> Result<NativeIdentity, IdentityError> {
        self.natives
            .get(&subject)
            .copied()
            .ok_or(IdentityError::NotFound(Principal::Subject(subject)))
    }
}
