use std::fmt;
use std::io;

use model::{
    IdentityError, IdentityMap, IdentityScheme, NativeIdentity, PosixTag, Principal, Subject,
};
use platform::IdKind;
use uuid::Uuid;

use crate::cache::{BoundedCache, CacheStats};
use crate::config::ResolverConfig;
use crate::directory::{Directory, SystemDirectory};
use crate::wellknown::{self, WellKnown};

const IDENTITY_TARGET: &str = "facl::identity";

/// Translates native principals to canonical subjects and back.
///
/// Lookups that reach the directory service are cached, including misses.
/// Symbolic POSIX tags, numeric ids and well-known GUIDs are translated
/// without touching the directory. The resolver is `Send + Sync`; share it
/// behind a reference or an `Arc`.
pub struct IdentityResolver<D = SystemDirectory> {
    directory: D,
    config: ResolverConfig,
    subjects: BoundedCache<Uuid, Result<Subject, IdentityError>>,
    natives: BoundedCache<(Subject, IdentityScheme), Result<NativeIdentity, IdentityError>>,
    names: BoundedCache<Subject, Option<String>>,
}

impl IdentityResolver<SystemDirectory> {
    /// Creates a resolver backed by the local operating system.
    #[must_use]
    pub fn system(config: ResolverConfig) -> Self {
        Self::new(SystemDirectory, config)
    }
}

impl<D: Directory> IdentityResolver<D> {
    /// Creates a resolver over `directory`.
    #[must_use]
    pub fn new(directory: D, config: ResolverConfig) -> Self {
        let capacity = config.capacity();
        let ttl = config.ttl();
        Self {
            directory,
            config,
            subjects: BoundedCache::new(capacity, ttl),
            natives: BoundedCache::new(capacity, ttl),
            names: BoundedCache::new(capacity, ttl),
        }
    }

    /// Returns the directory the resolver consults.
    pub const fn directory(&self) -> &D {
        &self.directory
    }

    /// Returns the resolver configuration.
    pub const fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Translates a native identity into a canonical subject.
    ///
    /// # Errors
    ///
    /// - [`IdentityError::Unsupported`] for the well-known `nobody` GUID.
    /// - [`IdentityError::AmbiguousDomain`] when a GUID is neither a user nor
    ///   a group.
    /// - [`IdentityError::NotFound`] when the directory has no such GUID.
    pub fn to_subject(&self, native: NativeIdentity) -> Result<Subject, IdentityError> {
        match native {
            NativeIdentity::Tag(tag) => Ok(match tag {
                PosixTag::UserObj => Subject::Owner,
                PosixTag::GroupObj => Subject::OwningGroup,
                PosixTag::Mask => Subject::Mask,
                PosixTag::Other => Subject::Other,
            }),
            NativeIdentity::Uid(uid) => Ok(Subject::User(uid)),
            NativeIdentity::Gid(gid) => Ok(Subject::Group(gid)),
            NativeIdentity::Guid(guid) => {
                if let Some(known) = wellknown::classify(guid) {
                    return match known {
                        WellKnown::Subject(subject) => Ok(subject),
                        WellKnown::Nobody => Err(IdentityError::Unsupported(native.into())),
                    };
                }
                if let Some(cached) = self.subjects.get(&guid) {
                    tracing::trace!(target: IDENTITY_TARGET, %guid, "guid cache hit");
                    return cached;
                }
                let resolved = self.lookup_guid(guid)?;
                self.subjects.insert(guid, resolved.clone());
                resolved
            }
        }
    }

    /// Translates a subject into the identity `scheme` writes.
    ///
    /// # Errors
    ///
    /// - [`IdentityError::Unsupported`] for `Mask` under the GUID scheme.
    /// - [`IdentityError::NotFound`] when the directory cannot map a user or
    ///   group, or (with `strict_ids`) cannot name a numeric id.
    pub fn to_native(
        &self,
        subject: Subject,
        scheme: IdentityScheme,
    ) -> Result<NativeIdentity, IdentityError> {
        if let Some(native) = symbolic_native(subject, scheme)? {
            return Ok(native);
        }
        if let Some(cached) = self.natives.get(&(subject, scheme)) {
            tracing::trace!(target: IDENTITY_TARGET, %subject, "subject cache hit");
            return cached;
        }
        let resolved = self.lookup_subject(subject, scheme, false)?;
        self.natives.insert((subject, scheme), resolved.clone());
        resolved
    }

    /// Resolves `subject` again from the directory, bypassing and then
    /// refreshing the cache. Used immediately before writing an ACL.
    ///
    /// # Errors
    ///
    /// See [`IdentityResolver::to_native`].
    pub fn revalidate(
        &self,
        subject: Subject,
        scheme: IdentityScheme,
    ) -> Result<NativeIdentity, IdentityError> {
        if let Some(native) = symbolic_native(subject, scheme)? {
            return Ok(native);
        }
        let resolved = self.lookup_subject(subject, scheme, true)?;
        self.natives.insert((subject, scheme), resolved.clone());
        resolved
    }

    /// Returns the account name for a named subject, for diagnostics.
    ///
    /// Directory failures read as "no name".
    pub fn display_name(&self, subject: Subject) -> Option<String> {
        if !subject.is_named() {
            return None;
        }
        if let Some(cached) = self.names.get(&subject) {
            return cached;
        }
        let name = self.lookup_name(subject).ok().flatten();
        self.names.insert(subject, name.clone());
        name
    }

    /// Returns an [`IdentityMap`] that translates for `scheme`.
    pub const fn for_scheme(&self, scheme: IdentityScheme) -> SchemeView<'_, D> {
        SchemeView {
            resolver: self,
            scheme,
        }
    }

    /// Drops every cached lookup.
    pub fn clear(&self) {
        self.subjects.clear();
        self.natives.clear();
        self.names.clear();
    }

    /// Reports cache activity summed across the resolver's caches.
    pub fn stats(&self) -> CacheStats {
        [self.subjects.stats(), self.natives.stats(), self.names.stats()]
            .into_iter()
            .fold(CacheStats::default(), |total, stats| CacheStats {
                hits: total.hits + stats.hits,
                misses: total.misses + stats.misses,
                entries: total.entries + stats.entries,
            })
    }

    /// Consults the directory for a GUID. The outer `Err` is a directory
    /// failure and is not cached; the inner result is.
    fn lookup_guid(&self, guid: Uuid) -> Result<Result<Subject, IdentityError>, IdentityError> {
        let native = NativeIdentity::Guid(guid);
        let record = self
            .directory
            .guid_to_id(guid)
            .map_err(|error| directory_failure(native.into(), &error))?;
        tracing::debug!(target: IDENTITY_TARGET, %guid, ?record, "resolved guid");

        Ok(match record {
            Some((uid, IdKind::User)) => Ok(Subject::User(uid)),
            Some((gid, IdKind::Group)) => Ok(Subject::Group(gid)),
            Some((_, IdKind::Other(id_type))) => {
                Err(IdentityError::AmbiguousDomain { guid, id_type })
            }
            None => Err(IdentityError::NotFound(native.into())),
        })
    }

    fn lookup_subject(
        &self,
        subject: Subject,
        scheme: IdentityScheme,
        fresh: bool,
    ) -> Result<Result<NativeIdentity, IdentityError>, IdentityError> {
        let not_found = || IdentityError::NotFound(subject.into());
        match (scheme, subject) {
            (IdentityScheme::Numeric, Subject::User(id) | Subject::Group(id)) => {
                if self.config.strict_ids_enabled() {
                    let name = if fresh {
                        let name = self.lookup_name(subject)?;
                        self.names.insert(subject, name.clone());
                        name
                    } else {
                        self.display_name_strict(subject)?
                    };
                    if name.is_none() {
                        tracing::debug!(target: IDENTITY_TARGET, %subject, "strict ids: no such account");
                        return Ok(Err(not_found()));
                    }
                }
                Ok(Ok(match subject {
                    Subject::User(_) => NativeIdentity::Uid(id),
                    _ => NativeIdentity::Gid(id),
                }))
            }
            (IdentityScheme::Guid, Subject::User(uid)) => {
                let guid = self
                    .directory
                    .uid_to_guid(uid)
                    .map_err(|error| directory_failure(subject.into(), &error))?;
                tracing::debug!(target: IDENTITY_TARGET, %subject, ?guid, "resolved user guid");
                Ok(guid.map(NativeIdentity::Guid).ok_or_else(not_found))
            }
            (IdentityScheme::Guid, Subject::Group(gid)) => {
                let guid = self
                    .directory
                    .gid_to_guid(gid)
                    .map_err(|error| directory_failure(subject.into(), &error))?;
                tracing::debug!(target: IDENTITY_TARGET, %subject, ?guid, "resolved group guid");
                Ok(guid.map(NativeIdentity::Guid).ok_or_else(not_found))
            }
            _ => Ok(Err(IdentityError::Unsupported(subject.into()))),
        }
    }

    fn display_name_strict(&self, subject: Subject) -> Result<Option<String>, IdentityError> {
        if let Some(cached) = self.names.get(&subject) {
            return Ok(cached);
        }
        let name = self.lookup_name(subject)?;
        self.names.insert(subject, name.clone());
        Ok(name)
    }

    fn lookup_name(&self, subject: Subject) -> Result<Option<String>, IdentityError> {
        let result = match subject {
            Subject::User(uid) => self.directory.user_name(uid),
            Subject::Group(gid) => self.directory.group_name(gid),
            _ => Ok(None),
        };
        result.map_err(|error| directory_failure(subject.into(), &error))
    }
}

fn symbolic_native(
    subject: Subject,
    scheme: IdentityScheme,
) -> Result<Option<NativeIdentity>, IdentityError> {
    match scheme {
        IdentityScheme::Numeric => Ok(match subject {
            Subject::Owner => Some(NativeIdentity::Tag(PosixTag::UserObj)),
            Subject::OwningGroup => Some(NativeIdentity::Tag(PosixTag::GroupObj)),
            Subject::Mask => Some(NativeIdentity::Tag(PosixTag::Mask)),
            Subject::Other => Some(NativeIdentity::Tag(PosixTag::Other)),
            Subject::User(_) | Subject::Group(_) => None,
        }),
        IdentityScheme::Guid => match subject {
            Subject::Mask => Err(IdentityError::Unsupported(subject.into())),
            _ => Ok(wellknown::for_subject(subject).map(NativeIdentity::Guid)),
        },
    }
}

fn directory_failure(principal: Principal, error: &io::Error) -> IdentityError {
    tracing::warn!(target: IDENTITY_TARGET, %principal, %error, "directory lookup failed");
    if error.kind() == io::ErrorKind::Unsupported {
        IdentityError::Unsupported(principal)
    } else {
        IdentityError::NotFound(principal)
    }
}

impl<D> fmt::Debug for IdentityResolver<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityResolver")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// An [`IdentityMap`] bound to one identity scheme.
///
/// Under the numeric scheme GUIDs are rejected; under the GUID scheme only
/// GUIDs are accepted.
#[derive(Debug)]
pub struct SchemeView<'a, D> {
    resolver: &'a IdentityResolver<D>,
    scheme: IdentityScheme,
}

impl<D> SchemeView<'_, D> {
    /// Returns the scheme this view translates for.
    pub const fn scheme(&self) -> IdentityScheme {
        self.scheme
    }
}

impl<D: Directory> IdentityMap for SchemeView<'_, D> {
    fn to_subject(&self, native: NativeIdentity) -> Result<Subject, IdentityError> {
        let compatible = match self.scheme {
            IdentityScheme::Numeric => !matches!(native, NativeIdentity::Guid(_)),
            IdentityScheme::Guid => matches!(native, NativeIdentity::Guid(_)),
        };
        if !compatible {
            return Err(IdentityError::Unsupported(native.into()));
        }
        self.resolver.to_subject(native)
    }

    fn to_native(&self, subject: Subject) -> Result<NativeIdentity, IdentityError> {
        self.resolver.to_native(subject, self.scheme)
    }
}
