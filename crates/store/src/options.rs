/// Options that control how an [`AclStore`](crate::AclStore) touches the
/// filesystem.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StoreOptions {
    follow_symlinks: bool,
    retry_interrupted: bool,
    revalidate_identities: bool,
}

impl StoreOptions {
    /// Creates a new [`StoreOptions`] value with defaults applied.
    ///
    /// By default symbolic links are followed, an interrupted system call is
    /// retried once, and every principal is resolved afresh before a write.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            follow_symlinks: true,
            retry_interrupted: true,
            revalidate_identities: true,
        }
    }

    /// Operates on a symbolic link's target (`true`) or on the link itself.
    ///
    /// Linux has no ACLs on symbolic links; disabling this makes every
    /// operation there fail as unsupported.
    #[must_use]
    #[doc(alias = "--no-dereference")]
    pub const fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Retries a system call once when it is interrupted by a signal.
    #[must_use]
    pub const fn retry_interrupted(mut self, retry: bool) -> Self {
        self.retry_interrupted = retry;
        self
    }

    /// Resolves every principal from the directory before writing, ignoring
    /// cached results.
    #[must_use]
    pub const fn revalidate_identities(mut self, revalidate: bool) -> Self {
        self.revalidate_identities = revalidate;
        self
    }

    /// Reports whether symbolic links are followed.
    #[must_use]
    pub const fn follows_symlinks(&self) -> bool {
        self.follow_symlinks
    }

    /// Reports whether interrupted calls are retried.
    #[must_use]
    pub const fn retries_interrupted(&self) -> bool {
        self.retry_interrupted
    }

    /// Reports whether principals are revalidated before a write.
    #[must_use]
    pub const fn revalidates_identities(&self) -> bool {
        self.revalidate_identities
    }
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self::new()
    }
}
