use std::time::Duration;

/// Default number of entries each resolver cache holds.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Tuning for an [`IdentityResolver`](crate::IdentityResolver).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ResolverConfig {
    capacity: usize,
    ttl: Option<Duration>,
    strict_ids: bool,
}

impl ResolverConfig {
    /// Creates a configuration with a 1024-entry cache, no expiry, and
    /// dangling ids allowed.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            ttl: None,
            strict_ids: false,
        }
    }

    /// Bounds each cache to `capacity` entries. Zero disables caching.
    #[must_use]
    pub const fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Expires cached lookups older than `ttl`.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    /// Rejects numeric ids the local directory cannot name when translating
    /// subjects for writing.
    #[must_use]
    #[doc(alias = "--strict-ids")]
    pub const fn strict_ids(mut self, strict: bool) -> Self {
        self.strict_ids = strict;
        self
    }

    /// Reports the per-cache entry bound.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Reports the cache time-to-live, if any.
    #[must_use]
    pub const fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Reports whether dangling numeric ids are rejected.
    #[must_use]
    pub const fn strict_ids_enabled(&self) -> bool {
        self.strict_ids
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_expected_configuration() {
        let config = ResolverConfig::new();
        assert_eq!(config.capacity(), 1024);
        assert_eq!(config.ttl(), None);
        assert!(!config.strict_ids_enabled());
        assert_eq!(ResolverConfig::default(), config);
    }

    #[test]
    fn builder_methods_apply_requested_values() {
        let config = ResolverConfig::new()
            .with_capacity(8)
            .with_ttl(Some(Duration::from_secs(30)))
            .strict_ids(true);
        assert_eq!(config.capacity(), 8);
        assert_eq!(config.ttl(), Some(Duration::from_secs(30)));
        assert!(config.strict_ids_enabled());
    }
}
