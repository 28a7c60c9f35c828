//! Resolver configuration
//!
//! A resolver has a single construction-time switch: whether property writes are allowed.
//! The flag never changes for the lifetime of a [`crate::BeanResolver`].

/// Configuration for a [`crate::BeanResolver`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolverConfig {
    /// Reject every property write with [`crate::Error::PropertyNotWritable`] and report every
    /// property as read-only
    pub read_only: bool,
}

impl ResolverConfig {
    /// Creates a configuration that rejects all property writes
    #[must_use]
    pub fn read_only() -> Self {
        Self { read_only: true }
    }

    /// Creates a configuration that allows writes through public setters (the default)
    #[must_use]
    pub fn writable() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert!(!ResolverConfig::default().read_only);
        assert_eq!(ResolverConfig::writable(), ResolverConfig::default());
        assert!(ResolverConfig::read_only().read_only);
    }
}
