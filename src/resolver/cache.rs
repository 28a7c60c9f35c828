//! Shared resolution caches.
//!
//! [`ResolutionCache`] memoises the two expensive lookups of the engine: the property table of
//! a receiver type and the method chosen for a call shape. Both maps are sharded concurrent
//! maps; a miss may be computed by several callers at once, and the first insert wins while
//! the duplicates are dropped. Since both computations are deterministic every caller ends up
//! with an equivalent value.
//!
//! Entries are only removed by [`ResolutionCache::purge`], which drops everything belonging to
//! one [`TypeScope`]. A purge racing with lookups only causes later misses.

use std::{any::TypeId, sync::Arc};

use dashmap::DashMap;
use tracing::{debug, trace};

use crate::{
    metadata::{
        method::MethodHandle,
        token::Token,
        typesystem::{TypeRc, TypeScope},
    },
    resolver::property::PropertyTable,
};

/// Identity of one method call shape
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolutionKey {
    /// Receiver type
    pub receiver: Token,
    /// Scope of the receiver type, kept for purging
    pub scope: TypeScope,
    /// Method name
    pub name: String,
    /// Runtime argument types, `None` for `null` arguments
    pub args: Vec<Option<Token>>,
    /// Scopes of the non-null argument types, kept for purging
    pub arg_scopes: Vec<TypeScope>,
    /// Identity of the coercion policy the call was resolved with
    pub policy: TypeId,
}

impl ResolutionKey {
    /// Build the key for calling `name` on `receiver` with arguments of the given runtime types
    #[must_use]
    pub fn new(receiver: &TypeRc, name: &str, args: &[Option<TypeRc>], policy: TypeId) -> Self {
        ResolutionKey {
            receiver: receiver.token,
            scope: receiver.scope,
            name: name.to_string(),
            args: args.iter().map(|arg| arg.as_ref().map(|ty| ty.token)).collect(),
            arg_scopes: args.iter().flatten().map(|ty| ty.scope).collect(),
            policy,
        }
    }
}

/// Property tables and resolved methods, shareable between resolvers
#[derive(Default)]
pub struct ResolutionCache {
    properties: DashMap<Token, Arc<PropertyTable>>,
    methods: DashMap<ResolutionKey, MethodHandle>,
}

impl ResolutionCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The property table of `ty`, building it on first use
    pub fn property_table(&self, ty: &TypeRc) -> Arc<PropertyTable> {
        if let Some(table) = self.properties.get(&ty.token) {
            return table.value().clone();
        }

        // Built outside of the shard lock; a concurrent builder may win the insert.
        let table = Arc::new(PropertyTable::build(ty));
        self.properties
            .entry(ty.token)
            .or_insert(table)
            .value()
            .clone()
    }

    /// Returns `true` if the property table of `ty` is cached
    #[must_use]
    pub fn has_property_table(&self, ty: &TypeRc) -> bool {
        self.properties.contains_key(&ty.token)
    }

    /// Look up a previously resolved method
    #[must_use]
    pub fn method(&self, key: &ResolutionKey) -> Option<MethodHandle> {
        let hit = self.methods.get(key).map(|entry| entry.value().clone());
        if hit.is_some() {
            trace!(receiver = %key.receiver, method = %key.name, "method cache hit");
        }
        hit
    }

    /// Store a resolved method and return the cached entry, which is `handle` unless another
    /// caller stored one first
    pub fn store_method(&self, key: ResolutionKey, handle: MethodHandle) -> MethodHandle {
        self.methods.entry(key).or_insert(handle).value().clone()
    }

    /// Number of cached property tables
    #[must_use]
    pub fn property_tables(&self) -> usize {
        self.properties.len()
    }

    /// Number of cached method resolutions
    #[must_use]
    pub fn resolved_methods(&self) -> usize {
        self.methods.len()
    }

    /// Drop every entry whose receiver type belongs to `scope`, and every resolved method whose
    /// argument types include a type of `scope`.
    ///
    /// # Returns
    /// The number of removed entries.
    pub fn purge(&self, scope: TypeScope) -> usize {
        let before = self.properties.len() + self.methods.len();
        self.properties.retain(|_, table| table.scope() != scope);
        self.methods
            .retain(|key, _| key.scope != scope && !key.arg_scopes.contains(&scope));
        let removed = before.saturating_sub(self.properties.len() + self.methods.len());
        debug!(%scope, removed, "purged resolution cache");
        removed
    }

    /// Drop everything
    pub fn clear(&self) {
        self.properties.clear();
        self.methods.clear();
    }
}

impl std::fmt::Debug for ResolutionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionCache")
            .field("properties", &self.properties.len())
            .field("methods", &self.methods.len())
            .finish()
    }
}
