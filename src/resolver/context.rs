//! Per-evaluation context.
//!
//! The evaluator creates one [`EvalContext`] per expression evaluation and passes it to each
//! resolver it tries. A resolver that handles the request marks the context as resolved, so
//! the evaluator knows to stop trying further resolvers. The context also carries
//! application objects keyed by type, most importantly an optional [`CoercionPolicy`].

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    sync::Arc,
};

use crate::resolver::coercion::CoercionPolicy;

/// Slot type under which the application coercion policy is stored
struct PolicySlot(Arc<dyn CoercionPolicy>);

/// State shared between the evaluator and the resolvers for one evaluation
#[derive(Default)]
pub struct EvalContext {
    resolved: bool,
    entries: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl EvalContext {
    /// Create a context with the resolved flag cleared and no entries
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context whose method resolution uses `policy` instead of the default policy
    #[must_use]
    pub fn with_coercion_policy(mut self, policy: Arc<dyn CoercionPolicy>) -> Self {
        self.put_context(Arc::new(PolicySlot(policy)));
        self
    }

    /// Set or clear the resolved flag
    pub fn set_property_resolved(&mut self, resolved: bool) {
        self.resolved = resolved;
    }

    /// Returns `true` once a resolver handled the current request
    #[must_use]
    pub fn is_property_resolved(&self) -> bool {
        self.resolved
    }

    /// Store an application object; replaces an earlier object of the same type
    pub fn put_context<T: Any + Send + Sync>(&mut self, value: Arc<T>) {
        self.entries.insert(TypeId::of::<T>(), value);
    }

    /// Look up an application object by type
    #[must_use]
    pub fn context<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.clone().downcast::<T>().ok())
    }

    /// The application coercion policy, if one was supplied
    #[must_use]
    pub fn coercion_policy(&self) -> Option<Arc<dyn CoercionPolicy>> {
        self.context::<PolicySlot>().map(|slot| slot.0.clone())
    }
}

impl std::fmt::Debug for EvalContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvalContext")
            .field("resolved", &self.resolved)
            .field("entries", &self.entries.len())
            .finish()
    }
}
