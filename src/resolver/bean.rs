//! The bean resolver: property access and method invocation on arbitrary receivers.

use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;

use crate::{
    error::NotFoundReason,
    metadata::{
        typesystem::{BuiltinType, TypeRc, TypeRegistry, TypeScope},
        value::Value,
    },
    resolver::{
        binder::bind_arguments,
        cache::ResolutionCache,
        coercion::default_policy,
        config::ResolverConfig,
        context::EvalContext,
        dispatcher::Dispatcher,
        property::{FeatureDescriptor, PropertyDescriptor},
    },
    Error, Result,
};

/// Member resolution as seen by an expression evaluator.
///
/// The evaluator asks a chain of resolvers in turn. A resolver that handles a request calls
/// [`EvalContext::set_property_resolved`]; one that does not handle it leaves the flag unset
/// and returns a neutral value, so the evaluator moves on to the next resolver.
pub trait Resolver: Send + Sync {
    /// Read `base.property`.
    ///
    /// # Errors
    /// Returns [`Error::PropertyNotFound`] if the property is null, undeclared or not readable,
    /// and [`Error::Evaluation`] if the read accessor fails.
    fn read_property(&self, ctx: &mut EvalContext, base: &Value, property: &Value) -> Result<Value>;

    /// Write `base.property = value`.
    ///
    /// # Errors
    /// Returns [`Error::PropertyNotWritable`] for read-only resolvers and properties without a
    /// write accessor, [`Error::PropertyNotFound`] for null or undeclared properties, and
    /// [`Error::Evaluation`] if the write accessor fails or rejects the value.
    fn write_property(
        &self,
        ctx: &mut EvalContext,
        base: &Value,
        property: &Value,
        value: Value,
    ) -> Result<()>;

    /// The most general type that may be written to `base.property`.
    ///
    /// # Errors
    /// Returns [`Error::PropertyNotFound`] if the property is null or undeclared.
    fn type_of_property(
        &self,
        ctx: &mut EvalContext,
        base: &Value,
        property: &Value,
    ) -> Result<Option<TypeRc>>;

    /// Returns `true` if `base.property` cannot be written.
    ///
    /// A null base is not handled and reports whether the resolver itself is read-only.
    ///
    /// # Errors
    /// Returns [`Error::PropertyNotFound`] if the property is null or undeclared.
    fn is_property_read_only(
        &self,
        ctx: &mut EvalContext,
        base: &Value,
        property: &Value,
    ) -> Result<bool>;

    /// Invoke `base.method(params...)`.
    ///
    /// With `param_types` the method is looked up by exact signature; otherwise overload
    /// resolution picks it from the argument values. Missing `params` mean no arguments.
    ///
    /// # Errors
    /// Returns [`Error::MethodNotFound`] if no method is selected and [`Error::Evaluation`]
    /// if binding the arguments or the method itself fails.
    fn invoke_method(
        &self,
        ctx: &mut EvalContext,
        base: &Value,
        method: &Value,
        param_types: Option<&[TypeRc]>,
        params: Option<&[Value]>,
    ) -> Result<Value>;

    /// The most general type accepted as property name for `base`
    fn common_property_type(&self, ctx: &mut EvalContext, base: &Value) -> Option<TypeRc>;

    /// The properties of `base`, for tooling
    fn feature_descriptors(&self, ctx: &mut EvalContext, base: &Value) -> Vec<FeatureDescriptor>;
}

/// Resolves properties through bean accessors and methods through overload resolution.
///
/// Any non-null value is a valid receiver. Property tables and method resolutions are cached
/// in a [`ResolutionCache`], which may be shared with other resolvers over the same registry.
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use elresolve::prelude::*;
///
/// let registry = Arc::new(TypeRegistry::new());
/// let int = registry.primitive(PrimitiveKind::Int);
/// let counter = registry.class("Counter").property("count", &int).build()?;
///
/// let resolver = BeanResolver::new(registry.clone(), false);
/// let mut ctx = EvalContext::new();
/// let bean = Value::object(&counter);
///
/// resolver.write_property(&mut ctx, &bean, &Value::from("count"), Value::Int(41))?;
/// let count = resolver.invoke_method(&mut ctx, &bean, &Value::from("getCount"), None, None)?;
/// assert_eq!(count, Value::Int(41));
/// # Ok::<(), elresolve::Error>(())
/// ```
pub struct BeanResolver {
    registry: Arc<TypeRegistry>,
    config: ResolverConfig,
    cache: Arc<ResolutionCache>,
}

impl BeanResolver {
    /// Create a resolver with its own cache
    #[must_use]
    pub fn new(registry: Arc<TypeRegistry>, read_only: bool) -> Self {
        Self::with_config(registry, ResolverConfig { read_only })
    }

    /// Create a resolver from a configuration
    #[must_use]
    pub fn with_config(registry: Arc<TypeRegistry>, config: ResolverConfig) -> Self {
        Self::with_cache(registry, config, Arc::new(ResolutionCache::new()))
    }

    /// Create a resolver sharing `cache` with other resolvers
    #[must_use]
    pub fn with_cache(
        registry: Arc<TypeRegistry>,
        config: ResolverConfig,
        cache: Arc<ResolutionCache>,
    ) -> Self {
        BeanResolver {
            registry,
            config,
            cache,
        }
    }

    /// The registry receivers are resolved against
    #[must_use]
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// The resolution cache
    #[must_use]
    pub fn cache(&self) -> &Arc<ResolutionCache> {
        &self.cache
    }

    /// The construction-time configuration
    #[must_use]
    pub fn config(&self) -> ResolverConfig {
        self.config
    }

    /// Returns `true` if all property writes are rejected
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.config.read_only
    }

    /// Drop all cached resolutions for receiver types of `scope`.
    ///
    /// # Returns
    /// The number of removed cache entries.
    pub fn purge_scope(&self, scope: TypeScope) -> usize {
        self.cache.purge(scope)
    }

    /// Unload the types of `scope` from the registry and drop their cached resolutions.
    ///
    /// Values of unloaded types are rejected afterwards with [`Error::ScopeUnloaded`].
    ///
    /// # Errors
    /// Returns [`Error::TypeError`] for [`TypeScope::SYSTEM`].
    pub fn unload_scope(&self, scope: TypeScope) -> Result<usize> {
        let removed = self.registry.unload_scope(scope)?;
        self.cache.purge(scope);
        Ok(removed)
    }

    /// Build the property tables of `types` in parallel.
    ///
    /// # Returns
    /// The total number of properties of the given types.
    pub fn preload(&self, types: &[TypeRc]) -> usize {
        let properties: usize = types
            .par_iter()
            .map(|ty| self.cache.property_table(ty).len())
            .sum();
        debug!(types = types.len(), properties, "preloaded property tables");
        properties
    }

    /// Runtime type of a non-null receiver
    fn receiver_type(&self, base: &Value) -> Result<TypeRc> {
        let Some(ty) = base.runtime_type(&self.registry) else {
            return Err(Error::TypeError("null is not a receiver".to_string()));
        };
        if self.registry.get(&ty.token).is_none() {
            return Err(Error::ScopeUnloaded(ty.scope));
        }
        Ok(ty)
    }

    fn property(&self, base: &Value, property: &Value) -> Result<(TypeRc, PropertyDescriptor)> {
        let ty = self.receiver_type(base)?;
        let not_found = || Error::PropertyNotFound {
            type_name: ty.name.clone(),
            property: property.to_string(),
        };
        if property.is_null() {
            return Err(not_found());
        }

        let table = self.cache.property_table(&ty);
        let descriptor = table.get(&property.to_string()).cloned().ok_or_else(not_found)?;
        Ok((ty, descriptor))
    }
}

impl Resolver for BeanResolver {
    fn read_property(&self, ctx: &mut EvalContext, base: &Value, property: &Value) -> Result<Value> {
        if base.is_null() {
            return Ok(Value::Null);
        }

        let (ty, descriptor) = self.property(base, property)?;
        let Some(read) = descriptor.read_method() else {
            return Err(Error::PropertyNotFound {
                type_name: ty.name.clone(),
                property: descriptor.name().to_string(),
            });
        };
        let value = read.invoke(&self.registry, base, &[])?;
        ctx.set_property_resolved(true);
        Ok(value)
    }

    fn write_property(
        &self,
        ctx: &mut EvalContext,
        base: &Value,
        property: &Value,
        value: Value,
    ) -> Result<()> {
        if base.is_null() {
            return Ok(());
        }

        let not_writable = |type_name: &str| Error::PropertyNotWritable {
            type_name: type_name.to_string(),
            property: property.to_string(),
        };
        if self.config.read_only {
            return Err(not_writable(&base.type_name()));
        }

        let (ty, descriptor) = self.property(base, property)?;
        let Some(write) = descriptor.write_method() else {
            return Err(not_writable(&ty.name));
        };
        write.invoke(&self.registry, base, &[value])?;
        ctx.set_property_resolved(true);
        Ok(())
    }

    fn type_of_property(
        &self,
        ctx: &mut EvalContext,
        base: &Value,
        property: &Value,
    ) -> Result<Option<TypeRc>> {
        if base.is_null() {
            return Ok(None);
        }

        let (_, descriptor) = self.property(base, property)?;
        ctx.set_property_resolved(true);
        Ok(Some(descriptor.property_type().clone()))
    }

    fn is_property_read_only(
        &self,
        ctx: &mut EvalContext,
        base: &Value,
        property: &Value,
    ) -> Result<bool> {
        if base.is_null() {
            return Ok(self.config.read_only);
        }

        let (_, descriptor) = self.property(base, property)?;
        ctx.set_property_resolved(true);
        Ok(self.config.read_only || descriptor.is_read_only())
    }

    fn invoke_method(
        &self,
        ctx: &mut EvalContext,
        base: &Value,
        method: &Value,
        param_types: Option<&[TypeRc]>,
        params: Option<&[Value]>,
    ) -> Result<Value> {
        if base.is_null() {
            return Ok(Value::Null);
        }

        let ty = self.receiver_type(base)?;
        let args = params.unwrap_or_default();
        if method.is_null() {
            let arg_types: Vec<String> = args.iter().map(Value::type_name).collect();
            return Err(method_not_found!(
                ty.name,
                "null",
                arg_types,
                NotFoundReason::NoApplicableMethod
            ));
        }

        let name = method.to_string();
        let policy = ctx.coercion_policy().unwrap_or_else(default_policy);
        let dispatcher = Dispatcher::new(&self.registry, &self.cache, policy.as_ref());
        let handle = match param_types {
            Some(types) => dispatcher.resolve_signature(&ty, &name, types)?,
            None => dispatcher.resolve(&ty, &name, args)?,
        };

        let bound = bind_arguments(policy.as_ref(), &handle, args).map_err(|e| {
            Error::Evaluation {
                message: format!(
                    "Cannot bind arguments of {}: {e}",
                    handle.declaration().signature()
                ),
                source: Some(Arc::new(e)),
            }
        })?;
        let result = handle.invoke(&self.registry, base, &bound)?;
        ctx.set_property_resolved(true);
        Ok(result)
    }

    fn common_property_type(&self, _ctx: &mut EvalContext, base: &Value) -> Option<TypeRc> {
        if base.is_null() {
            None
        } else {
            Some(self.registry.builtin(BuiltinType::Object))
        }
    }

    fn feature_descriptors(&self, _ctx: &mut EvalContext, base: &Value) -> Vec<FeatureDescriptor> {
        let Ok(ty) = self.receiver_type(base) else {
            return Vec::new();
        };
        self.cache
            .property_table(&ty)
            .iter()
            .map(|property| FeatureDescriptor {
                name: property.name().to_string(),
                display_name: property.name().to_string(),
                property_type: property.property_type().clone(),
                resolvable_at_design_time: true,
            })
            .collect()
    }
}

impl std::fmt::Debug for BeanResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeanResolver")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
