//! Request interceptors and the registry resolving them by type.
//!
//! Client declarations reference interceptors by type (`interceptors = [AuthHeader]`).
//! A type only counts as an interceptor once it was registered here: scanning rejects
//! declarations referencing anything else, before any proxy is built.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::{Error, Request, Result, TypeRef};

/// Hook invoked on every outgoing request of a client, in declaration order.
pub trait Interceptor: Send + Sync + 'static {
    /// Observe or modify the request before it is logged and sent.
    fn apply(&self, request: &mut Request);
}

type Factory = Arc<dyn Fn() -> Arc<dyn Interceptor> + Send + Sync>;

struct Registration {
    name: &'static str,
    factory: Factory,
}

/// Capability-typed registry of interceptors.
///
/// ```
/// use rest_feign_core::{Interceptor, InterceptorRegistry, Request, TypeRef};
///
/// #[derive(Default)]
/// struct Tracing;
///
/// impl Interceptor for Tracing {
///     fn apply(&self, request: &mut Request) {
///         request.headers_mut().insert("x-trace", "on".parse().unwrap());
///     }
/// }
///
/// let mut registry = InterceptorRegistry::new();
/// registry.register::<Tracing>();
///
/// assert!(registry.implements_interceptor(&TypeRef::of::<Tracing>()));
/// assert!(!registry.implements_interceptor(&TypeRef::of::<String>()));
/// ```
#[derive(Clone, Default)]
pub struct InterceptorRegistry {
    entries: HashMap<TypeId, Arc<Registration>>,
}

impl fmt::Debug for InterceptorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.entries.values().map(|r| r.name).collect();
        names.sort_unstable();
        f.debug_struct("InterceptorRegistry")
            .field("interceptors", &names)
            .finish()
    }
}

impl InterceptorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T`; every resolution builds a fresh instance with [`Default`].
    pub fn register<T: Interceptor + Default>(&mut self) -> &mut Self {
        self.register_with(T::default)
    }

    /// Registers `T`; every resolution calls `factory`.
    pub fn register_with<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Interceptor,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.insert::<T>(Arc::new(move || Arc::new(factory()) as Arc<dyn Interceptor>))
    }

    /// Registers a shared instance of `T`; every resolution returns that instance.
    pub fn register_instance<T: Interceptor>(&mut self, instance: Arc<T>) -> &mut Self {
        let shared: Arc<dyn Interceptor> = instance;
        self.insert::<T>(Arc::new(move || Arc::clone(&shared)))
    }

    fn insert<T: Interceptor>(&mut self, factory: Factory) -> &mut Self {
        let name = std::any::type_name::<T>();
        tracing::debug!(interceptor = name, "registered interceptor");
        self.entries
            .insert(TypeId::of::<T>(), Arc::new(Registration { name, factory }));
        self
    }

    /// Returns `true` if `type_ref` was registered as an interceptor.
    #[must_use]
    pub fn implements_interceptor(&self, type_ref: &TypeRef) -> bool {
        self.entries.contains_key(&type_ref.id())
    }

    /// Produces an instance for `type_ref`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the type is not a registered interceptor.
    pub fn resolve(&self, type_ref: &TypeRef) -> Result<Arc<dyn Interceptor>> {
        self.entries
            .get(&type_ref.id())
            .map(|registration| (registration.factory)())
            .ok_or_else(|| {
                Error::configuration(format!(
                    "{type_ref} does not implement the Interceptor capability"
                ))
            })
    }

    /// Resolves every type in order.
    ///
    /// # Errors
    ///
    /// Fails on the first type that is not a registered interceptor.
    pub fn resolve_all(&self, type_refs: &[TypeRef]) -> Result<Vec<Arc<dyn Interceptor>>> {
        type_refs.iter().map(|t| self.resolve(t)).collect()
    }

    /// Number of registered interceptor types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing was registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
