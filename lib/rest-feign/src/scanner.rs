//! Client discovery.
//!
//! [`ClientScanner`] searches a [`TypeCatalog`] for `#[rest_client]` declarations, validates
//! every candidate and turns it into a [`ClientDescriptor`]. Validation covers the whole
//! pass before anything is registered: one invalid declaration aborts discovery with
//! nothing registered.

use std::collections::{HashMap, HashSet};

use crate::declaration::{Declared, TypeCatalog};
use crate::{ClientDescriptor, Error, InterceptorRegistry, Namespace, Result, TypeRef};

/// Where to look for clients.
///
/// The namespaces searched are, by precedence:
/// 1. the modules of the seed `clients`, if any were given,
/// 2. the explicit `scan` namespaces, if any were given,
/// 3. the activation module.
///
/// ```ignore
/// let config = EnableRestClients::new(module_path!()).client::<InventoryApiClient>();
/// ```
#[derive(Debug, Clone, Default)]
pub struct EnableRestClients {
    clients: Vec<TypeRef>,
    scan: Vec<Namespace>,
    activation: Namespace,
}

impl EnableRestClients {
    /// Scanning activated from the module `activation`, usually `module_path!()`.
    #[must_use]
    pub fn new(activation: impl Into<Namespace>) -> Self {
        Self {
            activation: activation.into(),
            ..Self::default()
        }
    }

    /// Add a seed client; its module is scanned.
    #[must_use]
    pub fn client<T: Declared>(self) -> Self {
        self.client_ref(T::declaration().type_ref())
    }

    /// Add a seed client by type reference.
    #[must_use]
    pub fn client_ref(mut self, type_ref: TypeRef) -> Self {
        self.clients.push(type_ref);
        self
    }

    /// Add an explicit namespace.
    #[must_use]
    pub fn scan(mut self, namespace: impl Into<Namespace>) -> Self {
        self.scan.push(namespace.into());
        self
    }

    /// Namespaces to search, without duplicates.
    #[must_use]
    pub fn namespaces(&self) -> Vec<Namespace> {
        let candidates = if !self.clients.is_empty() {
            self.clients.iter().map(TypeRef::namespace).collect()
        } else if !self.scan.is_empty() {
            self.scan.clone()
        } else {
            vec![self.activation.clone()]
        };

        let mut seen = HashSet::new();
        candidates
            .into_iter()
            .filter(|namespace| seen.insert(namespace.clone()))
            .collect()
    }
}

/// Receives descriptors found by a scan. Implemented by [`Container`](crate::Container).
pub trait DescriptorRegistry {
    /// Register `descriptor` under its registered name, replacing any previous entry.
    fn register_descriptor(&mut self, descriptor: ClientDescriptor);
}

/// Finds and validates client declarations.
#[derive(Debug, Clone, Copy)]
pub struct ClientScanner<'a> {
    interceptors: &'a InterceptorRegistry,
}

impl<'a> ClientScanner<'a> {
    /// Scanner validating interceptor references against `interceptors`.
    #[must_use]
    pub const fn new(interceptors: &'a InterceptorRegistry) -> Self {
        Self { interceptors }
    }

    /// Collect a descriptor for every client declared in the configured namespaces.
    ///
    /// Nested declarations and declarations without client metadata are skipped. A
    /// declaration reachable from several namespaces is only considered once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] on the first invalid candidate: a non-trait
    /// declaration, a blank url, an interceptor that is not registered as such, or a
    /// registered name used twice.
    pub fn scan(
        &self,
        catalog: &TypeCatalog,
        config: &EnableRestClients,
    ) -> Result<Vec<ClientDescriptor>> {
        let namespaces = config.namespaces();
        tracing::debug!(?namespaces, "scanning for rest clients");

        let mut seen = HashSet::new();
        let mut names: HashMap<String, &'static str> = HashMap::new();
        let mut descriptors = Vec::new();

        for namespace in &namespaces {
            for declaration in catalog.in_namespace(namespace) {
                if declaration.client().is_none() || !seen.insert(declaration.type_ref()) {
                    continue;
                }

                let descriptor = ClientDescriptor::from_declaration(declaration)?;
                self.check_interceptors(&descriptor)?;

                if let Some(previous) =
                    names.insert(descriptor.registered_name().to_string(), declaration.name())
                {
                    return Err(Error::configuration(format!(
                        "rest client name '{}' is used by both {previous} and {}",
                        descriptor.registered_name(),
                        declaration.name()
                    )));
                }

                tracing::debug!(
                    client = descriptor.registered_name(),
                    target = declaration.name(),
                    "found rest client"
                );
                descriptors.push(descriptor);
            }
        }

        Ok(descriptors)
    }

    /// Scan, then register every descriptor into `registry`.
    ///
    /// Nothing is registered when the scan fails.
    ///
    /// # Errors
    ///
    /// See [`ClientScanner::scan`].
    pub fn scan_into(
        &self,
        catalog: &TypeCatalog,
        config: &EnableRestClients,
        registry: &mut impl DescriptorRegistry,
    ) -> Result<Vec<String>> {
        let descriptors = self.scan(catalog, config)?;
        let names = descriptors
            .iter()
            .map(|d| d.registered_name().to_string())
            .collect::<Vec<_>>();
        for descriptor in descriptors {
            registry.register_descriptor(descriptor);
        }
        tracing::info!(count = names.len(), "registered rest clients");
        Ok(names)
    }

    fn check_interceptors(&self, descriptor: &ClientDescriptor) -> Result<()> {
        match descriptor
            .interceptors()
            .iter()
            .find(|interceptor| !self.interceptors.implements_interceptor(interceptor))
        {
            Some(invalid) => Err(Error::configuration(format!(
                "invalid interceptor on rest client {}: expected an Interceptor but got {invalid}",
                descriptor.target()
            ))),
            None => Ok(()),
        }
    }
}
