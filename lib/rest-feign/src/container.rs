//! Hosting container.
//!
//! The container owns the registered descriptors and the proxies built from them. Singleton
//! proxies are built on first lookup, exactly once even when several tasks race for them;
//! a failed build is not cached and the next lookup retries.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::declaration::{RestClient, TypeCatalog};
use crate::scanner::{ClientScanner, DescriptorRegistry, EnableRestClients};
use crate::{
    ClientConfig, ClientDescriptor, ClientProxy, ClientProxyFactory, Environment, Error,
    HttpClient, HyperClient, InterceptorRegistry, Result,
};

struct Entry {
    descriptor: ClientDescriptor,
    singleton: OnceCell<ClientProxy>,
}

/// Registry of REST clients and their proxies.
///
/// ```ignore
/// let mut catalog = TypeCatalog::new();
/// catalog.declare::<InventoryApiClient>();
///
/// let mut container = Container::builder()
///     .environment(Environment::system())
///     .build()?;
/// container.scan(&catalog, &EnableRestClients::new(module_path!()))?;
///
/// let inventory = container.get_by_type::<InventoryApiClient>()?;
/// let item = inventory.get_item("A-1").await?;
/// ```
pub struct Container {
    factory: ClientProxyFactory,
    entries: HashMap<String, Entry>,
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.entries.keys().collect();
        names.sort_unstable();
        f.debug_struct("Container")
            .field("factory", &self.factory)
            .field("clients", &names)
            .finish()
    }
}

impl Container {
    /// Create a new container builder.
    #[must_use]
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::default()
    }

    /// Proxy factory used by this container.
    #[must_use]
    pub fn factory(&self) -> &ClientProxyFactory {
        &self.factory
    }

    /// Discover clients in `catalog` and register them.
    ///
    /// Returns the registered names. On error nothing is registered.
    ///
    /// # Errors
    ///
    /// See [`ClientScanner::scan`].
    pub fn scan(
        &mut self,
        catalog: &TypeCatalog,
        config: &EnableRestClients,
    ) -> Result<Vec<String>> {
        let interceptors = self.factory.interceptors().clone();
        ClientScanner::new(&interceptors).scan_into(catalog, config, self)
    }

    /// Returns `true` if a client is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Descriptor registered under `name`.
    #[must_use]
    pub fn descriptor(&self, name: &str) -> Option<&ClientDescriptor> {
        self.entries.get(name).map(|entry| &entry.descriptor)
    }

    /// Proxy registered under `name`: the shared one for singletons, a new one otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for an unknown name, or the build error.
    pub fn proxy(&self, name: &str) -> Result<ClientProxy> {
        let entry = self.entries.get(name).ok_or_else(|| {
            Error::configuration(format!("no rest client registered under '{name}'"))
        })?;
        self.materialize(entry)
    }

    /// Typed proxy registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for an unknown name or when `name` belongs to
    /// another client type, or the build error.
    pub fn get<P: RestClient>(&self, name: &str) -> Result<Arc<P>> {
        let proxy = self.proxy(name)?;
        proxy.downcast::<P>().ok_or_else(|| {
            Error::configuration(format!(
                "rest client '{name}' is a {}, not a {}",
                proxy.target(),
                std::any::type_name::<P>()
            ))
        })
    }

    /// Typed proxy of the only client of type `P`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if no client or several clients of type `P` are
    /// registered, or the build error.
    pub fn get_by_type<P: RestClient>(&self) -> Result<Arc<P>> {
        let mut matches = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.descriptor.target().id() == TypeId::of::<P>());

        match (matches.next(), matches.next()) {
            (Some((name, _)), None) => self.get::<P>(name),
            (None, _) => Err(Error::configuration(format!(
                "no rest client of type {} registered",
                P::declaration().name()
            ))),
            (Some(_), Some(_)) => Err(Error::configuration(format!(
                "several rest clients of type {} registered, look them up by name",
                P::declaration().name()
            ))),
        }
    }

    fn materialize(&self, entry: &Entry) -> Result<ClientProxy> {
        if !entry.descriptor.is_singleton() {
            return self.factory.build(&entry.descriptor);
        }
        entry
            .singleton
            .get_or_try_init(|| self.factory.build(&entry.descriptor))
            .cloned()
    }
}

impl DescriptorRegistry for Container {
    fn register_descriptor(&mut self, descriptor: ClientDescriptor) {
        let name = descriptor.registered_name().to_string();
        let entry = Entry {
            descriptor,
            singleton: OnceCell::new(),
        };
        if let Some(previous) = self.entries.insert(name.clone(), entry) {
            tracing::warn!(
                client = %name,
                previous = previous.descriptor.target().name(),
                "rest client registration replaced"
            );
        }
    }
}

/// Builder for [`Container`].
#[derive(Default)]
pub struct ContainerBuilder {
    environment: Option<Environment>,
    interceptors: InterceptorRegistry,
    transport: Option<Arc<dyn HttpClient>>,
}

impl std::fmt::Debug for ContainerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerBuilder")
            .field("environment", &self.environment)
            .field("interceptors", &self.interceptors)
            .field("transport", &self.transport.is_some())
            .finish()
    }
}

impl ContainerBuilder {
    /// Property sources for placeholders. Defaults to [`Environment::system`].
    #[must_use]
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Interceptors available to client declarations.
    #[must_use]
    pub fn interceptors(mut self, interceptors: InterceptorRegistry) -> Self {
        self.interceptors = interceptors;
        self
    }

    /// Transport shared by every proxy. Defaults to a [`HyperClient`] configured from the
    /// environment.
    #[must_use]
    pub fn transport(mut self, transport: impl HttpClient) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Build the container.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the default transport cannot be configured from
    /// the environment.
    pub fn build(self) -> Result<Container> {
        let environment = self.environment.unwrap_or_else(Environment::system);
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HyperClient::with_config(ClientConfig::from_environment(
                &environment,
            )?)),
        };

        Ok(Container {
            factory: ClientProxyFactory::new(environment, self.interceptors, transport),
            entries: HashMap::new(),
        })
    }
}
