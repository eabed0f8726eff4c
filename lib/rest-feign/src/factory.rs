//! Proxy construction.
//!
//! [`ClientProxyFactory::build`] turns a [`ClientDescriptor`] into a live proxy:
//! 1. resolve `${...}` placeholders in the url template,
//! 2. force the scheme required by `is_secure`,
//! 3. attach the JSON codec and a call logger named after the trait,
//! 4. resolve the interceptors in declaration order,
//! 5. hand the assembled [`ClientPipeline`] to the generated constructor.
//!
//! The factory holds no state besides its collaborators and keeps no reference to what it
//! built, so it can be shared and called concurrently.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::declaration::RestClient;
use crate::{
    CallLogger, ClientDescriptor, ClientPipeline, Environment, HttpClient, InterceptorRegistry,
    Result, TypeRef,
};

const HTTP: &str = "http://";
const HTTPS: &str = "https://";

/// Force the scheme of `url` to `https` when `secure`, to `http` otherwise.
///
/// A URL without scheme gets one prepended; the other scheme is replaced.
///
/// ```
/// use rest_feign::normalize_scheme;
///
/// assert_eq!(normalize_scheme("stock.local", true), "https://stock.local");
/// assert_eq!(normalize_scheme("http://stock.local", true), "https://stock.local");
/// assert_eq!(normalize_scheme("https://stock.local", false), "http://stock.local");
/// ```
#[must_use]
pub fn normalize_scheme(url: &str, secure: bool) -> String {
    let url = url.trim();
    let (wanted, other) = if secure { (HTTPS, HTTP) } else { (HTTP, HTTPS) };

    if let Some(rest) = strip_scheme(url, other) {
        format!("{wanted}{rest}")
    } else if let Some(rest) = strip_scheme(url, wanted) {
        format!("{wanted}{rest}")
    } else {
        format!("{wanted}{url}")
    }
}

fn strip_scheme<'a>(url: &'a str, scheme: &str) -> Option<&'a str> {
    url.get(..scheme.len())
        .filter(|prefix| prefix.eq_ignore_ascii_case(scheme))
        .and_then(|_| url.get(scheme.len()..))
}

/// A built client, before it is handed out as its concrete proxy type.
#[derive(Clone)]
pub struct ClientProxy {
    name: String,
    target: TypeRef,
    resolved_url: String,
    base_url: Url,
    instance: Arc<dyn Any + Send + Sync>,
}

impl fmt::Debug for ClientProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientProxy")
            .field("name", &self.name)
            .field("target", &self.target.name())
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ClientProxy {
    /// Registered name of the client.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Proxy type, named after the declared trait.
    #[must_use]
    pub const fn target(&self) -> TypeRef {
        self.target
    }

    /// Base URL after placeholder resolution and scheme normalization, before parsing.
    #[must_use]
    pub fn resolved_url(&self) -> &str {
        &self.resolved_url
    }

    /// Parsed base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The proxy as its concrete type, or `None` if `P` is not the built type.
    #[must_use]
    pub fn downcast<P: RestClient>(&self) -> Option<Arc<P>> {
        Arc::clone(&self.instance).downcast::<P>().ok()
    }

    /// Returns `true` if both handles point to the same proxy instance.
    #[must_use]
    pub fn same_instance(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.instance, &other.instance)
    }
}

/// Builds proxies from descriptors.
#[derive(Clone)]
pub struct ClientProxyFactory {
    environment: Environment,
    interceptors: InterceptorRegistry,
    transport: Arc<dyn HttpClient>,
}

impl fmt::Debug for ClientProxyFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientProxyFactory")
            .field("environment", &self.environment)
            .field("interceptors", &self.interceptors)
            .finish_non_exhaustive()
    }
}

impl ClientProxyFactory {
    /// Factory resolving placeholders against `environment`, interceptors from
    /// `interceptors`, and sending every request through `transport`.
    #[must_use]
    pub fn new(
        environment: Environment,
        interceptors: InterceptorRegistry,
        transport: Arc<dyn HttpClient>,
    ) -> Self {
        Self {
            environment,
            interceptors,
            transport,
        }
    }

    /// Property sources used for placeholders.
    #[must_use]
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Interceptor registry.
    #[must_use]
    pub fn interceptors(&self) -> &InterceptorRegistry {
        &self.interceptors
    }

    /// Build a proxy for `descriptor`.
    ///
    /// Unresolvable placeholders are kept verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidUrl`] if the resolved base URL does not parse and
    /// [`crate::Error::Configuration`] if an interceptor cannot be resolved.
    pub fn build(&self, descriptor: &ClientDescriptor) -> Result<ClientProxy> {
        let target = descriptor.target();
        tracing::info!(
            client = descriptor.registered_name(),
            target = target.name(),
            "building rest client proxy"
        );

        let resolved_url = normalize_scheme(
            &self
                .environment
                .resolve_placeholders(descriptor.url_template()),
            descriptor.is_secure(),
        );
        let base_url = Url::parse(&resolved_url)?;

        let logger = CallLogger::new(target.simple_name(), descriptor.log_level());
        let mut pipeline =
            ClientPipeline::new(base_url.clone(), logger, Arc::clone(&self.transport));

        let interceptors = self.interceptors.resolve_all(descriptor.interceptors())?;
        if !interceptors.is_empty() {
            pipeline = pipeline.with_interceptors(interceptors);
        }

        let instance = (descriptor.constructor())(pipeline);

        tracing::info!(
            client = descriptor.registered_name(),
            url = %base_url,
            level = %descriptor.log_level(),
            interceptors = descriptor.interceptors().len(),
            "rest client proxy ready"
        );

        Ok(ClientProxy {
            name: descriptor.registered_name().to_string(),
            target,
            resolved_url,
            base_url,
            instance,
        })
    }
}
