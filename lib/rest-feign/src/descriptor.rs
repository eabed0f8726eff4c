//! Validated client descriptors.

use std::fmt;

use crate::declaration::{DeclarationKind, ProxyConstructor, TypeDeclaration};
use crate::{Error, LogLevel, Result, TypeRef};

/// Everything needed to build one client proxy, fixed at scan time.
#[derive(Clone)]
pub struct ClientDescriptor {
    target: TypeRef,
    registered_name: String,
    url_template: String,
    secure: bool,
    singleton: bool,
    log_level: LogLevel,
    interceptors: Vec<TypeRef>,
    constructor: ProxyConstructor,
}

impl fmt::Debug for ClientDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientDescriptor")
            .field("target", &self.target.name())
            .field("registered_name", &self.registered_name)
            .field("url_template", &self.url_template)
            .field("secure", &self.secure)
            .field("singleton", &self.singleton)
            .field("log_level", &self.log_level)
            .field(
                "interceptors",
                &self.interceptors.iter().map(TypeRef::name).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl ClientDescriptor {
    /// Extract a descriptor from a declaration carrying client metadata.
    ///
    /// The registered name is the first non-blank of `name`, `value` and the fully
    /// qualified trait name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the declaration is not a trait, has no client
    /// metadata, has no proxy constructor or declares a blank `url`.
    pub fn from_declaration(declaration: &TypeDeclaration) -> Result<Self> {
        if declaration.kind() != DeclarationKind::Trait {
            return Err(Error::configuration(format!(
                "`#[rest_client]` can only be specified on a trait, but {} is a {}",
                declaration.name(),
                declaration.kind()
            )));
        }
        let metadata = declaration.client().ok_or_else(|| {
            Error::configuration(format!(
                "{} is not declared with `#[rest_client]`",
                declaration.name()
            ))
        })?;
        let constructor = declaration.constructor().ok_or_else(|| {
            Error::configuration(format!("no proxy constructor for {}", declaration.name()))
        })?;
        if metadata.url.trim().is_empty() {
            return Err(Error::configuration(format!(
                "url of rest client {} must not be blank",
                declaration.name()
            )));
        }

        let registered_name = [metadata.name.as_str(), metadata.value.as_str()]
            .into_iter()
            .find(|name| !name.trim().is_empty())
            .unwrap_or_else(|| declaration.name())
            .to_string();

        Ok(Self {
            target: declaration.type_ref(),
            registered_name,
            url_template: metadata.url.clone(),
            secure: metadata.is_secure,
            singleton: metadata.singleton,
            log_level: metadata.level,
            interceptors: metadata.interceptors.clone(),
            constructor,
        })
    }

    /// Proxy type, named after the declared trait.
    #[must_use]
    pub const fn target(&self) -> TypeRef {
        self.target
    }

    /// Registry key.
    #[must_use]
    pub fn registered_name(&self) -> &str {
        &self.registered_name
    }

    /// Base URL before placeholder resolution.
    #[must_use]
    pub fn url_template(&self) -> &str {
        &self.url_template
    }

    /// Whether the base URL is forced to `https`.
    #[must_use]
    pub const fn is_secure(&self) -> bool {
        self.secure
    }

    /// Whether one proxy is shared for the container's lifetime.
    #[must_use]
    pub const fn is_singleton(&self) -> bool {
        self.singleton
    }

    /// Call logging verbosity.
    #[must_use]
    pub const fn log_level(&self) -> LogLevel {
        self.log_level
    }

    /// Interceptor types, in application order.
    #[must_use]
    pub fn interceptors(&self) -> &[TypeRef] {
        &self.interceptors
    }

    /// Proxy constructor.
    #[must_use]
    pub const fn constructor(&self) -> ProxyConstructor {
        self.constructor
    }
}
