//! Built-in interceptors.
//!
//! Both are configured values rather than `Default` types, so they are registered with
//! [`InterceptorRegistry::register_instance`](crate::InterceptorRegistry::register_instance)
//! or [`InterceptorRegistry::register_with`](crate::InterceptorRegistry::register_with).

use http::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};

use crate::{Environment, Error, Interceptor, Request, Result};

/// Sets `Authorization: Bearer <token>` on every request.
#[derive(Debug, Clone)]
pub struct BearerAuthInterceptor {
    value: HeaderValue,
}

impl BearerAuthInterceptor {
    /// Interceptor sending `token`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the token is not a valid header value.
    pub fn new(token: impl AsRef<str>) -> Result<Self> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.as_ref()))
            .map_err(|_| Error::configuration("bearer token is not a valid header value"))?;
        value.set_sensitive(true);
        Ok(Self { value })
    }

    /// Interceptor sending the token stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the property is missing or invalid.
    pub fn from_environment(environment: &Environment, key: &str) -> Result<Self> {
        let token = environment
            .property(key)
            .ok_or_else(|| Error::configuration(format!("missing property {key}")))?;
        Self::new(environment.resolve_placeholders(&token))
    }
}

impl Interceptor for BearerAuthInterceptor {
    fn apply(&self, request: &mut Request) {
        request
            .headers_mut()
            .insert(AUTHORIZATION, self.value.clone());
    }
}

/// Sets a fixed set of headers, replacing values already present.
#[derive(Debug, Clone, Default)]
pub struct StaticHeadersInterceptor {
    headers: HeaderMap,
}

impl StaticHeadersInterceptor {
    /// Interceptor without headers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for an invalid name or value.
    pub fn with(mut self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| Error::configuration(format!("invalid header name: {name}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| Error::configuration(format!("invalid value for header {name}")))?;
        self.headers.append(name, value);
        Ok(self)
    }
}

impl Interceptor for StaticHeadersInterceptor {
    fn apply(&self, request: &mut Request) {
        for name in self.headers.keys() {
            request.headers_mut().remove(name);
        }
        for (name, value) in &self.headers {
            request.headers_mut().append(name, value.clone());
        }
    }
}
