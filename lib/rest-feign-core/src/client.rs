//! Transport boundary.
//!
//! Proxies never talk to the network themselves: every request goes through an
//! [`HttpClient`]. The default implementation lives in `rest-feign` (`HyperClient`);
//! tests plug in stubs.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::{Request, Response, Result};

/// Future returned by [`HttpClient::execute`].
pub type TransportFuture = Pin<Box<dyn Future<Output = Result<Response>> + Send + 'static>>;

/// Executes HTTP requests.
///
/// Object safe, so one transport can be shared by every proxy of a container as
/// `Arc<dyn HttpClient>`. Timeouts and connection reuse are the transport's business.
pub trait HttpClient: Send + Sync + 'static {
    /// Execute an HTTP request and return the fully read response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails for any reason:
    /// - Network errors
    /// - TLS errors
    /// - Timeouts
    fn execute(&self, request: Request) -> TransportFuture;
}

impl<T: HttpClient + ?Sized> HttpClient for Arc<T> {
    fn execute(&self, request: Request) -> TransportFuture {
        (**self).execute(request)
    }
}
