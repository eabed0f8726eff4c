//! Request pipeline shared by the methods of a generated proxy.
//!
//! For every call the pipeline applies the interceptors in order, logs the request,
//! hands it to the transport, logs the outcome and flushes the call's log buffer. Decoding
//! happens afterwards, so a decode failure still leaves a complete log entry.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::{
    CallLogger, Decoder, HttpClient, Interceptor, JsonEncoder, Request, RequestCodec, Response,
    Result,
};

/// Characters escaped in a path segment: controls, space, delimiters and `/`.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'?')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'\\')
    .add(b'%');

/// Percent-encode `value` as a single URL path segment.
///
/// ```
/// assert_eq!(rest_feign::encode_path_segment("a b/c"), "a%20b%2Fc");
/// ```
#[must_use]
pub fn encode_path_segment(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT).to_string()
}

/// Everything a proxy needs to turn a method call into an HTTP exchange.
#[derive(Clone)]
pub struct ClientPipeline {
    base_url: Url,
    codec: RequestCodec,
    logger: CallLogger,
    interceptors: Arc<[Arc<dyn Interceptor>]>,
    transport: Arc<dyn HttpClient>,
}

impl fmt::Debug for ClientPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientPipeline")
            .field("base_url", &self.base_url.as_str())
            .field("client", &self.logger.client())
            .field("level", &self.logger.level())
            .field("interceptors", &self.interceptors.len())
            .finish_non_exhaustive()
    }
}

impl ClientPipeline {
    /// Pipeline with the JSON codec, no interceptors and a logger at the default level.
    #[must_use]
    pub fn new(base_url: Url, logger: CallLogger, transport: Arc<dyn HttpClient>) -> Self {
        Self {
            base_url,
            codec: RequestCodec::default(),
            logger,
            interceptors: Arc::from(Vec::new()),
            transport,
        }
    }

    /// Replace the interceptor chain; they run in the given order.
    #[must_use]
    pub fn with_interceptors(mut self, interceptors: Vec<Arc<dyn Interceptor>>) -> Self {
        self.interceptors = Arc::from(interceptors);
        self
    }

    /// Replace the codec, e.g. to send pretty-printed JSON.
    #[must_use]
    pub fn with_codec(mut self, codec: RequestCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Resolved base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Logger of this client.
    #[must_use]
    pub fn logger(&self) -> &CallLogger {
        &self.logger
    }

    /// Number of attached interceptors.
    #[must_use]
    pub fn interceptor_count(&self) -> usize {
        self.interceptors.len()
    }

    /// Body encoder.
    #[must_use]
    pub fn encoder(&self) -> &JsonEncoder {
        self.codec.encoder()
    }

    /// Append `path` to the base URL.
    ///
    /// The base path is kept: `http://host/api` with `/items` gives `http://host/api/items`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidUrl`] if the result does not parse.
    pub fn url_for(&self, path: &str) -> Result<Url> {
        if path.is_empty() {
            return Ok(self.base_url.clone());
        }
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    /// Run one call through interceptors, logging and the transport.
    ///
    /// `method` is the trait method name, used in the log prefix. The response is returned
    /// whatever its status.
    ///
    /// # Errors
    ///
    /// Returns the transport error, after it was logged and the buffer flushed.
    pub async fn execute(&self, method: &str, mut request: Request) -> Result<Response> {
        for interceptor in self.interceptors.iter() {
            interceptor.apply(&mut request);
        }

        let mut log = self.logger.start(method);
        log.log_request(&request);

        let started = Instant::now();
        let result = self.transport.execute(request).await;
        match &result {
            Ok(response) => log.log_response(response, started.elapsed()),
            Err(error) => log.log_error(error, started.elapsed()),
        }
        log.flush();

        result
    }

    /// Check the status and decode the body.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Http`] for non-2xx responses, [`crate::Error::Decode`] if
    /// the body does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        let response = response.error_for_status()?;
        self.codec.decoder().decode(response.body())
    }

    /// Check the status and discard the body.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Http`] for non-2xx responses.
    pub fn expect_success(&self, response: Response) -> Result<()> {
        response.error_for_status().map(drop)
    }
}
