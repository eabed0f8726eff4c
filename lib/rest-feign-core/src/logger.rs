//! Per-call request/response logging.
//!
//! A [`CallLogger`] belongs to one client proxy. Every call gets its own [`CallLog`] buffer,
//! which moves with the call's future across `.await` points and worker threads. The buffer
//! is flushed as a single `INFO` event once the response was read or the transport failed,
//! so lines of concurrent calls never interleave.
//!
//! Output follows the Feign wire log format:
//!
//! ```text
//! [InventoryApi#get_item] ---> GET http://stock.local/items/7 HTTP/1.1
//! [InventoryApi#get_item] accept: application/json
//! [InventoryApi#get_item] ---> END HTTP (0-byte body)
//! [InventoryApi#get_item] <--- HTTP/1.1 200 OK (12ms)
//! [InventoryApi#get_item] content-type: application/json
//! [InventoryApi#get_item]
//! [InventoryApi#get_item] {"id":7}
//! [InventoryApi#get_item] <--- END HTTP (8-byte body)
//! ```

use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use http::HeaderMap;

use crate::{Error, Request, Response};

/// How much of each call is logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, derive_more::Display)]
pub enum LogLevel {
    /// No logging.
    #[display("NONE")]
    None,
    /// Request line, response status and elapsed time.
    #[display("BASIC")]
    Basic,
    /// Basic plus request and response headers.
    #[display("HEADERS")]
    Headers,
    /// Headers plus bodies.
    #[default]
    #[display("FULL")]
    Full,
}

impl FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NONE" => Ok(Self::None),
            "BASIC" => Ok(Self::Basic),
            "HEADERS" => Ok(Self::Headers),
            "FULL" => Ok(Self::Full),
            other => Err(Error::configuration(format!("unknown log level: {other}"))),
        }
    }
}

/// Logger shared by all calls of one client proxy.
#[derive(Debug, Clone)]
pub struct CallLogger {
    client: Arc<str>,
    level: LogLevel,
}

impl CallLogger {
    /// Creates a logger for the client named `client` (usually the trait name).
    #[must_use]
    pub fn new(client: impl Into<Arc<str>>, level: LogLevel) -> Self {
        Self {
            client: client.into(),
            level,
        }
    }

    /// Configured verbosity.
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        self.level
    }

    /// Client name used in the line prefix.
    #[must_use]
    pub fn client(&self) -> &str {
        &self.client
    }

    /// Opens the buffer of a new call to `method`.
    #[must_use]
    pub fn start(&self, method: &str) -> CallLog {
        CallLog {
            key: format!("{}#{method}", self.client),
            level: self.level,
            lines: Vec::new(),
            flushed: false,
        }
    }
}

/// Log buffer of a single call.
///
/// Consumed by [`CallLog::flush`]. A buffer dropped without flushing (for instance a
/// cancelled call) is flushed on drop.
#[derive(Debug)]
pub struct CallLog {
    key: String,
    level: LogLevel,
    lines: Vec<String>,
    flushed: bool,
}

impl CallLog {
    /// `Trait#method` key of the call.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Buffered lines, already prefixed.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Appends one line, prefixed with `[Trait#method]`.
    pub fn log(&mut self, line: impl Display) {
        self.lines.push(format!("[{}] {line}", self.key));
    }

    /// Logs an outgoing request.
    pub fn log_request(&mut self, request: &Request) {
        if self.level == LogLevel::None {
            return;
        }
        self.log(format_args!(
            "---> {} {} HTTP/1.1",
            request.method(),
            request.url()
        ));
        if self.level < LogLevel::Headers {
            return;
        }
        self.log_headers(request.headers());

        let body = request.body().map_or(&[][..], |b| b.as_ref());
        if self.level == LogLevel::Full && !body.is_empty() {
            self.log("");
            self.log(String::from_utf8_lossy(body));
        }
        self.log(format_args!("---> END HTTP ({}-byte body)", body.len()));
    }

    /// Logs a received response.
    pub fn log_response(&mut self, response: &Response, elapsed: Duration) {
        if self.level == LogLevel::None {
            return;
        }
        let reason = http::StatusCode::from_u16(response.status())
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or_default();
        self.log(format_args!(
            "<--- HTTP/1.1 {} {reason} ({}ms)",
            response.status(),
            elapsed.as_millis()
        ));
        if self.level < LogLevel::Headers {
            return;
        }
        self.log_headers(response.headers());

        let body = response.body();
        if self.level == LogLevel::Full && !body.is_empty() {
            self.log("");
            self.log(String::from_utf8_lossy(body));
        }
        self.log(format_args!("<--- END HTTP ({}-byte body)", body.len()));
    }

    /// Logs a transport failure.
    pub fn log_error(&mut self, error: &Error, elapsed: Duration) {
        if self.level == LogLevel::None {
            return;
        }
        self.log(format_args!("<--- ERROR {error} ({}ms)", elapsed.as_millis()));
        if self.level == LogLevel::Full {
            self.log("<--- END ERROR");
        }
    }

    fn log_headers(&mut self, headers: &HeaderMap) {
        for (name, value) in headers {
            let value = value.to_str().unwrap_or("<binary>");
            self.log(format_args!("{name}: {value}"));
        }
    }

    /// Emits the buffered lines as one `INFO` event and releases the buffer.
    ///
    /// Returns the emitted entry; empty buffers emit nothing.
    pub fn flush(mut self) -> String {
        self.emit()
    }

    fn emit(&mut self) -> String {
        self.flushed = true;
        if self.lines.is_empty() {
            return String::new();
        }
        let entry = std::mem::take(&mut self.lines).join("\n");
        tracing::info!(call = %self.key, "\n{entry}");
        entry
    }
}

impl Drop for CallLog {
    fn drop(&mut self) {
        if !self.flushed {
            self.emit();
        }
    }
}
