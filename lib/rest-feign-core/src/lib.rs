//! Core types and traits for rest-feign declarative HTTP client proxies.
//!
//! This crate provides the leaves of the proxy pipeline:
//! - [`Method`], [`Request`], [`Response`] - HTTP exchange types
//! - [`Error`] and [`Result`] - Error handling
//! - [`HttpClient`] - Transport boundary
//! - [`Encoder`], [`Decoder`], [`RequestCodec`] - Body codecs (JSON by default)
//! - [`CallLogger`] and [`CallLog`] - Per-call buffered logging
//! - [`Interceptor`] and [`InterceptorRegistry`] - Request hooks resolved by type
//! - [`Environment`] - Property sources and `${...}` placeholder resolution
//! - [`TypeRef`] and [`Namespace`] - Type identity used by client discovery

mod client;
mod codec;
mod error;
mod interceptor;
mod logger;
mod method;
mod placeholder;
pub mod prelude;
mod request;
mod response;
mod type_ref;

pub use client::{HttpClient, TransportFuture};
pub use codec::{ContentType, Decoder, Encoder, JsonDecoder, JsonEncoder, RequestCodec};
pub use error::{Error, Result};
pub use interceptor::{Interceptor, InterceptorRegistry};
pub use logger::{CallLog, CallLogger, LogLevel};
pub use method::Method;
pub use placeholder::{
    Environment, Properties, PropertySource, SystemEnvironment, resolve_placeholders,
};
pub use request::{Request, RequestBuilder};
pub use response::Response;
pub use type_ref::{Namespace, TypeRef};

// Re-export http crate types for status codes and headers
pub use http::{StatusCode, header};
