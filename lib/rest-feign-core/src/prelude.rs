//! Prelude module for convenient imports.
//!
//! ```ignore
//! use rest_feign_core::prelude::*;
//! ```

pub use crate::{
    Environment, Error, HttpClient, Interceptor, InterceptorRegistry, LogLevel, Method,
    Properties, Request, RequestBuilder, Response, Result, TypeRef,
};
