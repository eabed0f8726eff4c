//! Prelude module for convenient imports.
//!
//! ```ignore
//! use rest_feign::prelude::*;
//! ```

pub use crate::{
    Container, EnableRestClients, Environment, Error, HttpClient, HyperClient, Interceptor,
    InterceptorRegistry, LogLevel, Properties, Request, Response, RestClient, Result,
    TypeCatalog, rest_client,
};
pub use serde::{Deserialize, Serialize};
