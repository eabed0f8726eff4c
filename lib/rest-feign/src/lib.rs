//! Declarative REST client proxies.
//!
//! Declare a trait with `#[rest_client]`, collect it in a [`TypeCatalog`], let a
//! [`Container`] scan the catalog, and call the generated proxy:
//!
//! ```ignore
//! use rest_feign::prelude::*;
//!
//! #[derive(Debug, Deserialize)]
//! pub struct Item {
//!     sku: String,
//!     quantity: u32,
//! }
//!
//! #[rest_client(name = "inventory", url = "${inventory.url:localhost:8080}")]
//! pub trait InventoryApi {
//!     #[get("/items/{sku}")]
//!     async fn get_item(&self, sku: &str) -> rest_feign::Result<Item>;
//! }
//!
//! let mut catalog = TypeCatalog::new();
//! catalog.declare::<InventoryApiClient>();
//!
//! let mut container = Container::builder().build()?;
//! container.scan(&catalog, &EnableRestClients::new(module_path!()))?;
//!
//! let inventory = container.get::<InventoryApiClient>("inventory")?;
//! let item = inventory.get_item("A-1").await?;
//! ```
//!
//! Discovery validates every declaration before registering any: only traits may carry
//! `#[rest_client]`, every interceptor must be registered in the [`InterceptorRegistry`].
//! Proxies are built on lookup by the [`ClientProxyFactory`], which resolves `${...}`
//! placeholders in the url and forces `https` or `http` according to `is_secure`.

mod client;
mod config;
mod connector;
mod container;
mod declaration;
mod descriptor;
mod factory;
pub mod interceptors;
mod pipeline;
pub mod prelude;
mod scanner;

pub use client::{BoxedService, HyperClient, HyperClientBuilder, ServiceFuture};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use container::{Container, ContainerBuilder};
pub use declaration::{
    ClientMetadata, DeclarationKind, Declared, ProxyConstructor, RestClient, TypeCatalog,
    TypeDeclaration, construct_proxy,
};
pub use descriptor::ClientDescriptor;
pub use factory::{ClientProxy, ClientProxyFactory, normalize_scheme};
pub use pipeline::{ClientPipeline, encode_path_segment};
pub use scanner::{ClientScanner, DescriptorRegistry, EnableRestClients};

// Re-export tower for transport middleware
pub use tower;

// Re-export core types
pub use rest_feign_core::{
    CallLog, CallLogger, ContentType, Decoder, Encoder, Environment, Error, HttpClient,
    Interceptor, InterceptorRegistry, JsonDecoder, JsonEncoder, LogLevel, Method, Namespace,
    Properties, PropertySource, Request, RequestBuilder, RequestCodec, Response, Result,
    SystemEnvironment, TransportFuture, TypeRef, resolve_placeholders,
};

// Re-export http types for status codes and headers
pub use rest_feign_core::{StatusCode, header};

pub use url;

pub use rest_feign_macro::rest_client;
