//! Procedural macros for the rest-feign declarative HTTP client.
//!
//! `#[rest_client]` turns an annotated trait into a typed proxy:
//! - a clean trait (without rest-feign attributes)
//! - a proxy struct implementing the trait (e.g. `InventoryApiClient`)
//! - a `Declared` implementation carrying the client metadata, so the scanner can find it
//!
//! Methods are marked with `#[get]`, `#[post]`, `#[put]`, `#[delete]`, `#[patch]`, `#[head]`,
//! `#[options]` or `#[http("VERB /path")]`. Parameters take `#[path]`, `#[query]`, `#[header]`
//! or `#[body]`; these markers are consumed by `#[rest_client]` and are not macros themselves.
//!
//! # Example
//!
//! ```ignore
//! use rest_feign::prelude::*;
//!
//! #[rest_client(name = "inventory", url = "${inventory.url}")]
//! pub trait InventoryApi {
//!     #[get("/items/{sku}")]
//!     async fn get_item(&self, sku: &str) -> rest_feign::Result<Item>;
//! }
//! ```

mod attrs;
mod codegen;
mod expand;

use proc_macro::TokenStream;

/// Declare a REST client.
///
/// # Attributes
///
/// - `name`: registration name (preferred)
/// - `value`: fallback registration name when `name` is blank
/// - `url`: base URL, may contain `${key}` or `${key:default}` placeholders
/// - `is_secure`: force `https` when `url` has no scheme (default `false`)
/// - `singleton`: share one proxy per container (default `true`)
/// - `level`: `NONE`, `BASIC`, `HEADERS` or `FULL` (default)
/// - `interceptors = [A, B]`: interceptor types applied in order
///
/// On a struct or an enum the item is kept as is and only declares client metadata; client
/// scanning rejects such declarations.
///
/// # Example
///
/// ```ignore
/// #[rest_client(url = "https://stock.example.com", interceptors = [TenantHeader])]
/// pub trait StockApi {
///     #[post("/items")]
///     async fn create(&self, item: &NewItem) -> rest_feign::Result<Item>;
///
///     #[delete("/items/{sku}")]
///     async fn delete(&self, sku: &str) -> rest_feign::Result<()>;
/// }
/// ```
#[proc_macro_attribute]
pub fn rest_client(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand::expand_rest_client(attr.into(), item.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
