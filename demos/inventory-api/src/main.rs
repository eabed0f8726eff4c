//! Inventory API demo
//!
//! Declares a rest client, discovers it from a catalog and calls it through the container.
//! The service location comes from `INVENTORY_URL` (defaults to `localhost:8080`), the log
//! filter from `RUST_LOG`.

#![allow(missing_docs)]
#![allow(clippy::print_stdout)]

use std::sync::Arc;

use rest_feign::interceptors::BearerAuthInterceptor;
use rest_feign::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub sku: String,
    pub name: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Restock {
    pub quantity: u32,
}

/// Warehouse inventory service.
#[rest_client(
    name = "inventory",
    url = "${inventory.url:localhost:8080}/api",
    level = "full",
    interceptors = [BearerAuthInterceptor]
)]
pub trait InventoryApi {
    #[get("/items")]
    async fn items(&self, #[query] limit: Option<u32>) -> rest_feign::Result<Vec<Item>>;

    #[get("/items/{sku}")]
    async fn item(&self, sku: &str) -> rest_feign::Result<Item>;

    #[post("/items/{sku}/restock")]
    async fn restock(&self, sku: &str, order: &Restock) -> rest_feign::Result<Item>;
}

fn catalog() -> TypeCatalog {
    let mut catalog = TypeCatalog::new();
    catalog.declare::<InventoryApiClient>();
    catalog
}

fn container(environment: Environment) -> rest_feign::Result<Container> {
    let token =
        BearerAuthInterceptor::new(environment.resolve_placeholders("${inventory.token:demo}"))?;
    let mut interceptors = InterceptorRegistry::new();
    interceptors.register_instance(Arc::new(token));

    let mut container = Container::builder()
        .environment(environment)
        .interceptors(interceptors)
        .build()?;
    container.scan(&catalog(), &EnableRestClients::new(module_path!()))?;
    Ok(container)
}

#[tokio::main]
async fn main() -> rest_feign::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let container = container(Environment::system())?;
    println!("registered clients: {:?}", container.names());

    let inventory = container.get::<InventoryApiClient>("inventory")?;
    println!("base url: {}", inventory.pipeline().base_url());

    match inventory.items(Some(10)).await {
        Ok(items) => {
            for item in items {
                println!("{:>8} {:<24} {}", item.sku, item.name, item.quantity);
            }
        }
        Err(err) if err.is_transport() => println!("inventory service unreachable: {err}"),
        Err(err) => return Err(err),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json_string, header, method, path, query_param},
    };

    async fn inventory(server: &MockServer) -> Arc<InventoryApiClient> {
        let environment = Environment::empty().with_source(
            Properties::new()
                .with("inventory.url", server.uri())
                .with("inventory.token", "s3cr3t"),
        );
        container(environment)
            .expect("container")
            .get::<InventoryApiClient>("inventory")
            .expect("client")
    }

    fn bolt(quantity: u32) -> Item {
        Item {
            sku: "B-7".to_string(),
            name: "bolt".to_string(),
            quantity,
        }
    }

    #[tokio::test]
    async fn lists_items_with_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/items"))
            .and(query_param("limit", "10"))
            .and(header("authorization", "Bearer s3cr3t"))
            .respond_with(ResponseTemplate::new(200).set_body_json(vec![bolt(3)]))
            .expect(1)
            .mount(&server)
            .await;

        let items = inventory(&server).await.items(Some(10)).await.expect("items");
        assert_eq!(items, vec![bolt(3)]);
    }

    #[tokio::test]
    async fn restocks_item() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/items/B-7/restock"))
            .and(body_json_string(r#"{"quantity":5}"#))
            .respond_with(ResponseTemplate::new(200).set_body_json(bolt(8)))
            .expect(1)
            .mount(&server)
            .await;

        let item = inventory(&server)
            .await
            .restock("B-7", &Restock { quantity: 5 })
            .await
            .expect("restock");
        assert_eq!(item.quantity, 8);
    }

    #[tokio::test]
    async fn missing_item_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/items/none"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = inventory(&server).await.item("none").await.expect_err("404");
        assert!(err.is_not_found());
    }
}
