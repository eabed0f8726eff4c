//! End-to-end tests: `#[rest_client]` declarations scanned into a container and called
//! against a mock server.

#![allow(missing_docs)]

use std::sync::Arc;

use rest_feign::header::HeaderValue;
use rest_feign::interceptors::{BearerAuthInterceptor, StaticHeadersInterceptor};
use rest_feign::prelude::*;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path, query_param},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Item {
    sku: String,
    quantity: u32,
}

#[derive(Debug, Serialize)]
struct NewItem<'a> {
    sku: &'a str,
    quantity: u32,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: String,
}

#[derive(Default)]
struct TenantHeader;

impl Interceptor for TenantHeader {
    fn apply(&self, request: &mut Request) {
        request
            .headers_mut()
            .insert("x-tenant", HeaderValue::from_static("acme"));
    }
}

#[derive(Default)]
struct Stamp;

impl Interceptor for Stamp {
    fn apply(&self, request: &mut Request) {
        // sees the header set by the interceptor declared before it
        let seen = request.header("x-tenant").unwrap_or("none").to_string();
        if let Ok(value) = HeaderValue::from_str(&format!("after-{seen}")) {
            request.headers_mut().insert("x-stamp", value);
        }
    }
}

/// Stock service used by the warehouse.
#[rest_client(
    name = "inventory",
    url = "${inventory.url}",
    level = "basic",
    interceptors = [TenantHeader, Stamp]
)]
pub trait InventoryApi {
    /// Fetch one item.
    #[get("/items/{sku}")]
    async fn get_item(&self, sku: &str) -> rest_feign::Result<Item>;

    #[get("/items")]
    async fn list_items(
        &self,
        #[query] page: Option<u32>,
        #[query(format = "csv")] tags: Vec<String>,
    ) -> rest_feign::Result<Vec<Item>>;

    #[post("/items")]
    async fn create_item(&self, item: &NewItem<'_>) -> rest_feign::Result<Item>;

    #[put("/warehouses/{warehouse}/items/{sku}")]
    async fn restock(
        &self,
        #[path("warehouse")] warehouse_id: u32,
        sku: &str,
        #[header("X-Request-Id")] request_id: &str,
        #[body] item: &NewItem<'_>,
    ) -> rest_feign::Result<Item>;

    #[delete("/items/{sku}")]
    async fn delete_item(&self, sku: &str) -> rest_feign::Result<()>;

    #[http("HEAD /items/{sku}")]
    async fn probe(&self, sku: &str) -> rest_feign::Result<Response>;
}

#[rest_client(value = "billing", url = "${billing.host}/api", level = "none")]
pub trait BillingApi {
    #[get("/invoices/{id}")]
    async fn invoice_total(&self, id: u64) -> rest_feign::Result<u64>;
}

fn catalog() -> TypeCatalog {
    let mut catalog = TypeCatalog::new();
    catalog
        .declare::<InventoryApiClient>()
        .declare::<BillingApiClient>();
    catalog
}

fn container(server: &MockServer) -> Container {
    let mut interceptors = InterceptorRegistry::new();
    interceptors.register::<TenantHeader>().register::<Stamp>();

    let address = server.address().to_string();
    let environment = Environment::empty().with_source(
        Properties::new()
            .with("inventory.url", server.uri())
            .with("billing.host", address),
    );

    let mut container = Container::builder()
        .environment(environment)
        .interceptors(interceptors)
        .build()
        .expect("container");
    container
        .scan(&catalog(), &EnableRestClients::new(module_path!()))
        .expect("scan");
    container
}

fn item(sku: &str, quantity: u32) -> Item {
    Item {
        sku: sku.to_string(),
        quantity,
    }
}

#[tokio::test]
async fn registers_declared_clients() {
    let server = MockServer::start().await;
    let container = container(&server);

    assert_eq!(container.names(), ["billing", "inventory"]);

    let descriptor = container.descriptor("inventory").expect("descriptor");
    assert_eq!(descriptor.target().name(), "client_tests::InventoryApi");
    assert_eq!(descriptor.log_level(), LogLevel::Basic);
    assert_eq!(descriptor.interceptors().len(), 2);
    assert!(descriptor.is_singleton());
}

#[tokio::test]
async fn get_with_path_and_interceptors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items/A%201"))
        .and(header("Accept", "application/json"))
        .and(header("x-tenant", "acme"))
        .and(header("x-stamp", "after-acme"))
        .respond_with(ResponseTemplate::new(200).set_body_json(item("A 1", 3)))
        .expect(1)
        .mount(&server)
        .await;

    let inventory = container(&server)
        .get::<InventoryApiClient>("inventory")
        .expect("client");

    let found = inventory.get_item("A 1").await.expect("item");
    assert_eq!(found, item("A 1", 3));
}

#[tokio::test]
async fn query_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param("page", "2"))
        .and(query_param("tags", "bolt,nut"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![item("B-7", 1)]))
        .mount(&server)
        .await;

    let inventory = container(&server)
        .get_by_type::<InventoryApiClient>()
        .expect("client");

    let items = inventory
        .list_items(Some(2), vec!["bolt".to_string(), "nut".to_string()])
        .await
        .expect("items");
    assert_eq!(items, vec![item("B-7", 1)]);
}

#[tokio::test]
async fn bodies_and_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/items"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(serde_json::json!({"sku": "C-3", "quantity": 5})))
        .respond_with(ResponseTemplate::new(201).set_body_json(item("C-3", 5)))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/warehouses/12/items/C-3"))
        .and(header("X-Request-Id", "req-1"))
        .and(body_json(serde_json::json!({"sku": "C-3", "quantity": 9})))
        .respond_with(ResponseTemplate::new(200).set_body_json(item("C-3", 14)))
        .mount(&server)
        .await;

    let inventory = container(&server)
        .get::<InventoryApiClient>("inventory")
        .expect("client");

    let created = inventory
        .create_item(&NewItem {
            sku: "C-3",
            quantity: 5,
        })
        .await
        .expect("created");
    assert_eq!(created, item("C-3", 5));

    let restocked = inventory
        .restock(
            12,
            "C-3",
            "req-1",
            &NewItem {
                sku: "C-3",
                quantity: 9,
            },
        )
        .await
        .expect("restocked");
    assert_eq!(restocked.quantity, 14);
}

#[tokio::test]
async fn unit_and_raw_responses() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/items/D-4"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/items/D-4"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let inventory = container(&server)
        .get::<InventoryApiClient>("inventory")
        .expect("client");

    inventory.delete_item("D-4").await.expect("deleted");

    let response = inventory.probe("D-4").await.expect("raw response");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn error_statuses_and_decode_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(serde_json::json!({"error": "unknown sku"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/items/broken"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"sku": "broken", "quantity": "many"})),
        )
        .mount(&server)
        .await;

    let inventory = container(&server)
        .get::<InventoryApiClient>("inventory")
        .expect("client");

    let err = inventory.get_item("missing").await.expect_err("not found");
    assert!(err.is_not_found());
    let body: ApiError = err.decode_body().expect("body").expect("json");
    assert_eq!(body.error, "unknown sku");

    let err = inventory.get_item("broken").await.expect_err("decode");
    assert!(matches!(err, Error::Decode { ref path, .. } if path == "quantity"));
}

#[tokio::test]
async fn resolves_url_without_scheme_and_keeps_base_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/invoices/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(120))
        .mount(&server)
        .await;

    let container = container(&server);
    let proxy = container.proxy("billing").expect("proxy");
    assert_eq!(
        proxy.resolved_url(),
        format!("http://{}/api", server.address())
    );

    let billing = container
        .get::<BillingApiClient>("billing")
        .expect("client");
    assert_eq!(billing.invoice_total(7).await.expect("total"), 120);
}

#[tokio::test]
async fn lookup_errors() {
    let server = MockServer::start().await;
    let container = container(&server);

    let err = container
        .get::<InventoryApiClient>("warehouse")
        .expect_err("unknown name");
    assert!(err.is_configuration());

    let err = container
        .get::<BillingApiClient>("inventory")
        .expect_err("wrong type");
    assert!(err.to_string().contains("client_tests::InventoryApi"));
}

#[tokio::test]
async fn built_in_interceptors() {
    #[rest_client(
        url = "${audit.url}",
        interceptors = [BearerAuthInterceptor, StaticHeadersInterceptor]
    )]
    pub trait AuditApi {
        #[post("/events")]
        async fn record(&self, event: &serde_json::Value) -> rest_feign::Result<()>;
    }

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/events"))
        .and(header("Authorization", "Bearer t0k3n"))
        .and(header("X-Source", "tests"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let mut interceptors = InterceptorRegistry::new();
    interceptors
        .register_instance(Arc::new(
            BearerAuthInterceptor::new("t0k3n").expect("bearer"),
        ))
        .register_instance(Arc::new(
            StaticHeadersInterceptor::new()
                .with("X-Source", "tests")
                .expect("headers"),
        ));

    let mut catalog = TypeCatalog::new();
    catalog.declare::<AuditApiClient>();

    let environment =
        Environment::empty().with_source(Properties::new().with("audit.url", server.uri()));
    let mut container = Container::builder()
        .environment(environment)
        .interceptors(interceptors)
        .build()
        .expect("container");
    let names = container
        .scan(&catalog, &EnableRestClients::new(module_path!()))
        .expect("scan");
    assert_eq!(names, ["client_tests::AuditApi"]);

    let audit = container.get_by_type::<AuditApiClient>().expect("client");
    audit
        .record(&serde_json::json!({"kind": "restock"}))
        .await
        .expect("recorded");
}
