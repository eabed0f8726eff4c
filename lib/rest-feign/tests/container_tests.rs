//! Container behavior: discovery failures, singleton identity, build retries and per-call
//! log isolation. Requests go to an in-process transport.

#![allow(missing_docs)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::time::Duration;

use rest_feign::header::{HeaderMap, HeaderValue};
use rest_feign::prelude::*;
use rest_feign::{PropertySource, TransportFuture};
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::{Layer, Registry};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub sku: String,
    pub quantity: u32,
}

/// Answers `{"sku": <last path segment>, "quantity": 1}`, after a delay taken from the
/// `x-delay-ms` header.
struct StockStub;

impl HttpClient for StockStub {
    fn execute(&self, request: Request) -> TransportFuture {
        Box::pin(async move {
            let delay = request
                .header("x-delay-ms")
                .and_then(|ms| ms.parse().ok())
                .unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(delay)).await;

            let sku = request
                .url()
                .path_segments()
                .and_then(Iterator::last)
                .unwrap_or_default()
                .to_string();
            let body = serde_json::to_vec(&Item { sku, quantity: 1 })?;
            Ok::<_, Error>(Response::new(200, HeaderMap::new(), body))
        })
    }
}

pub struct CountingTenant;

impl Interceptor for CountingTenant {
    fn apply(&self, request: &mut Request) {
        request
            .headers_mut()
            .insert("x-tenant", HeaderValue::from_static("acme"));
    }
}

mod stock {
    use super::*;

    #[rest_client(name = "stock", url = "stock.local", interceptors = [CountingTenant])]
    pub trait StockApi {
        #[get("/items/{sku}")]
        async fn get_item(&self, sku: &str, #[header("x-delay-ms")] delay_ms: u64)
        -> rest_feign::Result<Item>;
    }

    #[rest_client(name = "reports", url = "reports.local", singleton = false, is_secure = true)]
    pub trait ReportsApi {
        #[get("/reports/{id}")]
        async fn report(&self, id: u32) -> rest_feign::Result<Item>;
    }

    pub mod legacy {
        use rest_feign::rest_client;

        #[rest_client(name = "legacy", url = "legacy.local")]
        pub struct LegacyApi;
    }

    #[rest_client(url = "${flaky.url}")]
    pub trait FlakyApi {
        #[get("/ping")]
        async fn ping(&self) -> rest_feign::Result<()>;
    }

    #[rest_client(url = "http://stock.local/${api.prefix}", level = "headers")]
    pub trait PrefixedApi {
        #[get("/items")]
        async fn items(&self) -> rest_feign::Result<Vec<Item>>;
    }
}

use stock::{FlakyApiClient, PrefixedApiClient, ReportsApiClient, StockApi, StockApiClient};

fn counting_container(environment: Environment, builds: Arc<AtomicUsize>) -> Container {
    let mut interceptors = InterceptorRegistry::new();
    interceptors.register_with(move || {
        builds.fetch_add(1, Ordering::SeqCst);
        CountingTenant
    });
    Container::builder()
        .environment(environment)
        .interceptors(interceptors)
        .transport(StockStub)
        .build()
        .expect("container")
}

fn container(environment: Environment) -> Container {
    counting_container(environment, Arc::default())
}

fn catalog() -> TypeCatalog {
    let mut catalog = TypeCatalog::new();
    catalog
        .declare::<StockApiClient>()
        .declare::<ReportsApiClient>();
    catalog
}

fn scanned() -> Container {
    scanned_counting(Arc::default())
}

fn scanned_counting(builds: Arc<AtomicUsize>) -> Container {
    let mut container = counting_container(Environment::empty(), builds);
    container
        .scan(&catalog(), &EnableRestClients::new("unused").client::<StockApiClient>())
        .expect("scan");
    container
}

#[test]
fn singleton_is_built_once_under_concurrent_lookups() {
    let builds = Arc::new(AtomicUsize::new(0));
    let container = scanned_counting(Arc::clone(&builds));

    let barrier = Barrier::new(8);
    let proxies: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    container.get::<StockApiClient>("stock").expect("client")
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("thread"))
            .collect()
    });

    assert!(proxies.windows(2).all(|pair| match pair {
        [a, b] => Arc::ptr_eq(a, b),
        _ => true,
    }));
    // one build resolves the single interceptor once
    assert_eq!(builds.load(Ordering::SeqCst), 1);

    let again = container.proxy("stock").expect("proxy");
    assert!(again.same_instance(&container.proxy("stock").expect("proxy")));
}

#[test]
fn non_singleton_builds_per_lookup() {
    let container = scanned();

    let first = container.get::<ReportsApiClient>("reports").expect("client");
    let second = container.get::<ReportsApiClient>("reports").expect("client");
    assert!(!Arc::ptr_eq(&first, &second));

    let proxy = container.proxy("reports").expect("proxy");
    assert_eq!(proxy.resolved_url(), "https://reports.local");
    assert_eq!(first.pipeline().base_url().as_str(), "https://reports.local/");
}

#[test]
fn non_trait_declaration_aborts_discovery() {
    let mut catalog = catalog();
    catalog.declare::<stock::legacy::LegacyApi>();

    let mut container = container(Environment::empty());
    let err = container
        .scan(&catalog, &EnableRestClients::new("container_tests::stock"))
        .expect_err("struct declaration");

    assert!(err.is_configuration());
    assert!(err.to_string().contains("can only be specified on a trait"));
    assert!(container.names().is_empty());
}

#[test]
fn unknown_interceptor_aborts_discovery() {
    let mut container = Container::builder()
        .environment(Environment::empty())
        .transport(StockStub)
        .build()
        .expect("container");

    let err = container
        .scan(&catalog(), &EnableRestClients::new("container_tests"))
        .expect_err("unregistered interceptor");

    assert!(err.to_string().contains("CountingTenant"));
    assert!(container.names().is_empty());
}

#[test]
fn scan_namespaces_limit_discovery() {
    let mut catalog = catalog();
    catalog.declare::<stock::legacy::LegacyApi>();

    let mut container = container(Environment::empty());
    let names = container
        .scan(
            &catalog,
            &EnableRestClients::new("container_tests::stock::legacy").scan("nowhere"),
        )
        .expect("scan");
    assert!(names.is_empty());
}

struct Flaky {
    first: AtomicBool,
}

impl PropertySource for Flaky {
    fn get(&self, key: &str) -> Option<String> {
        (key == "flaky.url").then(|| {
            if self.first.swap(false, Ordering::SeqCst) {
                "flaky.local:port".to_string()
            } else {
                "flaky.local:8080".to_string()
            }
        })
    }
}

#[test]
fn failed_singleton_build_is_retried() {
    let environment = Environment::empty().with_source(Flaky {
        first: AtomicBool::new(true),
    });
    let mut container = container(environment);
    let mut catalog = TypeCatalog::new();
    catalog.declare::<FlakyApiClient>();
    container
        .scan(&catalog, &EnableRestClients::new("container_tests"))
        .expect("scan");

    let err = container
        .get::<FlakyApiClient>("container_tests::stock::FlakyApi")
        .expect_err("invalid port");
    assert!(matches!(err, Error::InvalidUrl(_)));

    let flaky = container
        .get_by_type::<FlakyApiClient>()
        .expect("second build");
    assert_eq!(flaky.pipeline().base_url().as_str(), "http://flaky.local:8080/");
}

#[test]
fn unresolved_placeholders_stay_verbatim() {
    let mut container = container(Environment::empty());
    let mut catalog = TypeCatalog::new();
    catalog.declare::<PrefixedApiClient>();
    container
        .scan(&catalog, &EnableRestClients::new("container_tests"))
        .expect("scan");

    let proxy = container
        .proxy("container_tests::stock::PrefixedApi")
        .expect("proxy");
    assert_eq!(proxy.resolved_url(), "http://stock.local/${api.prefix}");
}

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<(String, String)>>>);

impl Captured {
    fn entries(&self) -> Vec<(String, String)> {
        self.0
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

struct MessageVisitor<'a>(&'a mut String);

impl Visit for MessageVisitor<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.0 = format!("{value:?}");
        }
    }
}

impl<S: tracing::Subscriber> Layer<S> for Captured {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut message = String::new();
        event.record(&mut MessageVisitor(&mut message));
        self.0
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push((event.metadata().target().to_string(), message));
    }
}

#[tokio::test]
async fn concurrent_calls_log_separately() {
    let captured = Captured::default();
    let _guard = tracing::subscriber::set_default(Registry::default().with(captured.clone()));

    let container = scanned();
    let client = container.get::<StockApiClient>("stock").expect("client");

    let (slow, fast) = tokio::join!(client.get_item("A-1", 40), client.get_item("B-2", 5));
    assert_eq!(slow.expect("slow").sku, "A-1");
    assert_eq!(fast.expect("fast").sku, "B-2");

    let calls: Vec<_> = captured
        .entries()
        .into_iter()
        .filter(|(target, _)| target == "rest_feign_core::logger")
        .map(|(_, message)| message)
        .collect();
    assert_eq!(calls.len(), 2);

    // the fast call completes first
    let [fast_entry, slow_entry] = calls.as_slice() else {
        panic!("expected two entries, got {calls:?}");
    };
    assert!(fast_entry.contains("---> GET http://stock.local/items/B-2 HTTP/1.1"));
    assert!(fast_entry.contains("x-tenant: acme"));
    assert!(!fast_entry.contains("A-1"));
    assert!(slow_entry.contains("<--- HTTP/1.1 200 OK"));
    assert!(slow_entry.contains(r#"{"sku":"A-1","quantity":1}"#));
    assert!(!slow_entry.contains("B-2"));
    assert!(
        slow_entry
            .lines()
            .filter(|line| !line.is_empty())
            .all(|line| line.starts_with("[StockApi#get_item]"))
    );
}

#[test]
fn replacing_a_registration_warns() {
    let captured = Captured::default();
    let _guard = tracing::subscriber::set_default(Registry::default().with(captured.clone()));

    let mut container = scanned();
    let names = container
        .scan(&catalog(), &EnableRestClients::new("container_tests::stock"))
        .expect("second scan");

    assert_eq!(names.len(), 2);
    assert_eq!(container.names(), ["reports", "stock"]);
    assert!(
        captured
            .entries()
            .iter()
            .any(|(_, message)| message == "rest client registration replaced")
    );
}

#[test]
fn fn_local_clients_register_under_the_enclosing_module() {
    #[rest_client(url = "inner.local")]
    pub trait InnerApi {
        #[get("/ping")]
        async fn ping(&self) -> rest_feign::Result<()>;
    }

    let mut catalog = TypeCatalog::new();
    catalog.declare::<InnerApiClient>();

    let mut container = container(Environment::empty());
    let names = container
        .scan(&catalog, &EnableRestClients::new("container_tests"))
        .expect("scan");

    assert_eq!(names, ["container_tests::InnerApi"]);
    assert!(container.get::<InnerApiClient>("container_tests::InnerApi").is_ok());
}
