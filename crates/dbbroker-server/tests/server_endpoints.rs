mod common;

use std::io::Write;

use dbbroker_core::{DynGateway, ServiceCatalog};
use dbbroker_server::{AppConfig, ServerBuilder};
use serde_json::Value;
use tokio::task::JoinHandle;

use common::{CATALOG, FakeGateway};

async fn start_server(
    catalog_path: &str,
) -> (String, tokio::sync::oneshot::Sender<()>, JoinHandle<()>) {
    let mut cfg = AppConfig::default();
    cfg.auth.username = "broker".into();
    cfg.auth.password = "secret".into();
    cfg.api.token = "deadbeef".into();
    cfg.catalog.path = catalog_path.to_string();

    let gateway: DynGateway = FakeGateway::new();
    let app = ServerBuilder::new()
        .with_config(cfg)
        .with_gateway(gateway)
        .build()
        .expect("build server")
        .router();

    // Bind to an ephemeral port
    let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let server = tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = rx.await;
            })
            .await;
    });

    (format!("http://{addr}"), tx, server)
}

#[tokio::test]
async fn server_endpoints_work() {
    let mut catalog = tempfile::NamedTempFile::new().expect("catalog file");
    catalog.write_all(CATALOG.as_bytes()).expect("write catalog");
    let (base, shutdown_tx, handle) = start_server(catalog.path().to_str().unwrap()).await;
    let client = reqwest::Client::new();

    // GET /health
    let resp = client.get(format!("{base}/health")).send().await.unwrap();
    assert!(resp.status().is_success());
    assert_eq!(resp.headers().get("x-broker").unwrap(), "dbbroker");
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    // GET /v2/catalog without credentials
    let resp = client.get(format!("{base}/v2/catalog")).send().await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);

    // GET /v2/catalog
    let resp = client
        .get(format!("{base}/v2/catalog"))
        .basic_auth("broker", Some("secret"))
        .header("X-Broker-API-Version", "2.13")
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["services"].as_array().unwrap().len(), 2);

    // Unknown instance
    let resp = client
        .get(format!("{base}/v2/service_instances/ghost"))
        .basic_auth("broker", Some("secret"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "MissingServiceInstance");

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[test]
fn build_fails_on_missing_catalog() {
    let mut cfg = AppConfig::default();
    cfg.catalog.path = "/nonexistent/catalog.yml".into();
    let gateway: DynGateway = FakeGateway::new();
    let err = ServerBuilder::new()
        .with_config(cfg)
        .with_gateway(gateway)
        .build()
        .err()
        .expect("missing catalog must fail");
    assert!(format!("{err:#}").contains("/nonexistent/catalog.yml"));
}

#[test]
fn injected_catalog_skips_catalog_file() {
    let mut cfg = AppConfig::default();
    cfg.auth.username = "broker".into();
    cfg.auth.password = "secret".into();
    cfg.catalog.path = "/nonexistent/catalog.yml".into();
    let catalog = ServiceCatalog::from_yaml_str(CATALOG).expect("catalog");
    let gateway: DynGateway = FakeGateway::new();

    let server = ServerBuilder::new()
        .with_config(cfg)
        .with_gateway(gateway)
        .with_catalog(catalog)
        .build()
        .expect("build with injected catalog");
    assert_eq!(server.addr().port(), 8080);
}
