use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router, middleware,
    routing::{get, put},
};
use tower_http::trace::TraceLayer;

use dbbroker_core::{DynGateway, ServiceCatalog};
use dbbroker_gateway::ProviderClient;

use crate::{
    config::AppConfig,
    handlers,
    lifecycle::Reconciler,
    middleware::{self as app_middleware, BrokerCredentials, RequestId},
};

/// Shared state of the broker routes.
#[derive(Clone)]
pub struct AppState {
    pub reconciler: Arc<Reconciler>,
}

impl AppState {
    pub fn new(reconciler: Reconciler) -> Self {
        Self {
            reconciler: Arc::new(reconciler),
        }
    }
}

pub struct BrokerServer {
    addr: SocketAddr,
    app: Router,
}

pub fn build_app(state: AppState, cfg: &AppConfig) -> Router {
    let body_limit = cfg.server.body_limit_bytes;
    let credentials = BrokerCredentials::new(&cfg.auth.username, &cfg.auth.password);

    let broker = Router::new()
        .route("/", get(handlers::root))
        .route("/v2/catalog", get(handlers::catalog))
        .route(
            "/v2/service_instances/{instance_id}",
            put(handlers::provision_instance)
                .get(handlers::fetch_instance)
                .patch(handlers::update_instance)
                .delete(handlers::deprovision_instance),
        )
        .route(
            "/v2/service_instances/{instance_id}/last_operation",
            get(handlers::last_operation),
        )
        .route(
            "/v2/service_instances/{instance_id}/service_bindings/{binding_id}",
            get(handlers::fetch_binding).delete(handlers::unbind),
        )
        .route_layer(middleware::from_fn_with_state(
            credentials,
            app_middleware::basic_auth,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(broker)
        .with_state(state)
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    let req_id = req
                        .extensions()
                        .get::<RequestId>()
                        .map(RequestId::as_str)
                        .unwrap_or_default()
                        .to_string();
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        // Outermost, so the trace span already sees the request id.
        .layer(middleware::from_fn(app_middleware::request_id))
}

pub struct ServerBuilder {
    config: AppConfig,
    gateway: Option<DynGateway>,
    catalog: Option<ServiceCatalog>,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            gateway: None,
            catalog: None,
        }
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.config = cfg;
        self
    }

    /// Use this gateway instead of an HTTP client built from the configuration.
    pub fn with_gateway(mut self, gateway: DynGateway) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Use this catalog instead of loading `catalog.path`.
    pub fn with_catalog(mut self, catalog: ServiceCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn build(self) -> anyhow::Result<BrokerServer> {
        let cfg = self.config;

        let catalog = match self.catalog {
            Some(catalog) => catalog.normalized()?,
            None => ServiceCatalog::load(&cfg.catalog.path)
                .with_context(|| format!("loading catalog from {}", cfg.catalog.path))?,
        };
        tracing::info!(services = catalog.services.len(), "service catalog ready");

        let gateway: DynGateway = match self.gateway {
            Some(gateway) => gateway,
            None => {
                let client: DynGateway = Arc::new(
                    ProviderClient::new(cfg.client_config())
                        .context("building provider API client")?,
                );
                tracing::info!(api.url = %cfg.api.url, "provider API client ready");
                client
            }
        };

        let reconciler = Reconciler::new(gateway, Arc::new(catalog), cfg.resolver_defaults());
        let app = build_app(AppState::new(reconciler), &cfg);

        Ok(BrokerServer {
            addr: cfg.addr(),
            app,
        })
    }
}

impl BrokerServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn router(&self) -> Router {
        self.app.clone()
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
