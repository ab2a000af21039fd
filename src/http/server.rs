//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with one route per configured operation
//! - Wire up middleware (tracing, body limit, per-operation timeout, request ID)
//! - Bind server to listener (plain or TLS)
//! - Rebuild and swap routes and gateway state together on config reload

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    body::{Body, Bytes},
    extract::{DefaultBodyLimit, Path, RawQuery, State},
    http::{HeaderMap, HeaderName, Request},
    routing::{get, on, MethodFilter, MethodRouter},
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::{service_fn, ServiceBuilder, ServiceExt};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::schema::TlsConfig;
use crate::config::{validate_config, ConfigError, GatewayConfig};
use crate::error::StartupError;
use crate::http::handler;
use crate::http::request::{allowed_header_names, MakeRequestUuidV4};
use crate::routing::{EndpointResolver, OperationDescriptor};
use crate::upstream::UpstreamClient;

/// Extra time the server grants a request beyond the backend timeout.
const SERVER_TIMEOUT_GRACE: Duration = Duration::from_secs(5);

/// Everything a request needs, compiled from one config.
pub struct GatewayState {
    pub config: GatewayConfig,
    pub resolver: EndpointResolver,
    pub upstream: UpstreamClient,
    pub allowed_headers: Vec<HeaderName>,
}

impl GatewayState {
    pub fn from_config(config: GatewayConfig) -> Result<Self, StartupError> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let resolver = EndpointResolver::from_config(&config)?;
        let upstream = UpstreamClient::new(&config.backend)?;
        let allowed_headers = allowed_header_names(&config.forwarding.allowed_headers);

        Ok(Self {
            config,
            resolver,
            upstream,
            allowed_headers,
        })
    }
}

/// Shared handle on the live gateway.
///
/// Each compiled [`GatewayState`] gets its own router (routes, methods,
/// limits and timeouts), and both are replaced together on reload.
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<ArcSwap<GatewayState>>,
    routes: Arc<ArcSwap<Router>>,
}

impl AppState {
    pub fn new(state: GatewayState) -> Self {
        let state = Arc::new(state);
        let routes = build_router(state.clone());
        Self {
            inner: Arc::new(ArcSwap::new(state)),
            routes: Arc::new(ArcSwap::from_pointee(routes)),
        }
    }

    /// Compile `config` and make it live.
    ///
    /// On error nothing changes. Requests already dispatched finish on the
    /// routes and state they started with.
    pub fn reload(&self, config: GatewayConfig) -> Result<(), StartupError> {
        let next = Arc::new(GatewayState::from_config(config)?);
        let routes = build_router(next.clone());
        self.routes.store(Arc::new(routes));
        self.inner.store(next);
        Ok(())
    }

    /// Router that hands every request to the routes live at arrival.
    fn dispatcher(&self) -> Router {
        let routes = self.routes.clone();
        Router::new().fallback_service(service_fn(move |request: Request<Body>| {
            let current: Router = (**routes.load()).clone();
            current.oneshot(request)
        }))
    }
}

/// HTTP server for the admin gateway.
pub struct GatewayServer {
    state: AppState,
}

impl GatewayServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, StartupError> {
        let gateway = GatewayState::from_config(config)?;

        if gateway.resolver.base_url().is_none() {
            tracing::warn!(
                "backend.base_url is not configured; every proxied operation will fail"
            );
        }

        Ok(Self {
            state: AppState::new(gateway),
        })
    }

    /// The fully layered router, for serving or in-process tests.
    pub fn router(&self) -> Router {
        self.state.dispatcher()
    }

    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let reload = tokio::spawn(reload_loop(
            self.state.clone(),
            config_updates,
            shutdown.resubscribe(),
        ));

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reload.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run the server over TLS.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: &TlsConfig,
        config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let rustls = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path).await?;
        tracing::info!(address = %addr, "HTTPS server starting");

        let reload = tokio::spawn(reload_loop(
            self.state.clone(),
            config_updates,
            shutdown.resubscribe(),
        ));

        let handle = axum_server::Handle::new();
        let shutdown_handle = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            tracing::info!("Shutdown signal received");
            shutdown_handle.graceful_shutdown(Some(Duration::from_secs(10)));
        });

        axum_server::bind_rustls(addr, rustls)
            .handle(handle)
            .serve(self.router().into_make_service())
            .await?;

        reload.abort();
        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}

/// Build the Axum router for one compiled state, with all middleware layers.
fn build_router(gateway: Arc<GatewayState>) -> Router {
    let mut by_route: BTreeMap<String, MethodRouter<Arc<GatewayState>>> = BTreeMap::new();
    let default_timeout = Duration::from_secs(gateway.config.backend.request_timeout_secs);

    for op in gateway.resolver.operations() {
        let Ok(filter) = MethodFilter::try_from(op.inbound_method.clone()) else {
            tracing::warn!(operation = %op.name, method = %op.inbound_method, "Skipping operation with unroutable method");
            continue;
        };
        let method_router = operation_route(filter, op, default_timeout);
        let merged = match by_route.remove(op.route.as_str()) {
            Some(existing) => existing.merge(method_router),
            None => method_router,
        };
        by_route.insert(op.route.as_str().to_string(), merged);

        tracing::debug!(
            operation = %op.name,
            route = %op.route,
            inbound = %op.inbound_method,
            outbound = %op.outbound_method,
            backend_path = %op.backend_path,
            "Registered operation"
        );
    }

    let router = by_route
        .into_iter()
        .fold(Router::new(), |router, (path, method_router)| {
            router.route(&path, method_router)
        });

    router
        .route("/healthz", get(|| async { "ok" }))
        .layer(DefaultBodyLimit::max(gateway.config.limits.max_body_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .with_state(gateway)
}

/// Route for a single operation on its inbound method.
///
/// The server deadline spans receiving the body and the backend call, and
/// outlasts the backend timeout so that one surfaces as a transport error.
#[allow(deprecated)]
fn operation_route(
    filter: MethodFilter,
    op: &OperationDescriptor,
    default_timeout: Duration,
) -> MethodRouter<Arc<GatewayState>> {
    let name: Arc<str> = Arc::from(op.name.as_str());
    let deadline = op.timeout.unwrap_or(default_timeout) + SERVER_TIMEOUT_GRACE;

    let method_router = if op.route.has_parameters() {
        on(
            filter,
            move |State(state): State<Arc<GatewayState>>,
                  Path(params): Path<HashMap<String, String>>,
                  RawQuery(query): RawQuery,
                  headers: HeaderMap,
                  body: Bytes| {
                let name = name.clone();
                async move { handler::proxy(state, name, params, query, headers, body).await }
            },
        )
    } else {
        on(
            filter,
            move |State(state): State<Arc<GatewayState>>,
                  RawQuery(query): RawQuery,
                  headers: HeaderMap,
                  body: Bytes| {
                let name = name.clone();
                async move {
                    handler::proxy(state, name, HashMap::new(), query, headers, body).await
                }
            },
        )
    };

    method_router.layer(TimeoutLayer::new(deadline))
}

/// Apply config updates until shutdown.
///
/// A config that fails to compile is logged and the current one stays live.
async fn reload_loop(
    state: AppState,
    mut updates: mpsc::UnboundedReceiver<GatewayConfig>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            Some(config) = updates.recv() => {
                let operations = config.operations.len();
                match state.reload(config) {
                    Ok(()) => tracing::info!(operations, "Configuration reloaded"),
                    Err(e) => {
                        tracing::error!(error = %e, "Rejected config reload, keeping current configuration");
                    }
                }
            }
            _ = shutdown.recv() => break,
        }
    }
}
