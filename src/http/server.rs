//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the two relay routes under the mount path
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Bind server to listener (plain or TLS)
//! - Swap the relay context when a new configuration arrives
//! - Record per-relay metrics

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::{Request, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::RelayConfig;
use crate::http::request::{
    mark_generated_request_id, propagate_request_id_layer, set_request_id_layer, RequestIdExt,
};
use crate::observability::metrics;
use crate::relay::{relay_event, relay_static, RelayContext, RelayError};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<ArcSwap<RelayContext>>,
}

/// HTTP server for the analytics relay.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: RelayConfig) -> Result<Self, RelayError> {
        let context = RelayContext::from_config(&config)?;
        let state = AppState {
            inner: Arc::new(ArcSwap::from_pointee(context)),
        };

        let router = Self::build_router(&config, state.clone());
        Ok(Self {
            router,
            config,
            state,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RelayConfig, state: AppState) -> Router {
        // The static route is registered alongside the wildcard and wins for
        // every `static/<something>` suffix.
        let relay_routes = Router::new()
            .route("/static/{*path}", any(static_handler))
            .route("/{*path}", any(event_handler))
            .route("/", any(event_handler));

        let mount_path = config.relay.mount_path.as_str();
        let app = if mount_path == "/" {
            relay_routes
        } else {
            // A nested `/` only matches the bare mount; `<mount>/` is the
            // same empty suffix.
            Router::new()
                .nest(mount_path, relay_routes)
                .route(&format!("{mount_path}/"), any(mount_root_handler))
        };

        app.with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http())
                    .layer(propagate_request_id_layer())
                    .layer(RequestBodyLimitLayer::new(config.relay.max_body_size))
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
            // Outermost: must see the request before an ID is assigned
            .layer(middleware::map_request(mark_generated_request_id))
    }

    /// A clone of the fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<RelayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            mount_path = %self.config.relay.mount_path,
            "HTTP server starting"
        );

        tokio::spawn(apply_config_updates(
            self.state.clone(),
            self.config.clone(),
            config_updates,
        ));

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run the server with TLS termination on `addr`.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        config_updates: mpsc::UnboundedReceiver<RelayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        tracing::info!(
            address = %addr,
            mount_path = %self.config.relay.mount_path,
            "HTTPS server starting"
        );

        tokio::spawn(apply_config_updates(
            self.state.clone(),
            self.config.clone(),
            config_updates,
        ));

        let handle = axum_server::Handle::new();
        let shutdown_handle = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            tracing::info!("Shutdown signal received");
            shutdown_handle.graceful_shutdown(Some(Duration::from_secs(10)));
        });

        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }
}

/// Swap in a fresh relay context for every accepted configuration.
///
/// Routing and middleware are fixed at startup; only origins and client
/// settings take effect on reload.
async fn apply_config_updates(
    state: AppState,
    current: RelayConfig,
    mut updates: mpsc::UnboundedReceiver<RelayConfig>,
) {
    while let Some(config) = updates.recv().await {
        if config.relay.mount_path != current.relay.mount_path
            || config.listener.bind_address != current.listener.bind_address
        {
            tracing::warn!("Mount path and listener changes require a restart; ignoring them");
        }

        match RelayContext::from_config(&config) {
            Ok(context) => {
                state.inner.store(Arc::new(context));
                tracing::info!(
                    asset_origin = %config.relay.asset_origin,
                    event_origin = %config.relay.event_origin,
                    "Relay configuration reloaded"
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "Rejected relay configuration, keeping current context");
            }
        }
    }
}

async fn static_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let request_id = request.request_id().to_string();
    let context = state.inner.load_full();

    let result = relay_static(&context, request).await;
    finish("static", &request_id, result, start)
}

async fn mount_root_handler(state: State<AppState>, mut request: Request<Body>) -> Response {
    *request.uri_mut() = mount_root_uri(request.uri());
    event_handler(state, request).await
}

/// `/` plus the original query, as a nested handler would see the bare mount.
fn mount_root_uri(uri: &Uri) -> Uri {
    let path_and_query = match uri.query() {
        Some(query) => format!("/?{query}"),
        None => "/".to_string(),
    };
    path_and_query
        .parse()
        .unwrap_or_else(|_| Uri::from_static("/"))
}

async fn event_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let request_id = request.request_id().to_string();
    let context = state.inner.load_full();

    let result = relay_event(&context, request).await;
    finish("event", &request_id, result, start)
}

fn finish(
    relay: &'static str,
    request_id: &str,
    result: Result<Response, RelayError>,
    start: Instant,
) -> Response {
    let response = match result {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(request_id = %request_id, relay, error = %e, "Relay failed");
            e.into_response()
        }
    };

    tracing::debug!(
        request_id = %request_id,
        relay,
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Relay completed"
    );
    metrics::record_relay(relay, response.status().as_u16(), start);
    response
}
