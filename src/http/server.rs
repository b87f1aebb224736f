//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the catch-all proxy handler
//! - Wire up middleware (tracing, body limits, request ID)
//! - Build the shared application state (registry, client, cache, rewriter)
//! - Bind and serve with graceful shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::routing::any;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::cache::MemoryScriptCache;
use crate::config::ProxyConfig;
use crate::http::diagnostics::DiagnosticsSink;
use crate::http::handler::{proxy_handler, AppState};
use crate::registry::VendorRegistry;

/// HTTP server for the collection proxy.
pub struct HttpServer {
    router: Router,
    diagnostics: DiagnosticsSink,
}

impl HttpServer {
    /// Create a server with the built-in vendor registry.
    pub fn new(config: ProxyConfig) -> Self {
        let registry = VendorRegistry::new(&config.proxy.collect_prefix);
        Self::with_registry(config, registry)
    }

    /// Create a server with an explicit registry. Integration tests use this
    /// to point routes at local mock upstreams.
    pub fn with_registry(config: ProxyConfig, registry: VendorRegistry) -> Self {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap_or_default();
        let diagnostics = DiagnosticsSink::default();

        let state = AppState {
            registry: Arc::new(registry),
            client,
            cache: Arc::new(MemoryScriptCache::new()),
            rewriter: Arc::from(config.proxy.rewriter.build()),
            settings: config.proxy.clone(),
            max_body_size: config.listener.max_body_size,
            diagnostics: diagnostics.clone(),
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            diagnostics,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        // Outer timeout covers the whole request including the upstream
        // fetch, with headroom over the upstream timeout.
        let request_timeout = Duration::from_secs(config.proxy.upstream_timeout_secs + 5);
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(request_timeout))
            .layer(RequestBodyLimitLayer::new(config.listener.max_body_size))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    /// Diagnostics sink for test capture and external observability.
    pub fn diagnostics(&self) -> &DiagnosticsSink {
        &self.diagnostics
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
