//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all proxy handler
//! - Wire up middleware (request ID, trace logging, panic isolation)
//! - Bind server to listener with graceful shutdown
//! - Hand every request to the dispatcher

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
    LatencyUnit,
};
use tracing::Level;

use crate::config::BalancerConfig;
use crate::http::{response, X_REQUEST_ID};
use crate::load_balancer::BackendPool;
use crate::observability::metrics;
use crate::proxy::{Dispatcher, HyperTransport};
use crate::resilience::RetryPolicy;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher<HyperTransport, BackendPool>>,
}

/// HTTP server for the load balancer.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server forwarding to `pool`.
    pub fn new(config: &BalancerConfig, pool: Arc<BackendPool>) -> Self {
        Self::with_policy(config, pool, RetryPolicy::default())
    }

    /// Same as `new` with an explicit retry policy.
    pub fn with_policy(config: &BalancerConfig, pool: Arc<BackendPool>, policy: RetryPolicy) -> Self {
        let dispatcher = Dispatcher::new(HyperTransport::new(), pool, policy, config.max_body_bytes);
        let state = AppState {
            dispatcher: Arc::new(dispatcher),
        };

        Self {
            router: Self::build_router(state),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
                    .layer(
                        TraceLayer::new_for_http()
                            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                            .on_request(DefaultOnRequest::new().level(Level::INFO))
                            .on_response(
                                DefaultOnResponse::new()
                                    .level(Level::INFO)
                                    .latency_unit(LatencyUnit::Millis),
                            ),
                    )
                    .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
                    .layer(CatchPanicLayer::custom(handle_panic)),
            )
    }

    /// The router, for driving requests without a listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` is cancelled.
    pub async fn run(self, listener: TcpListener, shutdown: CancellationToken) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        // Serve with graceful shutdown
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main proxy handler.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();
    let client_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    tracing::debug!(method = %method, path = %request.uri().path(), "Proxying request");

    match state.dispatcher.forward(request, client_ip).await {
        Ok((response, backend)) => {
            metrics::record_request(&method, response.status().as_u16(), backend.address().as_str(), start_time);
            response
        }
        Err(e) => {
            let response = e.into_response();
            metrics::record_request(&method, response.status().as_u16(), "none", start_time);
            response
        }
    }
}

/// Crash isolation: a panic in the handler becomes a 500, the process keeps serving.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(panic = %detail, "Handler panicked");

    let mut response = response::plain(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
    response
        .headers_mut()
        .insert("cache-control", HeaderValue::from_static("no-store"));
    response
}
