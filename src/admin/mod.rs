//! Admin API.
//!
//! Bearer-token protected endpoints for inspecting the pool and swapping
//! the balancing strategy at runtime. Served on its own listener.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, put},
    Router,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::load_balancer::BackendPool;

#[derive(Clone)]
pub struct AdminState {
    pub pool: Arc<BackendPool>,
    pub api_key: Arc<str>,
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/backends", get(get_backends))
        .route("/admin/strategy", put(put_strategy))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}

/// Serve the admin API until `shutdown` is cancelled.
pub async fn serve(
    listener: TcpListener,
    state: AdminState,
    shutdown: CancellationToken,
) -> Result<(), std::io::Error> {
    tracing::info!(address = %listener.local_addr()?, "Admin API listening");
    axum::serve(listener, setup_admin_router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use tower::ServiceExt;

    fn state() -> AdminState {
        AdminState {
            pool: Arc::new(BackendPool::register(["http://a:1", "http://b:2"]).unwrap()),
            api_key: Arc::from("secret"),
        }
    }

    fn request(method: Method, uri: &str, key: Option<&str>, body: Body) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(key) = key {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", key));
        }
        builder.body(body).unwrap()
    }

    #[tokio::test]
    async fn test_requires_bearer_token() {
        let router = setup_admin_router(state());
        for key in [None, Some("wrong")] {
            let response = router
                .clone()
                .oneshot(request(Method::GET, "/admin/status", key, Body::empty()))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn test_backends_listing() {
        let state = state();
        state.pool.all_backends()[1].set_alive(false);
        let response = setup_admin_router(state)
            .oneshot(request(Method::GET, "/admin/backends", Some("secret"), Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), 4096).await.unwrap();
        let backends: Vec<BackendStatus> = serde_json::from_slice(&body).unwrap();
        assert_eq!(backends.len(), 2);
        assert!(backends[0].alive);
        assert!(!backends[1].alive);
    }

    #[tokio::test]
    async fn test_put_strategy_swaps_algorithm() {
        let state = state();
        let router = setup_admin_router(state.clone());

        let response = router
            .clone()
            .oneshot(request(
                Method::PUT,
                "/admin/strategy",
                Some("secret"),
                Body::from(r#"{"algorithm":"least_conn"}"#),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(state.pool.strategy_name(), "least_conn");

        let response = router
            .oneshot(request(
                Method::PUT,
                "/admin/strategy",
                Some("secret"),
                Body::from(r#"{"algorithm":"fastest"}"#),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(state.pool.strategy_name(), "least_conn");
    }
}
