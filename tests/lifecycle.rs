//! Startup error paths.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use http_balancer::config::BalancerConfig;
use http_balancer::lifecycle::startup::{self, StartupError};
use http_balancer::Shutdown;
use tokio::net::TcpListener;

mod common;

/// Backend that counts every request it receives.
async fn start_counting_backend(hits: Arc<AtomicUsize>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().fallback(move || {
        let hits = hits.clone();
        async move {
            hits.fetch_add(1, Ordering::SeqCst);
            "ok"
        }
    });
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_admin_bind_failure_leaves_no_health_loop() {
    let hits = Arc::new(AtomicUsize::new(0));
    let backend = start_counting_backend(hits.clone()).await;
    let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();

    let mut config = BalancerConfig::default();
    config.listen_port = common::free_addr().port();
    config.backends = vec![backend];
    config.health_check_interval = 1;
    config.admin.enabled = true;
    config.admin.api_key = "secret".into();
    config.admin.bind_address = occupied.local_addr().unwrap().to_string();

    let result = startup::run(config, Shutdown::new()).await;
    assert!(matches!(result, Err(StartupError::Bind { .. })), "{:?}", result);

    let at_return = hits.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(hits.load(Ordering::SeqCst), at_return);
    assert_eq!(at_return, 0, "no probe should run when startup fails");
}

#[tokio::test]
async fn test_proxy_bind_failure_is_fatal() {
    let occupied = std::net::TcpListener::bind("0.0.0.0:0").unwrap();

    let mut config = BalancerConfig::default();
    config.listen_port = occupied.local_addr().unwrap().port();
    config.backends = vec!["http://127.0.0.1:9".into()];

    let result = startup::run(config, Shutdown::new()).await;
    assert!(matches!(result, Err(StartupError::Bind { .. })), "{:?}", result);
}
