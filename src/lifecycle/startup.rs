//! Startup orchestration.
//!
//! Config is already loaded and validated by the caller. From there:
//! backend pool → metrics → bind listeners → first health round → serve.
//! Any error before the listeners are serving is fatal.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::admin::{self, AdminState};
use crate::config::BalancerConfig;
use crate::health::HealthChecker;
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::load_balancer::{BackendPool, PoolError};
use crate::observability::metrics;

/// Fatal startup failure.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Build the pool from configuration with the configured strategy attached.
pub fn build_pool(config: &BalancerConfig) -> Result<Arc<BackendPool>, PoolError> {
    let pool = BackendPool::register(&config.backends)?.with_strategy(config.algorithm.build());
    tracing::info!(
        backends = pool.len(),
        algorithm = %config.algorithm,
        "Backend pool ready"
    );
    Ok(Arc::new(pool))
}

async fn bind(address: &str) -> Result<TcpListener, StartupError> {
    TcpListener::bind(address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.to_string(),
            source,
        })
}

/// Run the balancer until `shutdown` is triggered.
pub async fn run(config: BalancerConfig, shutdown: Shutdown) -> Result<(), StartupError> {
    let pool = build_pool(&config)?;

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    // All listeners are bound before any background task is spawned.
    let listener = bind(&config.bind_address()).await?;
    let admin_listener = if config.admin.enabled {
        Some(bind(&config.admin.bind_address).await?)
    } else {
        None
    };

    let checker = HealthChecker::new(
        pool.clone(),
        Duration::from_secs(config.health_check_interval),
    );
    let health = checker.start(shutdown.subscribe()).await;

    let admin = admin_listener.map(|admin_listener| {
        let state = AdminState {
            pool: pool.clone(),
            api_key: Arc::from(config.admin.api_key.as_str()),
        };
        let token = shutdown.subscribe();
        tokio::spawn(async move {
            if let Err(e) = admin::serve(admin_listener, state, token).await {
                tracing::error!(error = %e, "Admin API stopped with error");
            }
        })
    });

    let server = HttpServer::new(&config, pool);
    let result = server.run(listener, shutdown.subscribe()).await;

    // The listener may also stop on its own error; make sure background tasks follow.
    shutdown.trigger();
    if let Err(e) = health.await {
        tracing::error!(error = %e, "Health checker task failed");
    }
    if let Some(admin) = admin {
        if let Err(e) = admin.await {
            tracing::error!(error = %e, "Admin task failed");
        }
    }

    result.map_err(StartupError::from)
}
