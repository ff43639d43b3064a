use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::admin::AdminState;
use crate::load_balancer::Algorithm;

#[derive(Debug, Serialize, Deserialize)]
pub struct SystemStatus {
    pub version: String,
    pub strategy: String,
    pub backends: usize,
    pub alive_backends: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BackendStatus {
    pub address: String,
    pub alive: bool,
    pub active_connections: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StrategyUpdate {
    pub algorithm: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StrategyChanged {
    pub strategy: String,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        strategy: state.pool.strategy_name().to_string(),
        backends: state.pool.len(),
        alive_backends: state.pool.snapshot_alive().len(),
    })
}

pub async fn get_backends(State(state): State<AdminState>) -> Json<Vec<BackendStatus>> {
    let statuses = state
        .pool
        .all_backends()
        .iter()
        .map(|b| BackendStatus {
            address: b.address().to_string(),
            alive: b.is_alive(),
            active_connections: b.active_connections(),
        })
        .collect();

    Json(statuses)
}

/// Swap the active balancing strategy.
pub async fn put_strategy(
    State(state): State<AdminState>,
    Json(update): Json<StrategyUpdate>,
) -> Result<Json<StrategyChanged>, (StatusCode, String)> {
    let algorithm: Algorithm = update
        .algorithm
        .parse()
        .map_err(|e: crate::load_balancer::UnknownAlgorithm| (StatusCode::BAD_REQUEST, e.to_string()))?;

    state.pool.set_strategy(algorithm.build());

    Ok(Json(StrategyChanged {
        strategy: algorithm.to_string(),
    }))
}
