//! HTTP API handlers — exposes registry state as JSON.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{ConnectInfo, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use beacon_registry::Registry;

#[derive(Clone)]
pub struct ApiState {
    pub registry: Arc<Registry>,
}

// ── /announce ─────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct AnnounceRequest {
    pub system_id: Option<String>,
    /// Omitted ⇒ inferred from the connecting peer.
    pub ip_address: Option<String>,
    pub port: Option<u16>,
    pub system_name: Option<String>,
}

#[derive(Serialize)]
pub struct AnnounceResponse {
    pub status: String,
    pub message: String,
}

pub async fn handle_announce(
    State(state): State<ApiState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Json(req): Json<AnnounceRequest>,
) -> Result<Json<AnnounceResponse>, (StatusCode, String)> {
    let missing = || {
        (
            StatusCode::BAD_REQUEST,
            "system_id and port are required".to_string(),
        )
    };

    let system_id = match req.system_id {
        Some(id) if !id.is_empty() => id,
        _ => return Err(missing()),
    };
    let port = req.port.ok_or_else(missing)?;

    let address = req.ip_address.unwrap_or_else(|| peer.ip().to_string());

    state
        .registry
        .announce(&system_id, address, port, req.system_name)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    tracing::debug!(system_id = %system_id, port, "system announced");

    Ok(Json(AnnounceResponse {
        status: "success".to_string(),
        message: format!("System {system_id} announced as available"),
    }))
}

// ── /available ────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct AvailableResponse {
    pub count: usize,
    pub systems: HashMap<String, SystemInfo>,
}

#[derive(Serialize)]
pub struct SystemInfo {
    pub ip_address: String,
    pub port: u16,
    pub system_name: String,
    pub last_seen_secs: u64,
}

pub async fn handle_available(State(state): State<ApiState>) -> Json<AvailableResponse> {
    // One "now" for both the filter and the reported ages.
    let now = Instant::now();
    let systems: HashMap<String, SystemInfo> = state
        .registry
        .list_available_at(now)
        .into_iter()
        .map(|(id, entry)| {
            let info = SystemInfo {
                ip_address: entry.address,
                port: entry.port,
                system_name: entry.display_name,
                last_seen_secs: now.saturating_duration_since(entry.last_seen).as_secs(),
            };
            (id, info)
        })
        .collect();

    Json(AvailableResponse {
        count: systems.len(),
        systems,
    })
}

// ── /remove/{system_id} ───────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct RemoveResponse {
    pub system_id: String,
    pub removed: bool,
}

pub async fn handle_remove(
    State(state): State<ApiState>,
    Path(system_id): Path<String>,
) -> Json<RemoveResponse> {
    let removed = state.registry.remove(&system_id);
    if removed {
        tracing::info!(system_id = %system_id, "system removed via API");
    }
    Json(RemoveResponse { system_id, removed })
}
