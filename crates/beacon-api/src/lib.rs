pub mod handlers;

use std::net::SocketAddr;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

pub use handlers::ApiState;

/// Build the API router. Split out of `serve` so tests can bind their
/// own listener and discover the port.
pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/announce", post(handlers::handle_announce))
        .route("/available", get(handlers::handle_available))
        .route("/remove/{system_id}", delete(handlers::handle_remove))
        .with_state(state)
        .layer(cors)
}

pub async fn serve(state: ApiState, bind_addr: &str, port: u16) -> anyhow::Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(format!("{bind_addr}:{port}")).await?;
    tracing::info!(port, "API listening on {bind_addr}");
    // ConnectInfo gives handlers the peer address, used to infer an
    // announcer's address when its body omits one.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
