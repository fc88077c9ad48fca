//! Liveness endpoint for the hosting platform.

use std::net::SocketAddr;

use anyhow::Context;
use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

const BODY: &str = "Bot is running!";

fn app() -> Router {
    Router::new().route("/", get(|| async { BODY }))
}

/// Serve `GET /` on `0.0.0.0:{port}` until `cancel` fires.
pub async fn serve(port: u16, cancel: CancellationToken) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind liveness port {port}"))?;
    tracing::info!(%addr, "liveness server listening");

    axum::serve(listener, app())
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .context("liveness server failed")
}
