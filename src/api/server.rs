//! Server lifecycle: bind, serve, shut down on Ctrl-C.

use std::sync::Arc;

use tokio::net::TcpListener;

use crate::api::router::api_router;
use crate::core_state::CoreState;

/// Bind to the configured address and serve until `shutdown` resolves.
pub async fn serve_with_shutdown<F>(
    core: Arc<CoreState>,
    listener: TcpListener,
    shutdown: F,
) -> std::io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    let app = api_router(core);

    tracing::info!(%addr, "API server started");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    tracing::info!("API server stopped");
    Ok(())
}

/// Run the API on `config.bind_addr` until Ctrl-C.
pub async fn serve(core: Arc<CoreState>) -> std::io::Result<()> {
    let addr = core.config.bind_addr;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server binding");

    serve_with_shutdown(core, listener, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {e}");
        }
        tracing::info!("API server received shutdown signal");
    })
    .await
}
