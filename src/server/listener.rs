use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::ServerConfig;
use crate::http::connection::Connection;
use crate::server::router::Router;

/// Binds the configured address and serves until an accept error.
pub async fn run(cfg: &ServerConfig) -> anyhow::Result<()> {
    let router = Arc::new(Router::from_config(cfg)?);

    let listener = TcpListener::bind(&cfg.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", cfg.listen_addr))?;
    info!(
        "Listening on {} (root {}, idle timeout {} ms)",
        cfg.listen_addr,
        router.root().display(),
        cfg.idle_timeout_ms
    );

    serve(listener, router, cfg.idle_timeout()).await
}

/// Accept loop: one task per connection, all sharing the read-only router.
pub async fn serve(
    listener: TcpListener,
    router: Arc<Router>,
    idle_timeout: Duration,
) -> anyhow::Result<()> {
    loop {
        let (socket, peer) = listener.accept().await?;
        info!("Accepted connection from {}", peer);

        let router = Arc::clone(&router);
        tokio::spawn(async move {
            let mut conn = Connection::new(socket, router, idle_timeout);
            match conn.run().await {
                Ok(()) => {
                    info!("Connection from {} closed after {} responses", peer, conn.served())
                }
                Err(e) => tracing::error!("Connection error from {}: {}", peer, e),
            }
        });
    }
}
