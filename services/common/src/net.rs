use std::{io, net::SocketAddr};
use tokio::net::TcpListener;

pub async fn bind_listener(port: u16) -> io::Result<TcpListener> {
    // Bind on all interfaces for container compatibility.
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");
    Ok(listener)
}

pub async fn shutdown_signal() {
    // Handle ctrl-c and SIGTERM to allow graceful shutdown.
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "sigterm handler unavailable");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }

    tracing::info!("shutdown signal received");
}
