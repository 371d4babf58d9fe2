//! Handle for an actix listener running in the background.

use std::net::SocketAddr;

use actix_web::dev::{Server, ServerHandle};

/// A bound and running HTTP listener.
pub struct BoundServer {
    name: &'static str,
    handle: ServerHandle,
    addrs: Vec<SocketAddr>,
    task: tokio::task::JoinHandle<std::io::Result<()>>,
}

impl BoundServer {
    /// Drive `server` on the current actix runtime.
    pub fn spawn(name: &'static str, server: Server, addrs: Vec<SocketAddr>) -> Self {
        let handle = server.handle();
        let task = actix_web::rt::spawn(server);
        tracing::info!(listener = name, addrs = ?addrs, "listening");
        Self {
            name,
            handle,
            addrs,
            task,
        }
    }

    /// First bound address (useful when bound to port 0).
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.addrs.first().copied()
    }

    /// Stop accepting connections and let in-flight responses finish.
    pub async fn stop(self) {
        self.handle.stop(true).await;
        match self.task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(listener = self.name, error = %e, "listener exited with error"),
            Err(e) => tracing::warn!(listener = self.name, error = %e, "listener task failed"),
        }
        tracing::info!(listener = self.name, "listener closed");
    }
}
