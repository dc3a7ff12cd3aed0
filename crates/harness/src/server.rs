//! Fixture server - serving the site tree over local HTTP for the run
//!
//! The server is in-process: an axum router wrapping `ServeDir` over the
//! read-only site root. Binding an explicitly requested port that is already
//! in use fails with `PortUnavailable` rather than silently picking another,
//! so fixture URLs stay deterministic.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use sitecheck_common::{Error, Result};

/// Handle to the running fixture server.
#[derive(Debug)]
pub struct FixtureServer {
    addr: SocketAddr,
    base_url: String,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl FixtureServer {
    /// Bind and start serving `root`.
    ///
    /// `port = None` picks an ephemeral port; an explicit busy port is a
    /// fatal `PortUnavailable`.
    pub async fn start(root: &Path, port: Option<u16>) -> Result<Self> {
        if !root.is_dir() {
            return Err(Error::SiteRootNotFound(root.to_path_buf()));
        }

        let requested = port.unwrap_or(0);
        let listener = match TcpListener::bind(("127.0.0.1", requested)).await {
            Ok(l) => l,
            Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
                return Err(Error::PortUnavailable {
                    port: requested,
                });
            }
            Err(e) => return Err(e.into()),
        };
        let addr = listener.local_addr()?;

        let app = Router::new()
            .fallback_service(ServeDir::new(root))
            .layer(TraceLayer::new_for_http());

        let (tx, rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = rx.await;
            });
            if let Err(e) = serve.await {
                warn!("Fixture server stopped with error: {}", e);
            }
        });

        let base_url = format!("http://{}", addr);
        info!("Fixture server listening at {}", base_url);

        Ok(Self {
            addr,
            base_url,
            shutdown: Some(tx),
            task: Some(task),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Poll the bound address until it answers or the timeout elapses.
    ///
    /// Any HTTP response counts as ready; a 404 from an odd site layout
    /// still proves the socket is serving.
    pub async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        let start = tokio::time::Instant::now();
        while start.elapsed() < timeout {
            if client.get(&self.base_url).send().await.is_ok() {
                return Ok(());
            }
            sleep(Duration::from_millis(100)).await;
        }
        Err(Error::ServerNotReady(timeout))
    }

    /// Trigger graceful shutdown and join the serve task. Safe to call
    /// after a partial start and safe to call twice.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        info!("Fixture server stopped");
    }
}

impl Drop for FixtureServer {
    fn drop(&mut self) {
        // Last-resort cleanup when `stop` was never awaited.
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
