use std::{future::Future, net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use lumen_cache::ContentCache;
use lumen_config::LumenConfig;
use lumen_static::StaticService;
use tokio::net::TcpListener;
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{error, info, instrument};

mod accept;
mod shutdown;
mod startup;
mod sweeper;

use accept::{accept_loop, bind_listener};
use shutdown::drain;
use sweeper::spawn_cache_sweeper;

pub use shutdown::shutdown_signal;

pub struct Master {
    cfg: Arc<LumenConfig>,
    cache: Arc<ContentCache>,
    service: Arc<StaticService>,
}

impl Master {
    /// Build the shared state: one content cache and the static service on
    /// top of it. Fails if the document root cannot be resolved.
    pub fn new(cfg: LumenConfig) -> anyhow::Result<Self> {
        let cache = Arc::new(ContentCache::new());
        let service = StaticService::new(
            cfg.server.root(),
            cfg.server.index(),
            Arc::clone(&cache),
        )
        .with_context(|| format!("failed to open document root {:?}", cfg.server.root()))?;

        info!(
            target: "lumen::master",
            root = %service.root().display(),
            index = %cfg.server.index(),
            "Document root ready"
        );

        Ok(Self {
            cfg: Arc::new(cfg),
            cache,
            service: Arc::new(service),
        })
    }

    /// Bind, serve, and return once SIGINT/SIGTERM has been handled and the
    /// in-flight connections are drained.
    #[instrument(skip(self), fields(
        worker_connections = %self.cfg.global.worker_connections(),
        log_level = %self.cfg.global.log_level(),
    ))]
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = self.bind().await?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Bind the configured address.
    pub async fn bind(&self) -> anyhow::Result<TcpListener> {
        bind_listener(self.cfg.server.socket_addr()).await
    }

    /// Accept connections on `listener` until `shutdown` resolves, then stop
    /// accepting and wait for open connections to finish.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()>,
    {
        self.log_startup();

        let listen_addr: SocketAddr = listener
            .local_addr()
            .context("listener has no local address")?;
        let semaphore = self.init_semaphore();
        let token = CancellationToken::new();
        let tracker = TaskTracker::new();

        let sweeper = spawn_cache_sweeper(
            Arc::clone(&self.cache),
            self.cfg.http.cache_clear_interval_secs(),
            token.clone(),
        );

        let accept = tokio::spawn(accept_loop(
            listener,
            listen_addr,
            semaphore,
            Arc::clone(&self.service),
            Arc::clone(&self.cfg),
            tracker.clone(),
            token.clone(),
        ));

        info!(
            target: "lumen::master",
            listen = %listen_addr,
            "Serving static assets"
        );

        shutdown.await;
        token.cancel();

        if let Err(e) = accept.await {
            error!(
                target: "lumen::master",
                listen = %listen_addr,
                error = ?e,
                "accept_loop task failed"
            );
        }

        if let Some(sweeper) = sweeper {
            if let Err(e) = sweeper.await {
                error!(target: "lumen::master", error = ?e, "Cache sweeper task failed");
            }
        }

        let grace = Duration::from_secs(self.cfg.http.shutdown_grace_secs());
        drain(tracker, grace).await;

        info!(target: "lumen::master", "Shutdown complete");
        Ok(())
    }
}
