use std::{net::SocketAddr, sync::Arc, time::Duration};

use lumen_config::LumenConfig;
use lumen_static::StaticService;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{Instrument, debug, error, info, warn};

use crate::worker::handle_connection;

/// Pause after a failed accept() so a persistent error (e.g. EMFILE) does not spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

pub(crate) async fn bind_listener(listen_addr: SocketAddr) -> anyhow::Result<TcpListener> {
    info!(
        target: "lumen::master",
        listen = %listen_addr,
        "Binding listener"
    );

    match TcpListener::bind(listen_addr).await {
        Ok(listener) => {
            info!(
                target: "lumen::master",
                listen = %listen_addr,
                "Bind() successful"
            );
            Ok(listener)
        }
        Err(e) => {
            error!(
                target: "lumen::master",
                listen = %listen_addr,
                error = ?e,
                "Failed to bind listener"
            );
            Err(e.into())
        }
    }
}

struct AcceptedConn {
    stream: TcpStream,
    addr: SocketAddr,
    permit: OwnedSemaphorePermit,
}

async fn accept_with_permit(
    listener: &TcpListener,
    listen_addr: SocketAddr,
    semaphore: &Arc<Semaphore>,
) -> anyhow::Result<AcceptedConn> {
    let (stream, addr) = match listener.accept().await {
        Ok(pair) => pair,
        Err(e) => {
            error!(
                target: "lumen::master",
                listen = %listen_addr,
                error = ?e,
                "Failed to accept connection"
            );
            return Err(e.into());
        }
    };

    let permit = match Arc::clone(semaphore).acquire_owned().await {
        Ok(p) => p,
        Err(e) => {
            error!(
                target: "lumen::master",
                listen = %listen_addr,
                error = ?e,
                "Failed to acquire connection permit"
            );
            return Err(e.into());
        }
    };

    debug!(
        target: "lumen::master",
        listen = %listen_addr,
        client_addr = %addr,
        available_permits = semaphore.available_permits(),
        "Connection accepted"
    );

    Ok(AcceptedConn {
        stream,
        addr,
        permit,
    })
}

/// Accept until `shutdown` fires. Each connection runs on `tracker` while
/// holding one semaphore permit.
pub(crate) async fn accept_loop(
    listener: TcpListener,
    listen_addr: SocketAddr,
    semaphore: Arc<Semaphore>,
    service: Arc<StaticService>,
    cfg: Arc<LumenConfig>,
    tracker: TaskTracker,
    shutdown: CancellationToken,
) {
    info!(
        target: "lumen::master",
        listen = %listen_addr,
        "accept_loop started for listening socket"
    );

    loop {
        let accepted = tokio::select! {
            _ = shutdown.cancelled() => break,
            accepted = accept_with_permit(&listener, listen_addr, &semaphore) => accepted,
        };

        let AcceptedConn { stream, addr, permit } = match accepted {
            Ok(conn) => conn,
            Err(_) => {
                tokio::time::sleep(ACCEPT_BACKOFF).await;
                continue;
            }
        };

        let service = Arc::clone(&service);
        let cfg = Arc::clone(&cfg);
        let token = shutdown.clone();
        let span = tracing::info_span!(
            "worker_connection",
            client_addr = %addr,
            listen = %listen_addr,
        );

        tracker.spawn(
            async move {
                let _permit = permit;
                debug!(
                    target: "lumen::worker",
                    "Worker spawned for incoming connection"
                );

                if let Err(e) = handle_connection(stream, addr, service, cfg, token).await {
                    warn!(
                        target: "lumen::worker",
                        client_addr = %addr,
                        error = ?e,
                        "Error while handling connection"
                    );
                }

                debug!(
                    target: "lumen::master",
                    client_addr = %addr,
                    "Permit released after connection closed"
                );
            }
            .instrument(span),
        );
    }

    info!(
        target: "lumen::master",
        listen = %listen_addr,
        in_flight = tracker.len(),
        "accept_loop stopped; no longer accepting connections"
    );
}
