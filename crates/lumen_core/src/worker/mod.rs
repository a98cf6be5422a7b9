//! Per-connection HTTP/1.1 handler.
//!
//! Reads request heads, hands GET/HEAD to the static service, and writes the
//! responses back while honouring keep-alive, timeouts and shutdown.

use std::{net::SocketAddr, sync::Arc};

use bytes::{Bytes, BytesMut};
use http::{Method, Response, StatusCode};
use lumen_config::LumenConfig;
use lumen_http::responses::{plain_text, send_405_with_allow};
use lumen_http::write_response;
use lumen_static::StaticService;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, instrument};

mod access;
mod request;
mod timeouts;

use request::{ParsedRequest, RequestRead, read_http_request};

const ALLOWED_METHODS: &str = "GET, HEAD";

pub trait ClientStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T> ClientStream for T where T: AsyncRead + AsyncWrite + Unpin + Send {}

/// Entry point for a "logical worker" that handles a single connection.
#[instrument(
    skip(stream, service, cfg, shutdown),
    fields(
        client = %client_addr,
    )
)]
pub async fn handle_connection<S>(
    mut stream: S,
    client_addr: SocketAddr,
    service: Arc<StaticService>,
    cfg: Arc<LumenConfig>,
    shutdown: CancellationToken,
) -> anyhow::Result<()>
where
    S: ClientStream,
{
    debug!(target: "lumen::worker", "Handling new client connection");

    let mut buf = BytesMut::new();
    let mut first_request = true;
    let mut served = 0usize;

    loop {
        let idle_timeout = if first_request {
            Duration::from_secs(cfg.http.client_read_timeout_secs())
        } else {
            Duration::from_secs(cfg.http.keepalive_timeout_secs())
        };

        let read_started = Instant::now();
        let req =
            match read_http_request(&mut stream, &mut buf, &cfg.http, idle_timeout, &shutdown)
                .await?
            {
                RequestRead::Ready(req) => req,
                RequestRead::Rejected(rejection) => {
                    rejection.send(&mut stream).await?;
                    access::log("-", "-", rejection.status(), read_started.elapsed());
                    break;
                }
                RequestRead::Closed => break,
            };

        let started = Instant::now();

        if req.method != Method::GET && req.method != Method::HEAD {
            send_405_with_allow(&mut stream, ALLOWED_METHODS).await?;
            access::log(
                req.method.as_str(),
                &req.target,
                StatusCode::METHOD_NOT_ALLOWED,
                started.elapsed(),
            );
            break;
        }

        let keep_alive = !req.close_after && !shutdown.is_cancelled();
        let head_only = req.method == Method::HEAD;

        let resp = serve_static(&service, &req).await;
        write_response(&mut stream, &resp, keep_alive, head_only).await?;
        access::log(
            req.method.as_str(),
            &req.target,
            resp.status(),
            started.elapsed(),
        );
        served += 1;

        if !keep_alive {
            break;
        }

        first_request = false;
    }

    debug!(
        target: "lumen::worker",
        %client_addr,
        requests = served,
        "Finished handling connection"
    );

    Ok(())
}

/// Run the static service on its own task so a panic inside it becomes a 500
/// instead of tearing down the connection without a reply.
async fn serve_static(service: &Arc<StaticService>, req: &ParsedRequest) -> Response<Bytes> {
    let service = Arc::clone(service);
    let request = req.to_request();

    match tokio::spawn(async move { service.handle(&request).await }).await {
        Ok(resp) => resp,
        Err(e) => {
            error!(
                target: "lumen::worker",
                uri = %req.target,
                error = %e,
                "Static handler failed"
            );
            plain_text(
                StatusCode::INTERNAL_SERVER_ERROR,
                "500 Internal Server Error\n",
            )
        }
    }
}
