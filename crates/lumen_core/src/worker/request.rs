use bytes::{Buf, BytesMut};
use http::header::{CONNECTION, CONTENT_LENGTH, TRANSFER_ENCODING};
use http::{HeaderMap, HeaderName, HeaderValue, Method, Request, StatusCode, Uri, Version};
use lumen_config::HttpConfig;
use lumen_http::responses::{send_400, send_408, send_431};
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use super::ClientStream;
use super::timeouts::{ReadOutcome, read_more};

/// Upper bound on header lines per request; more is answered with 431.
const MAX_HEADERS: usize = 100;

/// A request head read off the wire. Bodies are never read.
#[derive(Debug)]
pub(crate) struct ParsedRequest {
    pub(crate) method: Method,
    /// Request target exactly as sent, for the access log.
    pub(crate) target: String,
    pub(crate) uri: Uri,
    pub(crate) version: Version,
    pub(crate) headers: HeaderMap,
    pub(crate) close_after: bool,
}

impl ParsedRequest {
    pub(crate) fn to_request(&self) -> Request<()> {
        let mut req = Request::new(());
        *req.method_mut() = self.method.clone();
        *req.uri_mut() = self.uri.clone();
        *req.version_mut() = self.version;
        *req.headers_mut() = self.headers.clone();
        req
    }
}

/// Why a request was refused before reaching the static service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Rejection {
    BadRequest,
    HeadersTooLarge,
    Timeout,
}

impl Rejection {
    pub(crate) fn status(self) -> StatusCode {
        match self {
            Rejection::BadRequest => StatusCode::BAD_REQUEST,
            Rejection::HeadersTooLarge => StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE,
            Rejection::Timeout => StatusCode::REQUEST_TIMEOUT,
        }
    }

    /// Write the matching error response. The connection closes afterwards.
    pub(crate) async fn send<S>(self, stream: &mut S) -> anyhow::Result<()>
    where
        S: ClientStream + ?Sized,
    {
        match self {
            Rejection::BadRequest => send_400(stream).await,
            Rejection::HeadersTooLarge => send_431(stream).await,
            Rejection::Timeout => send_408(stream).await,
        }
    }
}

pub(crate) enum RequestRead {
    Ready(ParsedRequest),
    Rejected(Rejection),
    /// Peer went away, idled out, or the server is shutting down.
    Closed,
}

/// Read one request head from `stream`.
///
/// Leftover bytes (a pipelined request) stay in `buf`. While nothing has been
/// received, the read races `shutdown` and waits up to `idle_timeout`; once a
/// request has started, the client read timeout applies instead.
#[instrument(skip(stream, buf, http, shutdown), fields())]
pub(crate) async fn read_http_request<S>(
    stream: &mut S,
    buf: &mut BytesMut,
    http: &HttpConfig,
    idle_timeout: Duration,
    shutdown: &CancellationToken,
) -> anyhow::Result<RequestRead>
where
    S: ClientStream + ?Sized,
{
    let read_timeout = Duration::from_secs(http.client_read_timeout_secs());
    let max_headers = usize::try_from(http.max_request_headers_bytes()).unwrap_or(usize::MAX);

    loop {
        if find_headers_end(buf).is_some() {
            match parse_head(buf) {
                Ok(Some((req, head_len))) => {
                    buf.advance(head_len);
                    debug!(
                        target: "lumen::worker",
                        method = %req.method,
                        uri = %req.target,
                        head_len,
                        "Parsed HTTP request head"
                    );
                    return Ok(RequestRead::Ready(req));
                }
                Ok(None) => {}
                Err(rejection) => {
                    warn!(
                        target: "lumen::worker",
                        status = rejection.status().as_u16(),
                        "Rejecting malformed request"
                    );
                    return Ok(RequestRead::Rejected(rejection));
                }
            }
        }

        if max_headers > 0 && buf.len() > max_headers {
            warn!(
                target: "lumen::worker",
                buffered = buf.len(),
                max_headers,
                "Request head exceeds limit"
            );
            return Ok(RequestRead::Rejected(Rejection::HeadersTooLarge));
        }

        let outcome = if buf.is_empty() {
            tokio::select! {
                _ = shutdown.cancelled() => return Ok(RequestRead::Closed),
                outcome = read_more(stream, buf, idle_timeout) => outcome?,
            }
        } else {
            read_more(stream, buf, read_timeout).await?
        };

        match outcome {
            ReadOutcome::Timeout if buf.is_empty() => {
                debug!(target: "lumen::worker", "Idle connection timed out");
                return Ok(RequestRead::Closed);
            }
            ReadOutcome::Timeout => return Ok(RequestRead::Rejected(Rejection::Timeout)),
            ReadOutcome::Read(0) => return Ok(RequestRead::Closed),
            ReadOutcome::Read(_) => {}
        }
    }
}

fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

/// Parse a complete head. `Ok(None)` means more bytes are needed.
fn parse_head(buf: &[u8]) -> Result<Option<(ParsedRequest, usize)>, Rejection> {
    let mut slots = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut raw = httparse::Request::new(&mut slots);

    let head_len = match raw.parse(buf) {
        Ok(httparse::Status::Complete(len)) => len,
        Ok(httparse::Status::Partial) => return Ok(None),
        Err(httparse::Error::TooManyHeaders) => return Err(Rejection::HeadersTooLarge),
        Err(e) => {
            debug!(target: "lumen::worker", error = %e, "httparse rejected request head");
            return Err(Rejection::BadRequest);
        }
    };

    let (Some(method), Some(target), Some(minor)) = (raw.method, raw.path, raw.version) else {
        return Err(Rejection::BadRequest);
    };

    let method = Method::from_bytes(method.as_bytes()).map_err(|_| Rejection::BadRequest)?;
    let uri: Uri = target.parse().map_err(|_| Rejection::BadRequest)?;
    let version = if minor == 0 {
        Version::HTTP_10
    } else {
        Version::HTTP_11
    };

    let mut headers = HeaderMap::with_capacity(raw.headers.len());
    for header in raw.headers.iter() {
        let name = HeaderName::from_bytes(header.name.as_bytes())
            .map_err(|_| Rejection::BadRequest)?;
        let value = HeaderValue::from_bytes(header.value).map_err(|_| Rejection::BadRequest)?;
        headers.append(name, value);
    }

    let close_after = connection_closes(&headers, version)?;

    Ok(Some((
        ParsedRequest {
            method,
            target: target.to_string(),
            uri,
            version,
            headers,
            close_after,
        },
        head_len,
    )))
}

#[derive(Default)]
struct ContentLengthState {
    value: Option<u64>,
    invalid: bool,
}

impl ContentLengthState {
    fn add(&mut self, raw: &str) {
        let mut any = false;
        for part in raw.split(',') {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                continue;
            }
            any = true;
            match trimmed.parse::<u64>() {
                Ok(len) => match self.value {
                    Some(prev) if prev != len => self.invalid = true,
                    Some(_) => {}
                    None => self.value = Some(len),
                },
                Err(_) => self.invalid = true,
            }
        }
        if !any {
            self.invalid = true;
        }
    }
}

fn split_header_tokens(value: &str) -> impl Iterator<Item = String> + '_ {
    value.split(',').filter_map(|token| {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(
                trimmed
                    .trim_matches(|c| c == '"' || c == '\'')
                    .to_ascii_lowercase(),
            )
        }
    })
}

/// Decide whether the connection closes after this request.
///
/// HTTP/1.1 persists unless `Connection: close`; HTTP/1.0 closes unless
/// `Connection: keep-alive`. A request that announces a body always closes,
/// since the body is never read.
fn connection_closes(headers: &HeaderMap, version: Version) -> Result<bool, Rejection> {
    let mut content_length = ContentLengthState::default();
    for value in headers.get_all(CONTENT_LENGTH) {
        let value = value.to_str().map_err(|_| Rejection::BadRequest)?;
        content_length.add(value);
    }
    if content_length.invalid {
        return Err(Rejection::BadRequest);
    }

    let has_body =
        headers.contains_key(TRANSFER_ENCODING) || content_length.value.is_some_and(|len| len > 0);

    let mut connection_close = false;
    let mut connection_keep_alive = false;
    for value in headers.get_all(CONNECTION) {
        let Ok(value) = value.to_str() else {
            continue;
        };
        for token in split_header_tokens(value) {
            match token.as_str() {
                "close" => connection_close = true,
                "keep-alive" => connection_keep_alive = true,
                _ => {}
            }
        }
    }

    let close = if version == Version::HTTP_10 {
        !connection_keep_alive || connection_close
    } else {
        connection_close
    };

    Ok(close || has_body)
}
