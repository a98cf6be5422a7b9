//! Canned error responses written straight to the socket.
//!
//! These are used by the connection loop before a request ever reaches the
//! static service, so they always close the connection.

use bytes::Bytes;
use http::{Response, StatusCode, header};
use tokio::io::AsyncWrite;

use crate::response::write_response;

const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";

/// Build a short text/plain response for `status`.
pub fn plain_text(status: StatusCode, body: &str) -> Response<Bytes> {
    let len = body.len();
    let mut resp = Response::new(Bytes::copy_from_slice(body.as_bytes()));
    *resp.status_mut() = status;
    let headers = resp.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static(TEXT_PLAIN_UTF8),
    );
    headers.insert(header::CONTENT_LENGTH, len.into());
    resp
}

/// Helper for plain-text responses that end the connection.
async fn send_text_response<S>(stream: &mut S, status: StatusCode, body: &str) -> anyhow::Result<()>
where
    S: AsyncWrite + Unpin + ?Sized,
{
    write_response(stream, &plain_text(status, body), false, false).await
}

pub async fn send_400<S>(stream: &mut S) -> anyhow::Result<()>
where
    S: AsyncWrite + Unpin + ?Sized,
{
    send_text_response(stream, StatusCode::BAD_REQUEST, "400 Bad Request\n").await
}

pub async fn send_405_with_allow<S>(stream: &mut S, allow: &str) -> anyhow::Result<()>
where
    S: AsyncWrite + Unpin + ?Sized,
{
    let mut resp = plain_text(StatusCode::METHOD_NOT_ALLOWED, "405 Method Not Allowed\n");
    if let Ok(value) = header::HeaderValue::from_str(allow) {
        resp.headers_mut().insert(header::ALLOW, value);
    }
    write_response(stream, &resp, false, false).await
}

pub async fn send_408<S>(stream: &mut S) -> anyhow::Result<()>
where
    S: AsyncWrite + Unpin + ?Sized,
{
    send_text_response(stream, StatusCode::REQUEST_TIMEOUT, "408 Request Timeout\n").await
}

pub async fn send_431<S>(stream: &mut S) -> anyhow::Result<()>
where
    S: AsyncWrite + Unpin + ?Sized,
{
    send_text_response(
        stream,
        StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE,
        "431 Request Header Fields Too Large\n",
    )
    .await
}
