//! HTTP/1.1 response serialization.

use std::time::SystemTime;

use bytes::Bytes;
use http::{HeaderMap, Response, StatusCode};
use httpdate::fmt_http_date;
use tokio::io::{AsyncWrite, AsyncWriteExt};

const HTTP_VERSION: &str = "HTTP/1.1";
const CRLF: &str = "\r\n";
const HEADER_CONNECTION: &str = "Connection";
const HEADER_DATE: &str = "Date";
const HEADER_SERVER: &str = "Server";
const CONNECTION_KEEP_ALIVE: &str = "keep-alive";
const CONNECTION_CLOSE: &str = "close";
pub const SERVER_NAME: &str = concat!("lumen/", env!("CARGO_PKG_VERSION"));

/// Metadata required to render the response header section.
struct ResponseHead<'a> {
    status: StatusCode,
    headers: &'a HeaderMap,
    keep_alive: bool,
    date: String,
}

impl<'a> ResponseHead<'a> {
    fn new(status: StatusCode, headers: &'a HeaderMap, keep_alive: bool) -> Self {
        Self {
            status,
            headers,
            keep_alive,
            date: fmt_http_date(SystemTime::now()),
        }
    }

    /// Render the header section into a String.
    fn render(&self) -> String {
        let mut out = String::with_capacity(self.header_len_hint());
        write_status_line(&mut out, self.status);

        for (name, value) in self.headers {
            // Values built by this crate are visible ASCII; anything else is skipped.
            if let Ok(value) = value.to_str() {
                write_header(&mut out, name.as_str(), value);
            }
        }

        write_header(&mut out, HEADER_DATE, &self.date);
        write_header(&mut out, HEADER_SERVER, SERVER_NAME);
        write_header(&mut out, HEADER_CONNECTION, connection_value(self.keep_alive));
        out.push_str(CRLF);
        out
    }

    /// Estimate the size of the header block to reduce reallocations.
    fn header_len_hint(&self) -> usize {
        let mut len = HTTP_VERSION.len() + 1 + 3 + 1 + 32 + CRLF.len();
        for (name, value) in self.headers {
            len += name.as_str().len() + 2 + value.len() + CRLF.len();
        }
        len += HEADER_DATE.len() + 2 + self.date.len() + CRLF.len();
        len += HEADER_SERVER.len() + 2 + SERVER_NAME.len() + CRLF.len();
        len += HEADER_CONNECTION.len() + 2 + CONNECTION_KEEP_ALIVE.len() + CRLF.len();
        len + CRLF.len()
    }
}

/// Return the correct Connection header value for the keep-alive setting.
fn connection_value(keep_alive: bool) -> &'static str {
    if keep_alive {
        CONNECTION_KEEP_ALIVE
    } else {
        CONNECTION_CLOSE
    }
}

fn write_status_line(out: &mut String, status: StatusCode) {
    out.push_str(HTTP_VERSION);
    out.push(' ');
    out.push_str(status.as_str());
    out.push(' ');
    out.push_str(status.canonical_reason().unwrap_or(""));
    out.push_str(CRLF);
}

fn write_header(out: &mut String, name: &str, value: &str) {
    out.push_str(name);
    out.push_str(": ");
    out.push_str(value);
    out.push_str(CRLF);
}

/// Serialize a response into raw HTTP/1.1 bytes.
///
/// `head_only` drops the body but keeps every header, which is what a HEAD
/// request expects.
pub fn encode_response(resp: &Response<Bytes>, keep_alive: bool, head_only: bool) -> Vec<u8> {
    let head = ResponseHead::new(resp.status(), resp.headers(), keep_alive).render();
    let body: &[u8] = if head_only { &[] } else { resp.body() };

    let mut out = Vec::with_capacity(head.len() + body.len());
    out.extend_from_slice(head.as_bytes());
    out.extend_from_slice(body);
    out
}

/// Serialize a response and write it to the client.
pub async fn write_response<S>(
    stream: &mut S,
    resp: &Response<Bytes>,
    keep_alive: bool,
    head_only: bool,
) -> anyhow::Result<()>
where
    S: AsyncWrite + Unpin + ?Sized,
{
    let bytes = encode_response(resp, keep_alive, head_only);
    stream.write_all(&bytes).await?;
    stream.flush().await?;
    Ok(())
}
