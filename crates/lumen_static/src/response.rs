//! Response builders for static file serving.

use bytes::Bytes;
use http::header::{self, HeaderMap, HeaderValue};
use http::{Response, StatusCode};

use crate::compression::Encoding;
use crate::error::StaticError;
use crate::mime::MimeEntry;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const TEXT_HTML: &str = "text/html; charset=utf-8";

const NOT_FOUND_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>404 - Page Not Found</title>
    <style>
        body { font-family: Arial, sans-serif; text-align: center; padding: 50px; }
        h1 { color: #D4AF37; }
    </style>
</head>
<body>
    <h1>404 - Page Not Found</h1>
    <p>The requested page could not be found.</p>
    <a href="/">&larr; Go back to homepage</a>
</body>
</html>
"#;

/// Everything needed to render a `200 OK` for a file.
pub(crate) struct FileResponse<'a> {
    pub(crate) mime: &'a MimeEntry,
    pub(crate) etag: &'a str,
    pub(crate) last_modified: &'a str,
    pub(crate) encoding: Option<Encoding>,
    pub(crate) body: Bytes,
}

impl FileResponse<'_> {
    pub(crate) fn build(self) -> Result<Response<Bytes>, StaticError> {
        let mut headers = HeaderMap::with_capacity(11);
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(self.mime.content_type),
        );
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_str(&format!("public, max-age={}", self.mime.cache_seconds))?,
        );
        headers.insert(header::ETAG, HeaderValue::from_str(self.etag)?);
        headers.insert(
            header::LAST_MODIFIED,
            HeaderValue::from_str(self.last_modified)?,
        );
        insert_security_headers(&mut headers);
        headers.insert(header::VARY, HeaderValue::from_static("Accept-Encoding"));
        headers.insert(header::CONTENT_LENGTH, self.body.len().into());
        if let Some(encoding) = self.encoding {
            headers.insert(
                header::CONTENT_ENCODING,
                HeaderValue::from_static(encoding.as_str()),
            );
        }

        Ok(with_headers(StatusCode::OK, headers, self.body))
    }
}

fn insert_security_headers(headers: &mut HeaderMap) {
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(header::X_XSS_PROTECTION, HeaderValue::from_static("1; mode=block"));
}

fn with_headers(status: StatusCode, headers: HeaderMap, body: Bytes) -> Response<Bytes> {
    let mut resp = Response::new(body);
    *resp.status_mut() = status;
    *resp.headers_mut() = headers;
    resp
}

fn with_body(status: StatusCode, content_type: &'static str, body: Bytes) -> Response<Bytes> {
    let mut headers = HeaderMap::with_capacity(2);
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(header::CONTENT_LENGTH, body.len().into());
    with_headers(status, headers, body)
}

/// 304: status line only, no body and no Content-Length.
pub(crate) fn not_modified() -> Response<Bytes> {
    with_headers(StatusCode::NOT_MODIFIED, HeaderMap::new(), Bytes::new())
}

pub(crate) fn forbidden() -> Response<Bytes> {
    with_body(StatusCode::FORBIDDEN, TEXT_PLAIN, Bytes::from_static(b"Forbidden"))
}

pub(crate) fn not_found() -> Response<Bytes> {
    with_body(
        StatusCode::NOT_FOUND,
        TEXT_HTML,
        Bytes::from_static(NOT_FOUND_PAGE.as_bytes()),
    )
}

pub(crate) fn internal_error() -> Response<Bytes> {
    with_body(
        StatusCode::INTERNAL_SERVER_ERROR,
        TEXT_PLAIN,
        Bytes::from_static(b"Internal Server Error"),
    )
}

/// Map a terminal error to the page the client sees.
pub(crate) fn for_error(err: &StaticError) -> Response<Bytes> {
    match err.status() {
        StatusCode::FORBIDDEN => forbidden(),
        StatusCode::NOT_FOUND => not_found(),
        _ => internal_error(),
    }
}
