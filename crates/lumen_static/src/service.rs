use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

use bytes::Bytes;
use http::header::ACCEPT_ENCODING;
use http::{Request, Response};
use tokio::fs as tokio_fs;
use tracing::{debug, warn};

use lumen_cache::{CachePolicy, ContentCache};

use crate::compression::{Encoding, compress_body, negotiate};
use crate::conditional::Validators;
use crate::error::StaticError;
use crate::etag::{entity_tag, last_modified_header};
use crate::fs::{PathResolver, ResolvedPath};
use crate::mime::{MimeEntry, MimeRegistry};
use crate::response::{self, FileResponse};

/// Serves files under one document root.
///
/// Cheap to share behind an `Arc`; the only mutable state is the content
/// cache, which is itself shared with the sweeper.
#[derive(Debug)]
pub struct StaticService {
    resolver: PathResolver,
    mime: MimeRegistry,
    cache: Arc<ContentCache>,
}

/// Per-request view of what is being served and what the client sent.
struct RequestContext<'a> {
    url_path: &'a str,
    resolved: ResolvedPath,
    mime: &'a MimeEntry,
    accept_encoding: Option<&'a str>,
    validators: Validators,
}

/// File contents plus the mtime used for validators.
struct LoadedFile {
    data: Bytes,
    last_modified: SystemTime,
}

impl StaticService {
    pub fn new(
        root: impl AsRef<Path>,
        index: impl Into<String>,
        cache: Arc<ContentCache>,
    ) -> io::Result<Self> {
        Ok(Self {
            resolver: PathResolver::new(root, index)?,
            mime: MimeRegistry::default(),
            cache,
        })
    }

    pub fn root(&self) -> &Path {
        self.resolver.root()
    }

    /// Produce the response for `req`. Never fails: every error becomes an
    /// error page.
    pub async fn handle<B>(&self, req: &Request<B>) -> Response<Bytes> {
        match self.serve(req).await {
            Ok(resp) => resp,
            Err(err) => {
                match &err {
                    StaticError::Forbidden | StaticError::NotFound { .. } => debug!(
                        target: "lumen::static",
                        path = %req.uri().path(),
                        error = %err,
                        "Request rejected"
                    ),
                    _ => warn!(
                        target: "lumen::static",
                        path = %req.uri().path(),
                        error = %err,
                        "Unexpected failure while serving"
                    ),
                }
                response::for_error(&err)
            }
        }
    }

    async fn serve<B>(&self, req: &Request<B>) -> Result<Response<Bytes>, StaticError> {
        let ctx = self.context(req)?;
        self.resolver.confine(&ctx.resolved).await?;
        let file = self.load(&ctx.resolved).await?;

        let etag = entity_tag(file.last_modified, file.data.len());
        if ctx.validators.not_modified(&etag, file.last_modified) {
            debug!(target: "lumen::static", path = %ctx.url_path, %etag, "Not modified");
            return Ok(response::not_modified());
        }

        let (body, encoding) = match negotiate(ctx.accept_encoding, ctx.mime.content_type) {
            Some(encoding) => {
                let result = compress_body(file.data.clone(), encoding).await;
                encoded_or_plain(ctx.url_path, file.data, encoding, result)
            }
            None => (file.data, None),
        };

        FileResponse {
            mime: ctx.mime,
            etag: &etag,
            last_modified: &last_modified_header(file.last_modified),
            encoding,
            body,
        }
        .build()
    }

    fn context<'a, B>(&'a self, req: &'a Request<B>) -> Result<RequestContext<'a>, StaticError> {
        let url_path = req.uri().path();
        let resolved = self.resolver.resolve(url_path)?;
        let mime = self.mime.lookup(&resolved.extension);
        let accept_encoding = req
            .headers()
            .get(ACCEPT_ENCODING)
            .and_then(|value| value.to_str().ok());

        Ok(RequestContext {
            url_path,
            mime,
            accept_encoding,
            validators: Validators::from_headers(req.headers()),
            resolved,
        })
    }

    /// Cache first, then disk. Failed reads leave the cache untouched.
    async fn load(&self, resolved: &ResolvedPath) -> Result<LoadedFile, StaticError> {
        if let Some(entry) = self.cache.get(&resolved.path) {
            return Ok(LoadedFile {
                data: entry.data,
                last_modified: entry.last_modified,
            });
        }

        let data = tokio_fs::read(&resolved.path)
            .await
            .map(Bytes::from)
            .map_err(|source| StaticError::NotFound {
                path: resolved.path.clone(),
                source,
            })?;

        let last_modified = mtime_or_now(&resolved.path, modified_time(&resolved.path).await);

        if CachePolicy::is_cacheable(&resolved.extension) {
            self.cache
                .put(resolved.path.clone(), data.clone(), last_modified);
        }

        Ok(LoadedFile {
            data,
            last_modified,
        })
    }
}

async fn modified_time(path: &Path) -> io::Result<SystemTime> {
    tokio_fs::metadata(path).await?.modified()
}

/// Keep the compressed body, or fall back to the plain one if the encoder
/// failed.
fn encoded_or_plain(
    url_path: &str,
    plain: Bytes,
    encoding: Encoding,
    result: Result<Bytes, StaticError>,
) -> (Bytes, Option<Encoding>) {
    match result {
        Ok(compressed) => (compressed, Some(encoding)),
        Err(err) => {
            warn!(
                target: "lumen::static",
                path = %url_path,
                error = %err,
                "Sending uncompressed body"
            );
            (plain, None)
        }
    }
}

fn mtime_or_now(path: &Path, result: io::Result<SystemTime>) -> SystemTime {
    match result {
        Ok(mtime) => mtime,
        Err(source) => {
            let err = StaticError::MetadataUnavailable {
                path: path.to_path_buf(),
                source,
            };
            warn!(target: "lumen::static", error = %err, "Using current time as mtime");
            SystemTime::now()
        }
    }
}
