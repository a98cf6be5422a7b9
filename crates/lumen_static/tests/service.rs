use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use flate2::read::{GzDecoder, ZlibDecoder};
use http::{Request, Response, StatusCode, header};
use lumen_cache::ContentCache;
use lumen_static::StaticService;
use tempfile::TempDir;

struct Site {
    dir: TempDir,
    cache: Arc<ContentCache>,
    service: StaticService,
}

impl Site {
    fn new(files: &[(&str, &[u8])]) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        for (name, contents) in files {
            write_file(dir.path(), name, contents);
        }
        let cache = Arc::new(ContentCache::new());
        let service =
            StaticService::new(dir.path(), "index.html", Arc::clone(&cache)).expect("service");
        Self {
            dir,
            cache,
            service,
        }
    }

    async fn get(&self, uri: &str, headers: &[(&str, &str)]) -> Response<Bytes> {
        let mut builder = Request::get(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let req = builder.body(()).expect("request");
        self.service.handle(&req).await
    }
}

fn write_file(root: &Path, name: &str, contents: &[u8]) {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("mkdir");
    }
    fs::write(&path, contents).expect("write");
}

fn set_mtime(root: &Path, name: &str, mtime: SystemTime) {
    File::options()
        .write(true)
        .open(root.join(name))
        .expect("open")
        .set_modified(mtime)
        .expect("set mtime");
}

fn header_str<'a>(resp: &'a Response<Bytes>, name: header::HeaderName) -> &'a str {
    resp.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

#[tokio::test]
async fn root_serves_index_document() {
    let site = Site::new(&[("index.html", b"hi")]);

    let resp = site.get("/", &[]).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(header_str(&resp, header::CONTENT_TYPE).starts_with("text/html"));
    assert_eq!(header_str(&resp, header::CACHE_CONTROL), "public, max-age=300");
    assert_eq!(header_str(&resp, header::CONTENT_LENGTH), "2");
    assert_eq!(resp.body().as_ref(), b"hi");
}

#[tokio::test]
async fn ok_response_carries_policy_and_security_headers() {
    let site = Site::new(&[("img/logo.png", b"\x89PNG....")]);
    let mtime = UNIX_EPOCH + Duration::from_millis(1_700_000_000_500);
    set_mtime(site.dir.path(), "img/logo.png", mtime);

    let resp = site.get("/img/logo.png", &[]).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header_str(&resp, header::CONTENT_TYPE), "image/png");
    assert_eq!(header_str(&resp, header::CACHE_CONTROL), "public, max-age=604800");
    assert_eq!(header_str(&resp, header::ETAG), "\"1700000000500-8\"");
    assert_eq!(
        header_str(&resp, header::LAST_MODIFIED),
        "Tue, 14 Nov 2023 22:13:20 GMT"
    );
    assert_eq!(header_str(&resp, header::X_CONTENT_TYPE_OPTIONS), "nosniff");
    assert_eq!(header_str(&resp, header::X_FRAME_OPTIONS), "DENY");
    assert_eq!(header_str(&resp, header::X_XSS_PROTECTION), "1; mode=block");
    assert_eq!(header_str(&resp, header::VARY), "Accept-Encoding");
    assert!(resp.headers().get(header::CONTENT_ENCODING).is_none());
}

#[tokio::test]
async fn unknown_extension_is_plain_text_without_caching() {
    let site = Site::new(&[("notes.md", b"# notes")]);

    let resp = site.get("/notes.md", &[]).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header_str(&resp, header::CONTENT_TYPE), "text/plain");
    assert_eq!(header_str(&resp, header::CACHE_CONTROL), "public, max-age=0");
}

#[tokio::test]
async fn missing_file_is_branded_404_and_not_cached() {
    let site = Site::new(&[("index.html", b"hi")]);

    let resp = site.get("/missing.png", &[]).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(header_str(&resp, header::CONTENT_TYPE).starts_with("text/html"));
    let body = String::from_utf8(resp.body().to_vec()).expect("utf-8");
    assert!(body.contains("404 - Page Not Found"));
    assert!(site.cache.is_empty());

    write_file(site.dir.path(), "missing.png", b"now here");
    let resp = site.get("/missing.png", &[]).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.body().as_ref(), b"now here");
}

#[tokio::test]
async fn traversal_is_forbidden() {
    let site = Site::new(&[("index.html", b"hi")]);

    for uri in ["/../../etc/passwd", "/css/%2e%2e/%2e%2e/etc/passwd"] {
        let resp = site.get(uri, &[]).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{uri}");
        assert_eq!(resp.body().as_ref(), b"Forbidden");
    }
}

#[cfg(unix)]
#[tokio::test]
async fn symlink_escaping_root_is_forbidden() {
    let site = Site::new(&[("index.html", b"hi")]);
    let outside = tempfile::tempdir().expect("outside");
    write_file(outside.path(), "secret.txt", b"TOP SECRET");
    std::os::unix::fs::symlink(outside.path(), site.dir.path().join("link")).expect("symlink");

    let resp = site.get("/link/secret.txt", &[]).await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(resp.body().as_ref(), b"Forbidden");
    assert!(site.cache.is_empty());
}

#[tokio::test]
async fn repeated_gets_are_identical() {
    let site = Site::new(&[("css/site.css", b"body { color: gold; }")]);

    let first = site.get("/css/site.css", &[]).await;
    let second = site.get("/css/site.css", &[]).await;

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(first.body(), second.body());
    assert_eq!(header_str(&first, header::ETAG), header_str(&second, header::ETAG));
    assert_eq!(site.cache.len(), 1);
}

#[tokio::test]
async fn matching_etag_yields_empty_304() {
    let site = Site::new(&[("app.js", b"console.log('hi');")]);

    let first = site.get("/app.js", &[]).await;
    let etag = header_str(&first, header::ETAG).to_string();

    let resp = site.get("/app.js", &[("if-none-match", etag.as_str())]).await;

    assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);
    assert!(resp.body().is_empty());
    assert!(resp.headers().get(header::CONTENT_LENGTH).is_none());
    assert!(resp.headers().get(header::CONTENT_ENCODING).is_none());
}

#[tokio::test]
async fn stale_etag_gets_full_body() {
    let site = Site::new(&[("app.js", b"console.log('hi');")]);

    let resp = site.get("/app.js", &[("if-none-match", "\"0-0\"")]).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.body().as_ref(), b"console.log('hi');");
}

#[tokio::test]
async fn if_modified_since_honours_mtime() {
    let site = Site::new(&[("data.json", b"{}")]);
    set_mtime(
        site.dir.path(),
        "data.json",
        UNIX_EPOCH + Duration::from_secs(1_700_000_000),
    );

    let first = site.get("/data.json", &[]).await;
    let last_modified = header_str(&first, header::LAST_MODIFIED).to_string();

    let same = site.get("/data.json", &[("if-modified-since", last_modified.as_str())]).await;
    assert_eq!(same.status(), StatusCode::NOT_MODIFIED);

    let older = site
        .get("/data.json", &[("if-modified-since", "Mon, 01 Jan 2001 00:00:00 GMT")])
        .await;
    assert_eq!(older.status(), StatusCode::OK);

    let garbage = site.get("/data.json", &[("if-modified-since", "soon")]).await;
    assert_eq!(garbage.status(), StatusCode::OK);
}

#[tokio::test]
async fn json_is_gzipped_when_accepted() {
    let payload = br#"{"photos":[{"id":1,"caption":"sunset"},{"id":2,"caption":"sunset"}]}"#.repeat(10);
    let site = Site::new(&[("feed.json", payload.as_slice())]);

    let plain = site.get("/feed.json", &[]).await;
    let gzipped = site.get("/feed.json", &[("accept-encoding", "gzip, deflate, br")]).await;

    assert_eq!(header_str(&gzipped, header::CONTENT_ENCODING), "gzip");
    assert_eq!(header_str(&gzipped, header::VARY), "Accept-Encoding");
    assert_eq!(
        header_str(&gzipped, header::CONTENT_LENGTH),
        gzipped.body().len().to_string()
    );
    assert_eq!(header_str(&plain, header::ETAG), header_str(&gzipped, header::ETAG));

    let mut decoded = Vec::new();
    GzDecoder::new(gzipped.body().as_ref())
        .read_to_end(&mut decoded)
        .expect("gzip body");
    assert_eq!(decoded, plain.body().as_ref());
}

#[tokio::test]
async fn deflate_used_when_gzip_absent() {
    let site = Site::new(&[("site.css", b"h1 { color: #D4AF37; } h2 { color: #D4AF37; }")]);

    let resp = site.get("/site.css", &[("accept-encoding", "deflate")]).await;

    assert_eq!(header_str(&resp, header::CONTENT_ENCODING), "deflate");
    let mut decoded = Vec::new();
    ZlibDecoder::new(resp.body().as_ref())
        .read_to_end(&mut decoded)
        .expect("zlib body");
    assert_eq!(decoded, b"h1 { color: #D4AF37; } h2 { color: #D4AF37; }");
}

#[tokio::test]
async fn images_are_never_compressed() {
    let png = b"\x89PNG\r\n\x1a\n0000000000000000";
    let site = Site::new(&[("photo.png", png)]);

    let resp = site.get("/photo.png", &[("accept-encoding", "gzip")]).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get(header::CONTENT_ENCODING).is_none());
    assert_eq!(header_str(&resp, header::VARY), "Accept-Encoding");
    assert_eq!(resp.body().as_ref(), png);
}

#[tokio::test]
async fn clear_forces_fresh_read_of_cached_assets() {
    let site = Site::new(&[("site.css", b"old")]);
    let first_mtime = UNIX_EPOCH + Duration::from_secs(1_600_000_000);
    set_mtime(site.dir.path(), "site.css", first_mtime);

    let first = site.get("/site.css", &[]).await;
    assert_eq!(first.body().as_ref(), b"old");

    write_file(site.dir.path(), "site.css", b"new!");
    set_mtime(
        site.dir.path(),
        "site.css",
        UNIX_EPOCH + Duration::from_secs(1_700_000_000),
    );

    let cached = site.get("/site.css", &[]).await;
    assert_eq!(cached.body().as_ref(), b"old");
    assert_eq!(
        header_str(&cached, header::LAST_MODIFIED),
        header_str(&first, header::LAST_MODIFIED)
    );

    assert_eq!(site.cache.clear(), 1);

    let fresh = site.get("/site.css", &[]).await;
    assert_eq!(fresh.body().as_ref(), b"new!");
    assert_eq!(
        header_str(&fresh, header::LAST_MODIFIED),
        "Tue, 14 Nov 2023 22:13:20 GMT"
    );
}

#[tokio::test]
async fn html_is_always_read_fresh() {
    let site = Site::new(&[("index.html", b"v1")]);

    assert_eq!(site.get("/", &[]).await.body().as_ref(), b"v1");
    assert!(site.cache.is_empty());

    write_file(site.dir.path(), "index.html", b"v2");
    assert_eq!(site.get("/index.html", &[]).await.body().as_ref(), b"v2");
    assert!(site.cache.is_empty());
}
