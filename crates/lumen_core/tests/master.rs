use std::net::SocketAddr;
use std::time::Duration;

use lumen_config::LumenConfig;
use lumen_core::Master;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct Running {
    _dir: TempDir,
    addr: SocketAddr,
    stop: oneshot::Sender<()>,
    server: JoinHandle<anyhow::Result<()>>,
}

async fn start(files: &[(&str, &str)]) -> Running {
    let dir = tempfile::tempdir().expect("tempdir");
    for (name, contents) in files {
        std::fs::write(dir.path().join(name), contents).expect("write file");
    }

    let mut cfg = LumenConfig::default();
    cfg.server.listen = "127.0.0.1".into();
    cfg.server.port = 0;
    cfg.server.root = dir.path().to_string_lossy().into_owned();

    let master = Master::new(cfg).expect("master");
    let listener = master.bind().await.expect("bind");
    let addr = listener.local_addr().expect("local addr");

    let (stop, stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(master.serve(listener, async move {
        let _ = stopped.await;
    }));

    Running {
        _dir: dir,
        addr,
        stop,
        server,
    }
}

async fn fetch(addr: SocketAddr, raw: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.expect("connect");
    stream.write_all(raw.as_bytes()).await.expect("write");
    let mut out = Vec::new();
    stream.read_to_end(&mut out).await.expect("read");
    String::from_utf8_lossy(&out).into_owned()
}

#[tokio::test]
async fn serves_index_over_loopback() {
    let running = start(&[("index.html", "hi")]).await;

    let out = fetch(running.addr, "GET / HTTP/1.1\r\nHost: x\r\nConnection: close\r\n\r\n").await;

    assert!(out.starts_with("HTTP/1.1 200 OK\r\n"), "{out}");
    assert!(out.contains("content-type: text/html; charset=utf-8\r\n"));
    assert!(out.contains("cache-control: public, max-age=300\r\n"));
    assert!(out.ends_with("\r\n\r\nhi"));

    running.stop.send(()).expect("stop");
    running.server.await.expect("join").expect("serve");
}

#[tokio::test]
async fn traversal_is_forbidden_over_loopback() {
    let running = start(&[("index.html", "hi")]).await;

    let out = fetch(
        running.addr,
        "GET /../../etc/passwd HTTP/1.1\r\nConnection: close\r\n\r\n",
    )
    .await;

    assert!(out.starts_with("HTTP/1.1 403 Forbidden\r\n"), "{out}");
    assert!(out.ends_with("\r\n\r\nForbidden"));

    running.stop.send(()).expect("stop");
    running.server.await.expect("join").expect("serve");
}

#[tokio::test]
async fn shutdown_closes_idle_keep_alive_connections() {
    let running = start(&[("index.html", "hi")]).await;

    let mut stream = TcpStream::connect(running.addr).await.expect("connect");
    stream
        .write_all(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n")
        .await
        .expect("write");

    let mut first = [0u8; 1024];
    let n = stream.read(&mut first).await.expect("read");
    let head = String::from_utf8_lossy(&first[..n]).into_owned();
    assert!(head.contains("Connection: keep-alive\r\n"), "{head}");

    running.stop.send(()).expect("stop");
    tokio::time::timeout(Duration::from_secs(5), running.server)
        .await
        .expect("drained in time")
        .expect("join")
        .expect("serve");

    let mut rest = Vec::new();
    stream.read_to_end(&mut rest).await.expect("eof");
}

#[tokio::test]
async fn listener_stops_accepting_after_shutdown() {
    let running = start(&[("index.html", "hi")]).await;
    let addr = running.addr;

    running.stop.send(()).expect("stop");
    running.server.await.expect("join").expect("serve");

    assert!(TcpStream::connect(addr).await.is_err());
}
