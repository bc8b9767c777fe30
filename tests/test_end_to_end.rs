//! Client and server talking over loopback.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use ferry::client::Client;
use ferry::client::encoder::path_from_line;
use ferry::config::ClientConfig;
use ferry::server::{Router, listener};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const TEXT_FILES: [&str; 6] = [
    "/index.html",
    "/a/b/ref.html",
    "/c/footube.css",
    "/c/Footube.html",
    "/c/footube.js",
    "/result.html",
];

const IMAGES: [&str; 6] = [
    "/a/1.jpg",
    "/a/2.jpg",
    "/a/b/1.jpg",
    "/a/b/2.jpg",
    "/c/img/1.jpg",
    "/c/img/2.jpg",
];

/// Deterministic binary content covering every byte value, CR/LF included.
fn image_bytes(seed: usize, len: usize) -> Vec<u8> {
    let mut bytes = vec![0xff, 0xd8, 0xff, 0xe0];
    bytes.extend((0..len).map(|i| ((i * 31 + seed * 7) % 256) as u8));
    bytes
}

fn fixture() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    for sub in ["a/b", "c/img"] {
        fs::create_dir_all(root.join(sub)).unwrap();
    }
    for path in TEXT_FILES {
        let rel = path.trim_start_matches('/');
        fs::write(root.join(rel), format!("<!-- {rel} -->\n<p>content of {rel}</p>\n")).unwrap();
    }
    for (i, path) in IMAGES.iter().enumerate() {
        // Larger than one socket read.
        fs::write(root.join(path.trim_start_matches('/')), image_bytes(i, 200_000 + i)).unwrap();
    }

    dir
}

async fn spawn_server(root: &Path, idle_timeout: Duration) -> u16 {
    let mut redirects = BTreeMap::new();
    redirects.insert("/redirect".to_string(), "/result.html".to_string());
    let router = Arc::new(Router::new(root, "index.html", redirects).unwrap());

    let tcp = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = tcp.local_addr().unwrap().port();
    tokio::spawn(listener::serve(tcp, router, idle_timeout));

    port
}

fn client(port: u16, out: &Path) -> Client {
    let cfg = ClientConfig {
        connect_timeout_ms: 1000,
        read_timeout_ms: 2000,
        output_dir: out.to_path_buf(),
    };
    Client::new("127.0.0.1", port, &cfg)
}

fn expected(root: &Path, path: &str) -> Vec<u8> {
    fs::read(root.join(path.trim_start_matches('/'))).unwrap()
}

#[tokio::test]
async fn test_existing_file() {
    let files = fixture();
    let out = tempfile::tempdir().unwrap();
    let port = spawn_server(files.path(), Duration::from_secs(5)).await;
    let mut client = client(port, out.path());

    let fetch = client.fetch("/index.html").await.unwrap();

    assert_eq!(fetch.status_lines(), vec!["HTTP/1.1 200 OK"]);
    assert_eq!(fetch.saved.as_deref(), Some(out.path().join("index.html").as_path()));
    assert_eq!(
        fs::read(out.path().join("index.html")).unwrap(),
        expected(files.path(), "/index.html")
    );
}

#[tokio::test]
async fn test_non_existent_file() {
    let files = fixture();
    let out = tempfile::tempdir().unwrap();
    let port = spawn_server(files.path(), Duration::from_secs(5)).await;
    let mut client = client(port, out.path());

    let fetch = client.fetch("/non_existent_file.html").await.unwrap();

    assert_eq!(fetch.status_lines(), vec!["HTTP/1.1 404 Not Found"]);
    assert!(fetch.responses[0].body.is_empty());
    assert!(fetch.saved.is_none());
}

#[tokio::test]
async fn test_redirect_is_followed() {
    let files = fixture();
    let out = tempfile::tempdir().unwrap();
    let port = spawn_server(files.path(), Duration::from_secs(5)).await;
    let mut client = client(port, out.path());

    let fetch = client.fetch("/redirect").await.unwrap();

    assert_eq!(
        fetch.status_lines(),
        vec!["HTTP/1.1 301 Moved Permanently", "HTTP/1.1 200 OK"]
    );
    assert_eq!(fetch.responses[0].location(), Some("/result.html"));
    assert_eq!(
        fs::read(out.path().join("result.html")).unwrap(),
        expected(files.path(), "/result.html")
    );
    assert!(!out.path().join("redirect").exists());
    assert_eq!(client.connection_manager().connections_opened(), 1);
}

#[tokio::test]
async fn test_sequential_requests_share_one_connection() {
    let files = fixture();
    let out = tempfile::tempdir().unwrap();
    let port = spawn_server(files.path(), Duration::from_secs(5)).await;
    let mut client = client(port, out.path());

    for path in TEXT_FILES {
        let fetch = client.fetch(path).await.unwrap();
        assert_eq!(fetch.status_lines(), vec!["HTTP/1.1 200 OK"], "{path}");

        let name = path.rsplit('/').next().unwrap();
        assert_eq!(
            fs::read(out.path().join(name)).unwrap(),
            expected(files.path(), path),
            "{path}"
        );
    }

    assert_eq!(client.connection_manager().connections_opened(), 1);
}

#[tokio::test]
async fn test_binary_files_are_byte_identical() {
    let files = fixture();
    let out = tempfile::tempdir().unwrap();
    let port = spawn_server(files.path(), Duration::from_secs(5)).await;
    let mut client = client(port, out.path());

    for path in IMAGES {
        let fetch = client.fetch(path).await.unwrap();
        let body = &fetch.final_response().unwrap().body;

        assert_eq!(&body[..], expected(files.path(), path).as_slice(), "{path}");
        // Same file names repeat across directories; each write overwrites.
        assert_eq!(
            fs::read(out.path().join(path.rsplit('/').next().unwrap())).unwrap(),
            expected(files.path(), path)
        );
    }

    assert_eq!(client.connection_manager().connections_opened(), 1);
}

#[tokio::test]
async fn test_malformed_paths_get_not_found() {
    let files = fixture();
    let out = tempfile::tempdir().unwrap();
    let port = spawn_server(files.path(), Duration::from_secs(5)).await;
    let mut client = client(port, out.path());

    let bad = [
        "Roee", "bad.html", "/a", "/a/b", "/a/b/", "/a/b/1", "/a/b/1.", "/a/b/1.j", "/a/b/1.jp",
        "//", "index.html", "index.html/", "/index.html/", "",
    ];

    for path in bad {
        let fetch = client.fetch(path).await.unwrap();
        assert_eq!(fetch.status_lines(), vec!["HTTP/1.1 404 Not Found"], "{path:?}");
    }

    // Still the same connection, and still serving.
    let fetch = client.fetch("/index.html").await.unwrap();
    assert_eq!(fetch.status_lines(), vec!["HTTP/1.1 200 OK"]);
    assert_eq!(client.connection_manager().connections_opened(), 1);
}

#[tokio::test]
async fn test_non_utf8_input_line_gets_not_found() {
    let files = fixture();
    let out = tempfile::tempdir().unwrap();
    let port = spawn_server(files.path(), Duration::from_secs(5)).await;
    let mut client = client(port, out.path());

    let input: &[&[u8]] = &[b"/index.html\r", b"/\xff.html", b"/index.html"];
    let mut lines = Vec::new();

    for raw in input {
        let path = path_from_line(raw);
        let fetch = client.fetch(&path).await.unwrap();
        lines.extend(fetch.status_lines());
    }

    assert_eq!(
        lines,
        vec!["HTTP/1.1 200 OK", "HTTP/1.1 404 Not Found", "HTTP/1.1 200 OK"]
    );
    assert_eq!(client.connection_manager().connections_opened(), 1);
}

#[tokio::test]
async fn test_reconnects_after_idle_timeout() {
    let files = fixture();
    let out = tempfile::tempdir().unwrap();
    let port = spawn_server(files.path(), Duration::from_millis(200)).await;
    let mut client = client(port, out.path());

    let fetch = client.fetch("/").await.unwrap();
    assert_eq!(fetch.status_lines(), vec!["HTTP/1.1 200 OK"]);

    tokio::time::sleep(Duration::from_millis(600)).await;

    let fetch = client.fetch("/").await.unwrap();
    assert_eq!(fetch.status_lines(), vec!["HTTP/1.1 200 OK"]);
    assert_eq!(
        fs::read(out.path().join("index.html")).unwrap(),
        expected(files.path(), "/index.html")
    );
    assert_eq!(client.connection_manager().connections_opened(), 2);
}

#[tokio::test]
async fn test_server_closes_idle_connection() {
    let files = fixture();
    let port = spawn_server(files.path(), Duration::from_millis(100)).await;

    let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    let mut buf = [0u8; 16];

    let n = tokio::time::timeout(Duration::from_secs(2), stream.read(&mut buf))
        .await
        .expect("server did not close the idle connection")
        .unwrap();
    assert_eq!(n, 0);
}

#[tokio::test]
async fn test_server_keeps_connection_after_malformed_request() {
    let files = fixture();
    let port = spawn_server(files.path(), Duration::from_secs(5)).await;

    let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    stream
        .write_all(b"Roee\r\n\r\nPOST /index.html HTTP/1.1\r\n\r\nGET /index.html HTTP/1.1\r\n\r\n")
        .await
        .unwrap();

    let body = expected(files.path(), "/index.html");
    let mut want = b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n".repeat(2);
    want.extend_from_slice(
        format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\n\r\n",
            body.len()
        )
        .as_bytes(),
    );
    want.extend_from_slice(&body);

    let mut got = vec![0u8; want.len()];
    tokio::time::timeout(Duration::from_secs(2), stream.read_exact(&mut got))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(got, want);
}
