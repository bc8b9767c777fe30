use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use ferry::http::response::StatusCode;
use ferry::server::{Route, Router};
use tempfile::TempDir;

const JPEG: &[u8] = &[0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x0d, 0x0a];

fn fixture() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    fs::create_dir_all(root.join("a/b")).unwrap();
    fs::create_dir_all(root.join("c/img")).unwrap();
    fs::write(root.join("index.html"), "<html>index</html>").unwrap();
    fs::write(root.join("result.html"), "<html>result</html>").unwrap();
    fs::write(root.join("a/b/ref.html"), "<html>ref</html>").unwrap();
    fs::write(root.join("a/b/1.jpg"), JPEG).unwrap();
    fs::write(root.join("c/footube.css"), "body {}").unwrap();

    dir
}

fn router(root: &Path) -> Router {
    let mut redirects = BTreeMap::new();
    redirects.insert("/redirect".to_string(), "/result.html".to_string());
    Router::new(root, "index.html", redirects).unwrap()
}

#[tokio::test]
async fn test_existing_files_are_served() {
    let dir = fixture();
    let router = router(dir.path());

    for path in ["/index.html", "/result.html", "/a/b/ref.html", "/c/footube.css"] {
        match router.lookup(path).await {
            Route::Serve(file) => assert!(file.ends_with(path.trim_start_matches('/'))),
            other => panic!("{path}: expected Serve, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_root_serves_index() {
    let dir = fixture();
    let router = router(dir.path());

    let response = router.respond("/").await;

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.body, b"<html>index</html>".to_vec());
}

#[tokio::test]
async fn test_binary_file_bytes_and_headers() {
    let dir = fixture();
    let router = router(dir.path());

    let response = router.respond("/a/b/1.jpg").await;

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.body, JPEG.to_vec());
    assert_eq!(response.headers.get("Content-Type"), Some("image/jpeg"));
    assert_eq!(
        response.headers.get("Content-Length"),
        Some(JPEG.len().to_string().as_str())
    );
}

#[tokio::test]
async fn test_redirect_rule() {
    let dir = fixture();
    let router = router(dir.path());

    assert_eq!(
        router.lookup("/redirect").await,
        Route::Redirect("/result.html".to_string())
    );

    let response = router.respond("/redirect").await;
    assert_eq!(response.status, StatusCode::MovedPermanently);
    assert_eq!(response.headers.get("Location"), Some("/result.html"));
}

#[tokio::test]
async fn test_malformed_and_missing_paths_are_not_found() {
    let dir = fixture();
    let router = router(dir.path());

    let bad = [
        "",
        "Roee",
        "bad.html",
        "/a",
        "/a/b",
        "/a/b/",
        "/a/b/1",
        "/a/b/1.",
        "/a/b/1.j",
        "/a/b/1.jp",
        "//",
        "index.html",
        "index.html/",
        "/index.html/",
        "//index.html",
        "/non_existent_file.html",
        "/../index.html",
        "/a/../index.html",
        "/redirect/",
    ];

    for path in bad {
        assert_eq!(router.lookup(path).await, Route::NotFound, "path {path:?}");

        let response = router.respond(path).await;
        assert_eq!(response.status, StatusCode::NotFound, "path {path:?}");
        assert!(response.body.is_empty());
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlink_out_of_root_is_not_found() {
    let dir = fixture();
    let outside = tempfile::tempdir().unwrap();
    fs::write(outside.path().join("secret.txt"), "secret").unwrap();
    std::os::unix::fs::symlink(outside.path().join("secret.txt"), dir.path().join("leak.txt"))
        .unwrap();

    let router = router(dir.path());

    assert_eq!(router.lookup("/leak.txt").await, Route::NotFound);
}

#[test]
fn test_missing_root_is_an_error() {
    let result = Router::new("/definitely/not/a/root", "index.html", BTreeMap::new());
    assert!(result.is_err());
}
