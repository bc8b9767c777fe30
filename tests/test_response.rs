use ferry::http::mime::content_type_for;
use ferry::http::response::{Response, ResponseBuilder, StatusCode};
use ferry::http::writer::{ResponseWriter, serialize_response};
use std::path::Path;

#[test]
fn test_status_code_as_u16() {
    assert_eq!(StatusCode::Ok.as_u16(), 200);
    assert_eq!(StatusCode::MovedPermanently.as_u16(), 301);
    assert_eq!(StatusCode::NotFound.as_u16(), 404);
}

#[test]
fn test_status_code_reason_phrase() {
    assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    assert_eq!(StatusCode::MovedPermanently.reason_phrase(), "Moved Permanently");
    assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
}

#[test]
fn test_status_code_from_u16() {
    assert_eq!(StatusCode::from_u16(301), Some(StatusCode::MovedPermanently));
    assert_eq!(StatusCode::from_u16(500), None);
}

#[test]
fn test_response_builder_basic() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .body(b"Hello, World!".to_vec())
        .build();

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.body, b"Hello, World!".to_vec());
}

#[test]
fn test_response_builder_content_length_always_matches_body() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Length", "999")
        .body(b"test".to_vec())
        .build();

    assert_eq!(response.headers.get("Content-Length"), Some("4"));
    assert_eq!(response.headers.len(), 1);
}

#[test]
fn test_response_ok_helper() {
    let response = Response::ok(vec![0xff, 0xd8, 0x00], "image/jpeg");

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.headers.get("Content-Type"), Some("image/jpeg"));
    assert_eq!(response.headers.get("Content-Length"), Some("3"));
}

#[test]
fn test_response_moved_permanently_helper() {
    let response = Response::moved_permanently("/result.html");

    assert_eq!(response.status, StatusCode::MovedPermanently);
    assert_eq!(response.headers.get("Location"), Some("/result.html"));
    assert!(response.body.is_empty());
}

#[test]
fn test_response_not_found_helper() {
    let response = Response::not_found();

    assert_eq!(response.status, StatusCode::NotFound);
    assert!(response.body.is_empty());
    assert_eq!(response.headers.get("Content-Length"), Some("0"));
}

#[test]
fn test_serialize_not_found() {
    let bytes = serialize_response(&Response::not_found());
    assert_eq!(bytes, b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n".to_vec());
}

#[test]
fn test_serialize_redirect() {
    let bytes = serialize_response(&Response::moved_permanently("/result.html"));
    assert_eq!(
        bytes,
        b"HTTP/1.1 301 Moved Permanently\r\nLocation: /result.html\r\nContent-Length: 0\r\n\r\n"
            .to_vec()
    );
}

#[test]
fn test_serialize_binary_body_untouched() {
    let body: Vec<u8> = (0..=255).collect();
    let bytes = serialize_response(&Response::ok(body.clone(), "image/jpeg"));

    assert!(bytes.ends_with(&body));
}

#[tokio::test]
async fn test_response_writer_writes_everything() {
    let response = Response::ok(b"<html></html>".to_vec(), content_type_for(Path::new("x.html")));
    let mut writer = ResponseWriter::new(&response);
    let expected = serialize_response(&response);

    let mut sink = Vec::new();
    writer.write_to_stream(&mut sink).await.unwrap();

    assert_eq!(sink, expected);
}
