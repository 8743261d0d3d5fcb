mod common;

use std::{
    io::{BufRead, BufReader, Read, Write},
    net::{TcpListener, TcpStream},
    thread::JoinHandle,
    time::{Duration, Instant},
};

use cascade_framing::{CascadeError, OllamaClient, VisionModel, config::VisionConfig};
use common::{scratch_dir, write_png};

struct Captured {
    request_line: String,
    body: String,
}

/// Serve exactly one request, answering with `respond`, and return what was received.
fn serve_once<F>(respond: F) -> (String, JoinHandle<Captured>)
where
    F: FnOnce(&mut TcpStream) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let handle = std::thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());

        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();
        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':')
                && name.eq_ignore_ascii_case("content-length")
            {
                content_length = value.trim().parse().unwrap();
            }
        }
        let mut buf = vec![0u8; content_length];
        reader.read_exact(&mut buf).unwrap();

        let mut stream = stream;
        respond(&mut stream);

        Captured {
            request_line: request_line.trim_end().to_string(),
            body: String::from_utf8(buf).unwrap(),
        }
    });
    (base_url, handle)
}

fn one_shot(status: &'static str, body: &'static str) -> (String, JoinHandle<Captured>) {
    serve_once(move |stream| {
        write!(
            stream,
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
        .unwrap();
        stream.flush().unwrap();
    })
}

fn client_for(base_url: &str) -> OllamaClient {
    OllamaClient::new(&VisionConfig {
        base_url: base_url.to_string(),
        model: "llava".to_string(),
        ..VisionConfig::default()
    })
    .unwrap()
}

#[test]
fn critique_posts_base64_image_and_returns_response_verbatim() {
    let dir = scratch_dir("vision_ok");
    let image = dir.join("camera_test_wide_angle.png");
    write_png(&image);

    let (url, server) = one_shot(
        "200 OK",
        r#"{"model":"llava","response":"Characters are centred; waterfall is cropped.","done":true}"#,
    );
    let text = client_for(&url)
        .critique(&image, "Evaluate the framing")
        .unwrap();
    assert_eq!(text, "Characters are centred; waterfall is cropped.");

    let captured = server.join().unwrap();
    assert_eq!(captured.request_line, "POST /api/generate HTTP/1.1");
    let body: serde_json::Value = serde_json::from_str(&captured.body).unwrap();
    assert_eq!(body["model"], "llava");
    assert_eq!(body["prompt"], "Evaluate the framing");
    assert_eq!(body["stream"], false);
    assert!(body.get("format").is_none());
    let images = body["images"].as_array().unwrap();
    assert_eq!(images.len(), 1);
    // PNG signature, base64-encoded.
    assert!(images[0].as_str().unwrap().starts_with("iVBORw0KGgo"));
}

#[test]
fn compare_sends_both_images() {
    let dir = scratch_dir("vision_compare");
    let a = dir.join("a.png");
    let b = dir.join("b.png");
    write_png(&a);
    write_png(&b);

    let (url, server) = one_shot("200 OK", r#"{"response":"A is better."}"#);
    let text = client_for(&url).compare(&a, &b, "Which is better?").unwrap();
    assert_eq!(text, "A is better.");

    let body: serde_json::Value = serde_json::from_str(&server.join().unwrap().body).unwrap();
    assert_eq!(body["images"].as_array().unwrap().len(), 2);
}

#[test]
fn non_200_reports_status_and_body() {
    let dir = scratch_dir("vision_500");
    let image = dir.join("render.png");
    write_png(&image);

    let (url, server) = one_shot("500 Internal Server Error", r#"{"error":"model not loaded"}"#);
    let err = client_for(&url).critique(&image, "describe").unwrap_err();
    server.join().unwrap();

    match &err {
        CascadeError::Service { status, message } => {
            assert_eq!(*status, Some(500));
            assert!(message.contains("model not loaded"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.is_recoverable());
}

#[test]
fn truncated_error_body_is_reported_with_the_status() {
    let dir = scratch_dir("vision_truncated");
    let image = dir.join("render.png");
    write_png(&image);

    // Promises more body bytes than it sends, then hangs up.
    let (url, server) = serve_once(|stream| {
        write!(
            stream,
            "HTTP/1.1 502 Bad Gateway\r\nContent-Length: 100\r\nConnection: close\r\n\r\nupstream"
        )
        .unwrap();
        stream.flush().unwrap();
    });
    let err = client_for(&url).critique(&image, "describe").unwrap_err();
    server.join().unwrap();

    match &err {
        CascadeError::Service { status, message } => {
            assert_eq!(*status, Some(502));
            assert!(message.contains("response body unreadable"), "{message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn silent_server_times_out_without_retry() {
    let dir = scratch_dir("vision_timeout");
    let image = dir.join("render.png");
    write_png(&image);

    let (url, _server) = serve_once(|_| std::thread::sleep(Duration::from_secs(3)));
    let client = OllamaClient::new(&VisionConfig {
        base_url: url,
        single_image_timeout_secs: 1,
        ..VisionConfig::default()
    })
    .unwrap();

    let started = Instant::now();
    let err = client.critique(&image, "describe").unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, CascadeError::Service { status: None, .. }));
    assert!(err.to_string().contains("timed out after 1s"), "{err}");
    assert!(elapsed < Duration::from_millis(2500), "took {elapsed:?}");
}

#[test]
fn tags_lists_models() {
    let (url, server) = one_shot(
        "200 OK",
        r#"{"models":[{"name":"llava:latest","size":4733363377},{"name":"bakllava"}]}"#,
    );
    let models = client_for(&url).list_models().unwrap();
    assert_eq!(server.join().unwrap().request_line, "GET /api/tags HTTP/1.1");

    let names: Vec<_> = models.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["llava:latest", "bakllava"]);
    assert_eq!(models[0].size, Some(4_733_363_377));
    assert_eq!(models[1].size, None);
}

#[test]
fn unreachable_endpoint_is_a_service_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let err = client_for(&url).list_models().unwrap_err();
    assert!(matches!(err, CascadeError::Service { status: None, .. }));
}

#[test]
fn non_image_file_is_rejected_without_a_request() {
    let dir = scratch_dir("vision_not_image");
    let path = dir.join("notes.png");
    std::fs::write(&path, b"definitely not a png").unwrap();

    // No server: the request must never be attempted.
    let err = client_for("http://127.0.0.1:9")
        .critique(&path, "describe")
        .unwrap_err();
    assert!(matches!(err, CascadeError::Validation(_)));
}
