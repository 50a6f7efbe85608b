use axum::body::Body;
use axum::http::{HeaderValue, Request};
use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use tus_axum::TusApp;
use tus_core::{MemoryStore, TusConfig, TusServer, UploadHooks, UploadResource};

const METADATA: &str = "filename d29ybGRfZG9taW5hdGlvbl9wbGFuLnBkZg==";

fn app() -> TusApp {
    let server = TusServer::new(MemoryStore::new(), TusConfig::new()).unwrap();
    TusApp::new(server, "/files")
}

fn bounded_app(max_size: u64) -> TusApp {
    let server = TusServer::new(MemoryStore::new(), TusConfig::new().with_max_size(max_size)).unwrap();
    TusApp::new(server, "/files")
}

async fn send(app: &TusApp, req: Request<Body>) -> Response {
    app.router.clone().oneshot(req).await.unwrap()
}

fn header<'a>(res: &'a Response, name: &str) -> Option<&'a str> {
    res.headers().get(name).and_then(|v| v.to_str().ok())
}

async fn json_body(res: Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn tus(method: &str, uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("tus-resumable", "1.0.0")
}

async fn create(app: &TusApp, length: u64) -> String {
    let res = send(
        app,
        tus("POST", "/files")
            .header("upload-length", length.to_string())
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(res.status().as_u16(), 201);
    header(&res, "location").unwrap().to_string()
}

fn patch(location: &str, offset: u64, body: &'static str) -> Request<Body> {
    tus("PATCH", location)
        .header("upload-offset", offset.to_string())
        .header("content-type", "application/offset+octet-stream")
        .body(Body::from(body))
        .unwrap()
}

fn head(location: &str) -> Request<Body> {
    tus("HEAD", location).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn missing_tus_resumable_is_a_precondition_failure() {
    let app = app();
    let res = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/files")
            .header("upload-length", "10")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(res.status().as_u16(), 412);
    assert_eq!(header(&res, "tus-version"), Some("1.0.0"));
    assert_eq!(header(&res, "tus-resumable"), Some("1.0.0"));
    let body = json_body(res).await;
    assert_eq!(body["name"], "PreconditionFailed");
    assert_eq!(body["message"], "Tus-Resumable Required");
    assert_eq!(body["className"], "precondition-failed");
}

#[tokio::test]
async fn invalid_headers_are_reported_by_name_and_value() {
    let app = app();
    let res = send(
        &app,
        tus("POST", "/files")
            .header("upload-length", "ten")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(res.status().as_u16(), 412);
    let body = json_body(res).await;
    assert_eq!(body["errors"]["headers"], json!([["upload-length", "ten"]]));
}

#[tokio::test]
async fn create_then_inspect() {
    let app = app();
    let res = send(
        &app,
        tus("POST", "/files")
            .header("upload-length", "11")
            .header("upload-metadata", METADATA)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(res.status().as_u16(), 201);
    assert_eq!(header(&res, "tus-resumable"), Some("1.0.0"));
    let location = header(&res, "location").unwrap().to_string();
    assert!(location.starts_with("/files/"));

    let res = send(&app, head(&location)).await;
    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(header(&res, "upload-offset"), Some("0"));
    assert_eq!(header(&res, "upload-length"), Some("11"));
    assert_eq!(header(&res, "upload-metadata"), Some(METADATA));
    assert_eq!(header(&res, "cache-control"), Some("no-store"));
    assert!(header(&res, "upload-defer-length").is_none());
}

#[tokio::test]
async fn create_without_length_is_rejected() {
    let app = app();
    let res = send(&app, tus("POST", "/files").body(Body::empty()).unwrap()).await;

    assert_eq!(res.status().as_u16(), 412);
    let body = json_body(res).await;
    assert_eq!(body["message"], "Missing Upload-Length header");
}

#[tokio::test]
async fn create_over_max_size_carries_the_cap() {
    let app = bounded_app(100_000);
    let res = send(
        &app,
        tus("POST", "/files")
            .header("upload-length", "150000")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(res.status().as_u16(), 413);
    assert_eq!(header(&res, "tus-max-size"), Some("100000"));
    let body = json_body(res).await;
    assert_eq!(body["errors"]["headers"], json!([["upload-length", "150000"]]));
}

#[tokio::test]
async fn zero_length_create_is_rejected() {
    let app = app();
    let res = send(
        &app,
        tus("POST", "/files")
            .header("upload-length", "0")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(res.status().as_u16(), 412);
    let body = json_body(res).await;
    assert_eq!(body["errors"]["headers"], json!([["upload-length", "0"]]));
}

#[tokio::test]
async fn collection_path_accepts_a_trailing_slash() {
    let app = app();
    let res = send(
        &app,
        tus("POST", "/files/")
            .header("upload-length", "3")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(res.status().as_u16(), 201);
    let location = header(&res, "location").unwrap().to_string();
    assert!(location.starts_with("/files/"));
    assert!(!location.starts_with("/files//"));

    let res = send(&app, head(&location)).await;
    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(header(&res, "upload-length"), Some("3"));

    let res = send(
        &app,
        Request::builder()
            .method("OPTIONS")
            .uri("/files/")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(res.status().as_u16(), 204);
    assert!(header(&res, "tus-extension").is_some());
}

#[tokio::test]
async fn unmatched_paths_still_carry_the_version() {
    let app = app();
    let res = send(&app, tus("GET", "/elsewhere").body(Body::empty()).unwrap()).await;

    assert_eq!(res.status().as_u16(), 404);
    assert_eq!(header(&res, "tus-resumable"), Some("1.0.0"));
}

#[tokio::test]
async fn appends_advance_the_offset() {
    let app = app();
    let location = create(&app, 11).await;

    let res = send(&app, patch(&location, 0, "hello")).await;
    assert_eq!(res.status().as_u16(), 204);
    assert_eq!(header(&res, "upload-offset"), Some("5"));

    let res = send(&app, patch(&location, 5, " world")).await;
    assert_eq!(res.status().as_u16(), 204);
    assert_eq!(header(&res, "upload-offset"), Some("11"));

    let res = send(&app, head(&location)).await;
    assert_eq!(header(&res, "upload-offset"), Some("11"));
}

#[tokio::test]
async fn stale_offset_is_a_conflict() {
    let app = app();
    let location = create(&app, 20).await;

    let res = send(&app, patch(&location, 10, "hello")).await;
    assert_eq!(res.status().as_u16(), 409);
    let body = json_body(res).await;
    assert_eq!(body["errors"]["headers"], json!([["upload-offset", "10"]]));

    let res = send(&app, head(&location)).await;
    assert_eq!(header(&res, "upload-offset"), Some("0"));
}

#[tokio::test]
async fn append_requires_offset_content_type() {
    let app = app();
    let location = create(&app, 5).await;

    let res = send(
        &app,
        tus("PATCH", &location)
            .header("upload-offset", "0")
            .header("content-type", "text/plain")
            .body(Body::from("hello"))
            .unwrap(),
    )
    .await;

    assert_eq!(res.status().as_u16(), 412);
    let body = json_body(res).await;
    assert_eq!(body["errors"]["headers"], json!([["content-type", "text/plain"]]));
}

#[tokio::test]
async fn unknown_upload_is_not_found() {
    let app = app();
    let res = send(&app, head("/files/does-not-exist")).await;

    assert_eq!(res.status().as_u16(), 404);
    assert!(header(&res, "upload-offset").is_none());

    let res = send(&app, patch("/files/does-not-exist", 0, "x")).await;
    assert_eq!(res.status().as_u16(), 404);
}

#[tokio::test]
async fn oversized_body_aborts_without_moving_offset() {
    let app = app();
    let location = create(&app, 5).await;

    let res = send(&app, patch(&location, 0, "hello!")).await;
    assert_eq!(header(&res, "connection"), Some("close"));
    assert!(res.into_body().collect().await.is_err());

    let res = send(&app, head(&location)).await;
    assert_eq!(header(&res, "upload-offset"), Some("0"));
}

#[tokio::test]
async fn deferred_length_is_resolved_by_an_append() {
    let app = app();
    let res = send(
        &app,
        tus("POST", "/files")
            .header("upload-defer-length", "1")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(res.status().as_u16(), 201);
    let location = header(&res, "location").unwrap().to_string();

    let res = send(&app, head(&location)).await;
    assert_eq!(header(&res, "upload-defer-length"), Some("1"));
    assert!(header(&res, "upload-length").is_none());

    let res = send(
        &app,
        tus("PATCH", &location)
            .header("upload-offset", "0")
            .header("upload-length", "3")
            .header("content-type", "application/offset+octet-stream")
            .body(Body::from("abc"))
            .unwrap(),
    )
    .await;
    assert_eq!(res.status().as_u16(), 204);

    let res = send(&app, head(&location)).await;
    assert_eq!(header(&res, "upload-length"), Some("3"));
    assert!(header(&res, "upload-defer-length").is_none());

    let res = send(
        &app,
        tus("PATCH", &location)
            .header("upload-offset", "3")
            .header("upload-length", "9")
            .header("content-type", "application/offset+octet-stream")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(res.status().as_u16(), 412);
    let body = json_body(res).await;
    assert_eq!(body["errors"]["headers"], json!([["upload-length", "9"]]));
}

#[tokio::test]
async fn discovery_advertises_extensions() {
    let app = bounded_app(1_000);
    let res = send(
        &app,
        Request::builder()
            .method("OPTIONS")
            .uri("/files")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(res.status().as_u16(), 204);
    assert_eq!(header(&res, "tus-resumable"), Some("1.0.0"));
    assert_eq!(header(&res, "tus-version"), Some("1.0.0"));
    assert_eq!(
        header(&res, "tus-extension"),
        Some("creation,creation-defer-length,termination")
    );
    assert_eq!(header(&res, "tus-max-size"), Some("1000"));
    assert_eq!(header(&res, "cache-control"), Some("max-age=86400"));
}

#[tokio::test]
async fn terminated_uploads_are_gone() {
    let app = app();
    let location = create(&app, 4).await;

    let res = send(&app, tus("DELETE", &location).body(Body::empty()).unwrap()).await;
    assert_eq!(res.status().as_u16(), 204);

    let res = send(&app, head(&location)).await;
    assert_eq!(res.status().as_u16(), 404);
}

#[tokio::test]
async fn request_id_is_generated_or_preserved() {
    let app = app();
    let res = send(&app, head("/files/missing")).await;
    assert!(res.headers().get("x-request-id").is_some());

    let provided = HeaderValue::from_static("req-test-123");
    let res = send(
        &app,
        tus("HEAD", "/files/missing")
            .header("x-request-id", provided.clone())
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(res.headers().get("x-request-id").unwrap(), &provided);
}

#[tokio::test]
async fn cors_exposes_protocol_headers() {
    let server = TusServer::new(MemoryStore::new(), TusConfig::new()).unwrap();
    let app = TusApp::new(server, "/files").with_cors();

    let res = send(
        &app,
        Request::builder()
            .method("OPTIONS")
            .uri("/files")
            .header("origin", "https://example.com")
            .header("access-control-request-method", "PATCH")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(
        header(&res, "access-control-allow-origin"),
        Some("https://example.com")
    );
    assert_eq!(header(&res, "access-control-max-age"), Some("86400"));

    let location = create(&app, 1).await;
    let res = send(
        &app,
        tus("HEAD", &location)
            .header("origin", "https://example.com")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    let exposed = header(&res, "access-control-expose-headers").unwrap();
    assert!(exposed.contains("upload-offset"));
}

struct FailingHooks;

#[async_trait::async_trait]
impl UploadHooks for FailingHooks {
    async fn on_upload_completed(&self, _upload: &UploadResource) -> anyhow::Result<()> {
        anyhow::bail!("indexer exploded")
    }
}

#[tokio::test]
async fn failing_completion_hook_is_a_general_error() {
    let server = TusServer::new(MemoryStore::new(), TusConfig::new())
        .unwrap()
        .with_hooks(FailingHooks);
    let app = TusApp::new(server, "/files");
    let location = create(&app, 2).await;

    let res = send(&app, patch(&location, 0, "ok")).await;
    assert_eq!(res.status().as_u16(), 500);
    let body = json_body(res).await;
    assert_eq!(body["name"], "GeneralError");
    assert!(!body["message"].as_str().unwrap().contains("indexer"));
}
