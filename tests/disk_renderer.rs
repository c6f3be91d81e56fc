use std::{
    collections::HashMap,
    fs,
    num::NonZeroUsize,
    path::Path,
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use axum::{Router, http::StatusCode, routing::get};
use bytes::Bytes;
use medusa::{
    application::{dispatcher::RenderDispatcher, renderer::RenderError},
    domain::paths::{StaticPath, static_paths},
    infra::disk::{DiskStaticSiteRenderer, HttpPageSource, PageSource},
};
use url::Url;

/// Serves page bodies from memory; unknown paths are a 404.
struct MemorySource {
    pages: HashMap<String, &'static str>,
}

impl MemorySource {
    fn new(pages: &[(&str, &'static str)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(path, body)| (path.to_string(), *body))
                .collect(),
        }
    }
}

#[async_trait]
impl PageSource for MemorySource {
    async fn fetch(&self, path: &StaticPath) -> Result<Bytes, RenderError> {
        self.pages
            .get(path.as_str())
            .map(|body| Bytes::from_static(body.as_bytes()))
            .ok_or_else(|| RenderError::Status {
                path: path.clone(),
                status: 404,
            })
    }
}

fn dispatcher(deploy: &Path, source: impl PageSource + 'static) -> RenderDispatcher {
    let renderer = DiskStaticSiteRenderer::new(
        deploy,
        Arc::new(source),
        NonZeroUsize::new(2).expect("non-zero"),
    )
    .expect("renderer builds");
    RenderDispatcher::new(Arc::new(renderer))
}

fn read(path: impl AsRef<Path>) -> String {
    fs::read_to_string(path).expect("file readable")
}

#[tokio::test]
async fn writes_scoped_paths_into_deploy_dir() {
    let dir = tempfile::tempdir().expect("tempdir");
    let deploy = dir.path().join("public");
    let source = MemorySource::new(&[
        ("/", "home"),
        ("/a/1", "article one"),
        ("/blog/", "blog index"),
    ]);

    dispatcher(&deploy, source)
        .update_paths(static_paths(["/", "/a/1", "/blog/"]))
        .await
        .expect("render succeeds");

    assert_eq!(read(deploy.join("index.html")), "home");
    assert_eq!(read(deploy.join("a/1")), "article one");
    assert_eq!(read(deploy.join("blog/index.html")), "blog index");
    assert!(!dir.path().join("public.staging").exists());
}

#[tokio::test]
async fn untouched_pages_survive_a_scoped_update() {
    let dir = tempfile::tempdir().expect("tempdir");
    let deploy = dir.path().join("public");
    fs::create_dir_all(deploy.join("about")).expect("create deploy");
    fs::write(deploy.join("about/index.html"), "about us").expect("seed page");
    fs::write(deploy.join("index.html"), "old home").expect("seed page");

    dispatcher(&deploy, MemorySource::new(&[("/", "new home")]))
        .update_paths(static_paths(["/"]))
        .await
        .expect("render succeeds");

    assert_eq!(read(deploy.join("index.html")), "new home");
    assert_eq!(read(deploy.join("about/index.html")), "about us");
}

#[tokio::test]
async fn failed_generate_leaves_published_output_intact() {
    let dir = tempfile::tempdir().expect("tempdir");
    let deploy = dir.path().join("public");
    fs::create_dir_all(&deploy).expect("create deploy");
    fs::write(deploy.join("index.html"), "old home").expect("seed page");

    let source = MemorySource::new(&[("/", "new home")]);
    let err = dispatcher(&deploy, source)
        .update_paths(static_paths(["/", "/missing"]))
        .await
        .expect_err("missing page fails the run");

    assert!(matches!(err, RenderError::Status { status: 404, .. }));
    assert_eq!(read(deploy.join("index.html")), "old home");
}

#[tokio::test]
async fn next_run_discards_stale_staging() {
    let dir = tempfile::tempdir().expect("tempdir");
    let deploy = dir.path().join("public");
    let source = MemorySource::new(&[("/a/1", "one")]);
    let dispatcher = dispatcher(&deploy, source);

    dispatcher
        .update_paths(static_paths(["/a/1", "/nope"]))
        .await
        .expect_err("first run fails");
    assert!(!deploy.exists());

    dispatcher
        .update_paths(Vec::new())
        .await
        .expect("empty run publishes");

    assert!(deploy.exists());
    assert!(!deploy.join("a/1").exists());
}

#[tokio::test]
async fn interrupted_publish_keeps_untouched_pages() {
    let dir = tempfile::tempdir().expect("tempdir");
    let deploy = dir.path().join("public");
    let retired = dir.path().join("public.previous");
    fs::create_dir_all(retired.join("about")).expect("create retired");
    fs::write(retired.join("about/index.html"), "about us").expect("seed page");

    dispatcher(&deploy, MemorySource::new(&[("/", "home")]))
        .update_paths(static_paths(["/"]))
        .await
        .expect("render succeeds");

    assert_eq!(read(deploy.join("index.html")), "home");
    assert_eq!(read(deploy.join("about/index.html")), "about us");
    assert!(!retired.exists());
}

#[tokio::test]
async fn colon_paths_render_from_http_origin() {
    let app = Router::new().route("/Category:Rust/", get(|| async { "rust category" }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener binds");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("origin serves");
    });

    let origin = Url::parse(&format!("http://{addr}/")).expect("origin parses");
    let source = HttpPageSource::new(origin, Duration::from_secs(5)).expect("client builds");
    let dir = tempfile::tempdir().expect("tempdir");
    let deploy = dir.path().join("public");

    dispatcher(&deploy, source)
        .update_paths(static_paths(["/Category:Rust/"]))
        .await
        .expect("render succeeds");

    assert_eq!(
        read(deploy.join("Category:Rust/index.html")),
        "rust category"
    );
}

#[tokio::test]
async fn traversal_paths_fail_before_writing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let deploy = dir.path().join("public");

    let err = dispatcher(&deploy, MemorySource::new(&[]))
        .update_paths(static_paths(["/../escape"]))
        .await
        .expect_err("traversal rejected");

    assert!(matches!(err, RenderError::InvalidPath { .. }));
    assert!(!dir.path().join("escape").exists());
}

#[tokio::test]
async fn http_source_fetches_pages_from_origin() {
    let app = Router::new()
        .route("/", get(|| async { "home from origin" }))
        .route("/a/1", get(|| async { "article from origin" }))
        .route("/gone", get(|| async { StatusCode::GONE }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener binds");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("origin serves");
    });

    let origin = Url::parse(&format!("http://{addr}/")).expect("origin parses");
    let source = HttpPageSource::new(origin, Duration::from_secs(5)).expect("client builds");

    let dir = tempfile::tempdir().expect("tempdir");
    let deploy = dir.path().join("public");
    let dispatcher = dispatcher(&deploy, source.clone());

    dispatcher
        .update_paths(static_paths(["/", "/a/1"]))
        .await
        .expect("render succeeds");

    assert_eq!(read(deploy.join("index.html")), "home from origin");
    assert_eq!(read(deploy.join("a/1")), "article from origin");

    let err = source
        .fetch(&StaticPath::from("/gone"))
        .await
        .expect_err("410 is a failure");
    assert!(matches!(err, RenderError::Status { status: 410, .. }));
}
