#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use blendfarm_core::render::RenderLimits;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use blendfarm_api::config::{SchedulerConfig, ServerConfig};
use blendfarm_api::router::build_app_router;
use blendfarm_api::state::AppState;
use blendfarm_scheduler::StubScheduler;
use blendfarm_store::ProjectStore;

/// Account every test app offers.
pub const TEST_ACCOUNT: &str = "PZS1127";

/// Build a test `ServerConfig` rooted at `project_root`.
pub fn test_config(project_root: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        project_root: project_root.to_path_buf(),
        reconcile_on_list: true,
        max_upload_bytes: 16 * 1024 * 1024,
        scheduler: SchedulerConfig {
            submit_bin: "/nonexistent/sbatch".to_string(),
            status_bin: "/nonexistent/squeue".to_string(),
            cluster: "pitzer".to_string(),
            timeout_secs: 5,
            frame_render_script: PathBuf::from("/opt/blendfarm/render_frames.sh"),
            video_render_script: PathBuf::from("/opt/blendfarm/render_video.sh"),
        },
        limits: RenderLimits::default(),
    }
}

/// A router over a throwaway project root and a programmable scheduler.
pub struct TestApp {
    pub router: Router,
    pub scheduler: Arc<StubScheduler>,
    pub root: TempDir,
}

impl TestApp {
    pub fn root_path(&self) -> &Path {
        self.root.path()
    }

    pub async fn request(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.request(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn delete(&self, uri: &str) -> Response<Body> {
        self.request(
            Request::delete(uri).body(Body::empty()).unwrap(),
        )
        .await
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> Response<Body> {
        self.send_json(Method::POST, uri, body).await
    }

    pub async fn put_json(&self, uri: &str, body: serde_json::Value) -> Response<Body> {
        self.send_json(Method::PUT, uri, body).await
    }

    async fn send_json(&self, method: Method, uri: &str, body: serde_json::Value) -> Response<Body> {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.request(request).await
    }

    pub async fn post_multipart(&self, uri: &str, form: Multipart) -> Response<Body> {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(form.finish()))
            .unwrap();
        self.request(request).await
    }
}

/// Build the full application router, exactly as `main.rs` does, over a
/// fresh temp directory and a [`StubScheduler`].
pub async fn build_test_app() -> TestApp {
    let root = tempfile::tempdir().unwrap();
    let config = test_config(root.path());
    let store = ProjectStore::new(root.path());
    store.ensure_layout().await.unwrap();

    let scheduler = Arc::new(StubScheduler::new());
    let state = AppState::new(
        config.clone(),
        store,
        scheduler.clone(),
        vec![TEST_ACCOUNT.to_string()],
    );

    TestApp {
        router: build_app_router(state, &config),
        scheduler,
        root,
    }
}

/// Collect a response body into JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Multipart bodies
// ---------------------------------------------------------------------------

const BOUNDARY: &str = "blendfarm-test-boundary";

/// Minimal `multipart/form-data` body builder.
#[derive(Default)]
pub struct Multipart {
    body: Vec<u8>,
}

impl Multipart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.body
    }
}
