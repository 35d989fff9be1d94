//! [`HttpProjectApi`] against a real API server on a loopback port.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use blendfarm_api::config::{SchedulerConfig, ServerConfig};
use blendfarm_api::router::build_app_router;
use blendfarm_api::state::AppState;
use blendfarm_core::job_state::DomainState;
use blendfarm_core::project::JobKind;
use blendfarm_core::render::RenderLimits;
use blendfarm_poller::{HttpProjectApi, PollError, PollingClient, ProjectApi};
use blendfarm_scheduler::StubScheduler;
use blendfarm_store::ProjectStore;
use tempfile::TempDir;

struct Server {
    base_url: String,
    scheduler: Arc<StubScheduler>,
    store: ProjectStore,
    _root: TempDir,
}

fn config(root: &std::path::Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        project_root: root.to_path_buf(),
        reconcile_on_list: true,
        max_upload_bytes: 1024 * 1024,
        scheduler: SchedulerConfig {
            submit_bin: "/nonexistent/sbatch".to_string(),
            status_bin: "/nonexistent/squeue".to_string(),
            cluster: "pitzer".to_string(),
            timeout_secs: 5,
            frame_render_script: PathBuf::from("render_frames.sh"),
            video_render_script: PathBuf::from("render_video.sh"),
        },
        limits: RenderLimits::default(),
    }
}

/// Serve the full router over a temp project root.
async fn spawn_server() -> Server {
    let root = tempfile::tempdir().unwrap();
    let config = config(root.path());
    let store = ProjectStore::new(root.path());
    store.ensure_layout().await.unwrap();

    let scheduler = Arc::new(StubScheduler::new());
    let state = AppState::new(
        config.clone(),
        ProjectStore::new(root.path()),
        scheduler.clone(),
        Vec::new(),
    );
    let app = build_app_router(state, &config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Server {
        base_url: format!("http://{addr}"),
        scheduler,
        store,
        _root: root,
    }
}

#[tokio::test]
async fn reads_project_job_state_and_files() {
    let server = spawn_server().await;
    let slug = server.store.create_project("My Cool Scene", None).await.unwrap();
    server
        .store
        .update_config(&slug, |c| c.set_job_id(JobKind::FrameRender, "12345"))
        .await
        .unwrap();
    let dir = server.store.project_dir(&slug).unwrap();
    std::fs::write(dir.join("frame_0001.png"), b"png").unwrap();
    server.scheduler.set_state("12345", "PD");

    let api = HttpProjectApi::new(format!("{}/", server.base_url));

    let project = api.project(&slug).await.unwrap();
    assert_eq!(project.slug, "my_cool_scene");
    assert_eq!(project.name, "My Cool Scene");
    assert_eq!(project.frame_render_job_id, "12345");
    assert_eq!(project.video_render_job_id, "");

    assert_eq!(api.job_state("12345").await.unwrap(), DomainState::Queued);

    let files = api.list_files(&slug).await.unwrap();
    assert_eq!(files, vec!["config.json", "frame_0001.png"]);
}

/// Slugs keep characters that are special in URLs; each is sent as one
/// encoded path segment.
#[tokio::test]
async fn slug_with_url_special_characters_round_trips() {
    let server = spawn_server().await;
    let slug = server.store.create_project("Shot #1?50%", None).await.unwrap();
    assert_eq!(slug, "shot_#1?50%");
    let dir = server.store.project_dir(&slug).unwrap();
    std::fs::write(dir.join("0001.png"), b"png").unwrap();

    let api = HttpProjectApi::new(server.base_url.clone());

    let project = api.project(&slug).await.unwrap();
    assert_eq!(project.slug, slug);
    assert_eq!(project.name, "Shot #1?50%");

    let files = api.list_files(&slug).await.unwrap();
    assert_eq!(files, vec!["0001.png", "config.json"]);
}

#[tokio::test]
async fn missing_project_is_api_error() {
    let server = spawn_server().await;
    let api = HttpProjectApi::new(server.base_url.clone());

    let result = api.project("nope").await;

    assert_matches!(result, Err(PollError::Api { status: 404, .. }));
}

#[tokio::test]
async fn unusable_base_url_is_reported() {
    let api = HttpProjectApi::new("not a url");

    let result = api.job_state("1").await;

    assert_matches!(result, Err(PollError::InvalidBaseUrl { .. }));
}

#[tokio::test]
async fn unreachable_server_is_request_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let api = HttpProjectApi::new(format!("http://{addr}"));

    let result = api.job_state("1").await;

    assert_matches!(result, Err(PollError::Request(_)));
}

/// End to end: the poller follows a job through the real HTTP surface.
#[tokio::test]
async fn polling_client_follows_job_over_http() {
    let server = spawn_server().await;
    let slug = server.store.create_project("Scene", None).await.unwrap();
    server
        .store
        .update_config(&slug, |c| c.set_job_id(JobKind::VideoRender, "900"))
        .await
        .unwrap();
    server.scheduler.set_state("900", "R");

    let api = Arc::new(HttpProjectApi::new(server.base_url.clone()));
    let project = api.project(&slug).await.unwrap();
    let handle = PollingClient::for_project(api, &project)
        .with_interval(Duration::from_millis(20))
        .start();

    for _ in 0..200 {
        if handle.snapshot().video_render.state == DomainState::Running {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(handle.snapshot().video_render.state, DomainState::Running);

    let dir = server.store.project_dir(&slug).unwrap();
    std::fs::write(dir.join("0001.png"), b"png").unwrap();
    server.scheduler.set_state("900", "");

    for _ in 0..200 {
        let view = handle.snapshot();
        if view.video_render.state == DomainState::Completed && view.gallery.len() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let view = handle.stop().await;
    assert_eq!(view.video_render.state, DomainState::Completed);
    assert_eq!(view.gallery.images(), ["0001.png"]);
    assert_eq!(view.frame_render.state, DomainState::NotStarted);
}
