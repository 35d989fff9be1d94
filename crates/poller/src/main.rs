//! `blendfarm-poller` -- follows one project's render jobs from a terminal.
//!
//! Fetches the project once for its job ids, then polls job states and new
//! output images until Ctrl-C.
//!
//! # Environment variables
//!
//! | Variable             | Required | Default                 | Description                  |
//! |----------------------|----------|-------------------------|------------------------------|
//! | `API_BASE_URL`       | no       | `http://localhost:3000` | Render API server root       |
//! | `PROJECT_SLUG`       | yes      | --                      | Project to follow            |
//! | `POLL_INTERVAL_SECS` | no       | `5`                     | Delay between poll ticks     |

use std::sync::Arc;
use std::time::Duration;

use blendfarm_poller::{HttpProjectApi, PollingClient, ProjectApi, DEFAULT_POLL_INTERVAL};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blendfarm_poller=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let base_url =
        std::env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".into());

    let slug = std::env::var("PROJECT_SLUG").unwrap_or_else(|_| {
        tracing::error!("PROJECT_SLUG environment variable is required");
        std::process::exit(1);
    });

    let interval = std::env::var("POLL_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_POLL_INTERVAL);

    let api = Arc::new(HttpProjectApi::new(base_url.clone()));

    let project = match api.project(&slug).await {
        Ok(project) => project,
        Err(e) => {
            tracing::error!(slug = %slug, base_url = %base_url, error = %e, "Failed to load project");
            std::process::exit(1);
        }
    };

    tracing::info!(
        slug = %project.slug,
        name = %project.name,
        frame_render_job_id = %project.frame_render_job_id,
        video_render_job_id = %project.video_render_job_id,
        "Following project"
    );

    let handle = PollingClient::for_project(api, &project)
        .with_interval(interval)
        .start();

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
    }

    let view = handle.stop().await;
    tracing::info!(
        frame_render = %view.frame_render.state,
        video_render = %view.video_render.state,
        images = view.gallery.len(),
        "Stopped"
    );
}
