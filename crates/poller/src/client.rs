//! The recurring poll task and its handle.
//!
//! Each tick issues up to three reads concurrently: the frame-render job
//! state, the video-render job state, and the project's file listing. Every
//! read updates only its own region of the [`ProjectView`] as soon as it
//! completes. The next tick is armed `interval` after the previous one
//! finished, so ticks never overlap.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use blendfarm_core::project::JobKind;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api::{ProjectApi, ProjectInfo};
use crate::view::ProjectView;

/// Delay between the end of one tick and the start of the next.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Configures and starts polling for one project.
pub struct PollingClient {
    api: Arc<dyn ProjectApi>,
    view: ProjectView,
    interval: Duration,
}

impl PollingClient {
    pub fn new(api: Arc<dyn ProjectApi>, view: ProjectView) -> Self {
        Self {
            api,
            view,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Poll the jobs recorded on `project`.
    pub fn for_project(api: Arc<dyn ProjectApi>, project: &ProjectInfo) -> Self {
        Self::new(
            api,
            ProjectView::new(
                project.slug.clone(),
                project.frame_render_job_id.clone(),
                project.video_render_job_id.clone(),
            ),
        )
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Spawn the poll task. The first tick runs immediately.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(self) -> PollHandle {
        let cancel = CancellationToken::new();
        let view = Arc::new(Mutex::new(self.view));
        let ticks = Arc::new(AtomicU64::new(0));

        let task = tokio::spawn(run(
            self.api,
            Arc::clone(&view),
            self.interval,
            cancel.clone(),
            Arc::clone(&ticks),
        ));

        PollHandle {
            cancel,
            task: Some(task),
            view,
            ticks,
        }
    }
}

/// Owner of a running poll task.
///
/// [`stop`](Self::stop) cancels and waits for the task. Dropping the handle
/// cancels without waiting.
pub struct PollHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
    view: Arc<Mutex<ProjectView>>,
    ticks: Arc<AtomicU64>,
}

impl PollHandle {
    /// A copy of the current view.
    pub fn snapshot(&self) -> ProjectView {
        lock(&self.view).clone()
    }

    /// Number of completed ticks.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Cancel the task, wait for it to exit, and return the final view.
    ///
    /// An in-flight tick is abandoned; no region is updated after this
    /// returns.
    pub async fn stop(mut self) -> ProjectView {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Poll task ended abnormally");
            }
        }
        self.snapshot()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

async fn run(
    api: Arc<dyn ProjectApi>,
    view: Arc<Mutex<ProjectView>>,
    interval: Duration,
    cancel: CancellationToken,
    ticks: Arc<AtomicU64>,
) {
    let slug = lock(&view).slug.clone();
    tracing::info!(slug = %slug, interval_ms = interval.as_millis() as u64, "Polling started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tick(api.as_ref(), &view) => {}
        }
        ticks.fetch_add(1, Ordering::SeqCst);

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    tracing::info!(slug = %slug, "Polling stopped");
}

async fn tick(api: &dyn ProjectApi, view: &Mutex<ProjectView>) {
    let (slug, frame_job, video_job) = {
        let view = lock(view);
        (
            view.slug.clone(),
            view.frame_render.job_id.clone(),
            view.video_render.job_id.clone(),
        )
    };

    tokio::join!(
        refresh_job(api, view, JobKind::FrameRender, &frame_job),
        refresh_job(api, view, JobKind::VideoRender, &video_job),
        refresh_gallery(api, view, &slug),
    );
}

async fn refresh_job(api: &dyn ProjectApi, view: &Mutex<ProjectView>, kind: JobKind, job_id: &str) {
    if job_id.is_empty() {
        return;
    }

    match api.job_state(job_id).await {
        Ok(state) => {
            let changed = lock(view).panel_mut(kind).apply(state);
            if changed {
                tracing::info!(kind = kind.label(), job_id = %job_id, state = %state, "Job state changed");
            }
        }
        Err(e) => {
            tracing::warn!(kind = kind.label(), job_id = %job_id, error = %e, "Job state fetch failed");
        }
    }
}

async fn refresh_gallery(api: &dyn ProjectApi, view: &Mutex<ProjectView>, slug: &str) {
    match api.list_files(slug).await {
        Ok(files) => {
            let added = lock(view).gallery.observe(files);
            for image in &added {
                tracing::info!(slug = %slug, image = %image, "New image");
            }
        }
        Err(e) => {
            tracing::warn!(slug = %slug, error = %e, "File listing failed");
        }
    }
}

fn lock(view: &Mutex<ProjectView>) -> MutexGuard<'_, ProjectView> {
    view.lock().unwrap_or_else(|e| e.into_inner())
}
