//! Tests for [`PollingClient`] against a scripted [`ProjectApi`].

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use blendfarm_core::job_state::{Badge, DomainState};
use blendfarm_poller::{PollError, PollingClient, ProjectApi, ProjectInfo, ProjectView};

/// A [`ProjectApi`] whose answers are set by the test.
///
/// File listings are served from a queue of batches; once the queue is empty
/// the last batch repeats.
#[derive(Default)]
struct ScriptedApi {
    states: Mutex<HashMap<String, DomainState>>,
    fail_states: AtomicBool,
    fail_files: AtomicBool,
    file_batches: Mutex<VecDeque<Vec<String>>>,
    last_batch: Mutex<Vec<String>>,
    state_queries: Mutex<Vec<String>>,
    list_calls: AtomicUsize,
    list_delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedApi {
    fn set_state(&self, job_id: &str, state: DomainState) {
        self.states.lock().unwrap().insert(job_id.to_string(), state);
    }

    fn push_files(&self, files: &[&str]) {
        self.file_batches
            .lock()
            .unwrap()
            .push_back(files.iter().map(|f| f.to_string()).collect());
    }

    fn queried(&self, job_id: &str) -> usize {
        self.state_queries
            .lock()
            .unwrap()
            .iter()
            .filter(|id| *id == job_id)
            .count()
    }

    fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProjectApi for ScriptedApi {
    async fn job_state(&self, job_id: &str) -> Result<DomainState, PollError> {
        self.state_queries.lock().unwrap().push(job_id.to_string());
        if self.fail_states.load(Ordering::SeqCst) {
            return Err(PollError::Api {
                status: 503,
                body: "unavailable".into(),
            });
        }
        Ok(self
            .states
            .lock()
            .unwrap()
            .get(job_id)
            .copied()
            .unwrap_or(DomainState::Unknown))
    }

    async fn list_files(&self, _slug: &str) -> Result<Vec<String>, PollError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.list_delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_files.load(Ordering::SeqCst) {
            return Err(PollError::Api {
                status: 500,
                body: "boom".into(),
            });
        }
        let next = self.file_batches.lock().unwrap().pop_front();
        let mut last = self.last_batch.lock().unwrap();
        if let Some(batch) = next {
            *last = batch;
        }
        Ok(last.clone())
    }

    async fn project(&self, slug: &str) -> Result<ProjectInfo, PollError> {
        Ok(ProjectInfo {
            slug: slug.to_string(),
            name: slug.to_string(),
            frame_render_job_id: String::new(),
            video_render_job_id: String::new(),
        })
    }
}

/// Wait (up to two seconds) until `cond` holds.
async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..400 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

const SHORT: Duration = Duration::from_millis(10);

// ---------------------------------------------------------------------------
// Tick behaviour
// ---------------------------------------------------------------------------

/// The first tick runs immediately, not after one interval.
#[tokio::test]
async fn first_tick_updates_panels_and_gallery() {
    let api = Arc::new(ScriptedApi::default());
    api.set_state("100", DomainState::Running);
    api.push_files(&["frame_0001.png", "config.json"]);

    let handle = PollingClient::new(api.clone(), ProjectView::new("scene", "100", ""))
        .with_interval(Duration::from_secs(3600))
        .start();
    wait_until(|| handle.ticks() >= 1).await;

    let view = handle.snapshot();
    assert_eq!(view.frame_render.state, DomainState::Running);
    assert_eq!(view.frame_render.badge, Badge::Success);
    assert_eq!(view.video_render.state, DomainState::NotStarted);
    assert_eq!(view.gallery.images(), ["frame_0001.png"]);

    handle.stop().await;
}

/// A panel without a job id never triggers a state query.
#[tokio::test]
async fn empty_job_id_is_never_queried() {
    let api = Arc::new(ScriptedApi::default());
    api.set_state("7", DomainState::Queued);

    let handle = PollingClient::new(api.clone(), ProjectView::new("scene", "", "7"))
        .with_interval(SHORT)
        .start();
    wait_until(|| handle.ticks() >= 3).await;
    let view = handle.stop().await;

    assert_eq!(api.queried(""), 0);
    assert!(api.queried("7") >= 3);
    assert_eq!(view.video_render.badge, Badge::Info);
    assert_eq!(view.frame_render.badge, Badge::Warning);
}

#[tokio::test]
async fn gallery_appends_in_first_seen_order_and_never_removes() {
    let api = Arc::new(ScriptedApi::default());
    api.push_files(&["b.png", "a.png"]);
    api.push_files(&["a.png", "c.png", "render.out"]);
    api.push_files(&[]);

    let handle = PollingClient::new(api.clone(), ProjectView::new("scene", "", ""))
        .with_interval(SHORT)
        .start();
    wait_until(|| handle.ticks() >= 4).await;
    let view = handle.stop().await;

    assert_eq!(view.gallery.images(), ["b.png", "a.png", "c.png"]);
}

#[tokio::test]
async fn state_changes_are_picked_up_on_later_ticks() {
    let api = Arc::new(ScriptedApi::default());
    api.set_state("5", DomainState::Queued);

    let handle = PollingClient::new(api.clone(), ProjectView::new("scene", "5", ""))
        .with_interval(SHORT)
        .start();
    wait_until(|| handle.snapshot().frame_render.state == DomainState::Queued).await;

    api.set_state("5", DomainState::Completed);
    wait_until(|| handle.snapshot().frame_render.state == DomainState::Completed).await;

    assert_eq!(handle.snapshot().frame_render.badge, Badge::Primary);
    handle.stop().await;
}

/// A failed fetch leaves its region as it was; other regions still update.
#[tokio::test]
async fn failed_state_fetch_keeps_previous_panel() {
    let api = Arc::new(ScriptedApi::default());
    api.set_state("5", DomainState::Running);
    api.push_files(&["1.png"]);

    let handle = PollingClient::new(api.clone(), ProjectView::new("scene", "5", ""))
        .with_interval(SHORT)
        .start();
    wait_until(|| handle.snapshot().frame_render.state == DomainState::Running).await;

    api.fail_states.store(true, Ordering::SeqCst);
    api.push_files(&["1.png", "2.png"]);
    let ticks = handle.ticks();
    wait_until(|| handle.ticks() >= ticks + 3).await;

    let view = handle.stop().await;
    assert_eq!(view.frame_render.state, DomainState::Running);
    assert_eq!(view.gallery.images(), ["1.png", "2.png"]);
}

#[tokio::test]
async fn failed_file_listing_keeps_gallery() {
    let api = Arc::new(ScriptedApi::default());
    api.push_files(&["1.png"]);

    let handle = PollingClient::new(api.clone(), ProjectView::new("scene", "", ""))
        .with_interval(SHORT)
        .start();
    wait_until(|| handle.snapshot().gallery.len() == 1).await;

    api.fail_files.store(true, Ordering::SeqCst);
    let ticks = handle.ticks();
    wait_until(|| handle.ticks() >= ticks + 2).await;

    let view = handle.stop().await;
    assert_eq!(view.gallery.images(), ["1.png"]);
}

/// Slow fetches delay the next tick instead of overlapping with it.
#[tokio::test]
async fn ticks_never_overlap() {
    let api = Arc::new(ScriptedApi {
        list_delay: Some(Duration::from_millis(30)),
        ..Default::default()
    });

    let handle = PollingClient::new(api.clone(), ProjectView::new("scene", "", ""))
        .with_interval(Duration::from_millis(1))
        .start();
    wait_until(|| handle.ticks() >= 4).await;
    handle.stop().await;

    assert_eq!(api.max_in_flight.load(Ordering::SeqCst), 1);
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stop_ends_polling() {
    let api = Arc::new(ScriptedApi::default());

    let handle = PollingClient::new(api.clone(), ProjectView::new("scene", "", ""))
        .with_interval(SHORT)
        .start();
    wait_until(|| handle.ticks() >= 2).await;
    assert!(handle.is_running());

    handle.stop().await;
    let calls = api.list_calls();
    tokio::time::sleep(SHORT * 5).await;

    assert_eq!(api.list_calls(), calls);
}

#[tokio::test]
async fn dropping_the_handle_cancels() {
    let api = Arc::new(ScriptedApi::default());

    let handle = PollingClient::new(api.clone(), ProjectView::new("scene", "", ""))
        .with_interval(SHORT)
        .start();
    wait_until(|| handle.ticks() >= 1).await;

    drop(handle);
    // Let the task observe the cancellation.
    tokio::time::sleep(SHORT * 3).await;
    let calls = api.list_calls();
    tokio::time::sleep(SHORT * 5).await;

    assert_eq!(api.list_calls(), calls);
}

#[tokio::test]
async fn for_project_uses_recorded_job_ids() {
    let api = Arc::new(ScriptedApi::default());
    api.set_state("11", DomainState::Queued);
    api.set_state("22", DomainState::Running);
    let project = ProjectInfo {
        slug: "scene".into(),
        name: "Scene".into(),
        frame_render_job_id: "11".into(),
        video_render_job_id: "22".into(),
    };

    let handle = PollingClient::for_project(api.clone(), &project)
        .with_interval(SHORT)
        .start();
    wait_until(|| handle.ticks() >= 1).await;
    let view = handle.stop().await;

    assert_eq!(view.slug, "scene");
    assert_eq!(view.frame_render.state, DomainState::Queued);
    assert_eq!(view.video_render.state, DomainState::Running);
}
