//! The state a project page displays, updated region by region.

use std::collections::HashSet;

use blendfarm_core::job_state::{Badge, DomainState};
use blendfarm_core::project::JobKind;

/// One job badge: its id, current state, and display category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPanel {
    pub job_id: String,
    pub state: DomainState,
    pub badge: Badge,
}

impl JobPanel {
    /// A panel for `job_id`. With no id the panel is `Not Started` for good;
    /// otherwise it reads `Unknown` until the first poll lands.
    pub fn new(job_id: impl Into<String>) -> Self {
        let job_id = job_id.into();
        let state = if job_id.is_empty() {
            DomainState::NotStarted
        } else {
            DomainState::Unknown
        };
        Self {
            job_id,
            state,
            badge: state.badge(),
        }
    }

    pub fn has_job(&self) -> bool {
        !self.job_id.is_empty()
    }

    /// Show `state`. Returns whether the display changed.
    pub fn apply(&mut self, state: DomainState) -> bool {
        if self.state == state {
            return false;
        }
        self.state = state;
        self.badge = state.badge();
        true
    }
}

/// Rendered images in first-seen order. Entries are only ever appended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Gallery {
    images: Vec<String>,
    seen: HashSet<String>,
}

impl Gallery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append every `.png` in `names` not shown yet, in the given order.
    /// Returns the newly added names.
    pub fn observe<I, S>(&mut self, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut added = Vec::new();
        for name in names {
            let name = name.into();
            if !name.ends_with(".png") || self.seen.contains(&name) {
                continue;
            }
            self.seen.insert(name.clone());
            self.images.push(name.clone());
            added.push(name);
        }
        added
    }

    pub fn images(&self) -> &[String] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Everything the poller keeps current for one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectView {
    pub slug: String,
    pub frame_render: JobPanel,
    pub video_render: JobPanel,
    pub gallery: Gallery,
}

impl ProjectView {
    pub fn new(
        slug: impl Into<String>,
        frame_render_job_id: impl Into<String>,
        video_render_job_id: impl Into<String>,
    ) -> Self {
        Self {
            slug: slug.into(),
            frame_render: JobPanel::new(frame_render_job_id),
            video_render: JobPanel::new(video_render_job_id),
            gallery: Gallery::new(),
        }
    }

    pub fn panel(&self, kind: JobKind) -> &JobPanel {
        match kind {
            JobKind::FrameRender => &self.frame_render,
            JobKind::VideoRender => &self.video_render,
        }
    }

    pub fn panel_mut(&mut self, kind: JobKind) -> &mut JobPanel {
        match kind {
            JobKind::FrameRender => &mut self.frame_render,
            JobKind::VideoRender => &mut self.video_render,
        }
    }
}
