//! Render job state vocabulary.
//!
//! Scheduler state codes are mapped onto a five-value [`DomainState`], and each
//! domain state onto a display [`Badge`]. Both mappings are total.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Job state as presented to users, independent of scheduler codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DomainState {
    #[serde(rename = "Not Started")]
    NotStarted,
    Queued,
    Running,
    Completed,
    Unknown,
}

impl DomainState {
    /// Map a raw scheduler state code.
    ///
    /// An empty code means the job has left the queue and counts as
    /// completed. Anything not listed maps to [`DomainState::Unknown`].
    pub fn from_scheduler_code(code: &str) -> Self {
        match code {
            "" | "C" => Self::Completed,
            "R" => Self::Running,
            "Q" | "CF" | "PD" => Self::Queued,
            _ => Self::Unknown,
        }
    }

    /// Display string, identical to the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "Not Started",
            Self::Queued => "Queued",
            Self::Running => "Running",
            Self::Completed => "Completed",
            Self::Unknown => "Unknown",
        }
    }

    /// Inverse of [`as_str`](Self::as_str). Unrecognised labels are `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label {
            "Not Started" => Self::NotStarted,
            "Queued" => Self::Queued,
            "Running" => Self::Running,
            "Completed" => Self::Completed,
            _ => Self::Unknown,
        }
    }

    pub fn badge(self) -> Badge {
        Badge::for_state(self)
    }
}

impl fmt::Display for DomainState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display-priority category for a job state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Badge {
    Warning,
    Info,
    Success,
    Primary,
}

impl Badge {
    pub fn for_state(state: DomainState) -> Self {
        match state {
            DomainState::NotStarted | DomainState::Unknown => Self::Warning,
            DomainState::Queued => Self::Info,
            DomainState::Running => Self::Success,
            DomainState::Completed => Self::Primary,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Info => "info",
            Self::Success => "success",
            Self::Primary => "primary",
        }
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved job: its domain state together with the badge derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JobStatus {
    pub state: DomainState,
    pub badge: Badge,
}

impl JobStatus {
    pub fn not_started() -> Self {
        Self::from(DomainState::NotStarted)
    }
}

impl From<DomainState> for JobStatus {
    fn from(state: DomainState) -> Self {
        Self {
            state,
            badge: state.badge(),
        }
    }
}
