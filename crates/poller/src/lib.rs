//! `blendfarm-poller` library crate.
//!
//! A cancellable task that keeps a project's job badges and image gallery
//! current by polling the HTTP API. The binary entrypoint lives in `main.rs`.

pub mod api;
pub mod client;
pub mod view;

pub use api::{HttpProjectApi, PollError, ProjectApi, ProjectInfo};
pub use client::{PollHandle, PollingClient, DEFAULT_POLL_INTERVAL};
pub use view::{Gallery, JobPanel, ProjectView};
