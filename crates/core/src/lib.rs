//! Domain logic for the render-project orchestration service.
//!
//! Everything in this crate is pure: no filesystem, subprocess, or network
//! access. The `store`, `scheduler`, `api`, and `poller` crates build on it.

pub mod error;
pub mod hashing;
pub mod job_state;
pub mod naming;
pub mod project;
pub mod render;
