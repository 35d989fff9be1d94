//! Batch scheduler integration.
//!
//! The scheduler is reached only through the [`SchedulerClient`] trait.
//! [`SlurmClient`] shells out to the real CLI; [`StubScheduler`] is a
//! programmable stand-in for tests. [`JobSubmitter`] and
//! [`JobStatusResolver`] hold the domain logic on top of either.

pub mod accounts;
pub mod client;
pub mod resolver;
pub mod slurm;
pub mod stub;
pub mod submitter;
pub mod subprocess;

pub use client::{SchedulerClient, SchedulerError, SubmitSpec};
pub use resolver::JobStatusResolver;
pub use slurm::SlurmClient;
pub use stub::StubScheduler;
pub use submitter::{JobSubmitter, SubmitError, SubmitSettings};
