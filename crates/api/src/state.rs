use std::sync::Arc;

use blendfarm_scheduler::{JobStatusResolver, JobSubmitter, SchedulerClient};
use blendfarm_store::ProjectStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: inner data is behind `Arc` or already `Clone`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Project directories and their config documents.
    pub store: Arc<ProjectStore>,
    pub submitter: JobSubmitter,
    pub resolver: JobStatusResolver,
    /// Scheduler accounts the server user may charge, discovered at startup.
    pub accounts: Arc<Vec<String>>,
}

impl AppState {
    /// Wire the submitter and resolver to one scheduler client.
    pub fn new(
        config: ServerConfig,
        store: ProjectStore,
        client: Arc<dyn SchedulerClient>,
        accounts: Vec<String>,
    ) -> Self {
        let submitter = JobSubmitter::new(Arc::clone(&client), config.submit_settings());
        let resolver = JobStatusResolver::new(client);

        Self {
            config: Arc::new(config),
            store: Arc::new(store),
            submitter,
            resolver,
            accounts: Arc::new(accounts),
        }
    }
}
