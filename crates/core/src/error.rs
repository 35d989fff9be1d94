#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} '{id}'")]
    NotFound { entity: &'static str, id: String },

    /// A request was rejected before any side effect happened.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The target already exists (e.g. a project slug collision).
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a missing project.
    pub fn project_not_found(slug: &str) -> Self {
        Self::NotFound {
            entity: "Project",
            id: slug.to_string(),
        }
    }
}
