/// Convenience result type used across filtergraph.
pub type FilterResult<T> = Result<T, FilterError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Only graph construction surfaces as a hard error to callers of the filter-input contract.
/// Allocation and render failures are reported here by the renderer and degraded to absent
/// snapshots by the inputs.
#[derive(thiserror::Error, Debug)]
pub enum FilterError {
    /// Invalid user-provided data (descriptors, options, pixel buffers).
    #[error("validation error: {0}")]
    Validation(String),

    /// Invalid filter graph wiring (cycles, unknown nodes, wrong arity).
    #[error("graph error: {0}")]
    Graph(String),

    /// Off-screen target or texture allocation failed.
    #[error("allocation error: {0}")]
    Allocation(String),

    /// Errors while executing a render or pixel pass.
    #[error("render error: {0}")]
    Render(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FilterError {
    /// Build a [`FilterError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`FilterError::Graph`] value.
    pub fn graph(msg: impl Into<String>) -> Self {
        Self::Graph(msg.into())
    }

    /// Build a [`FilterError::Allocation`] value.
    pub fn allocation(msg: impl Into<String>) -> Self {
        Self::Allocation(msg.into())
    }

    /// Build a [`FilterError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
