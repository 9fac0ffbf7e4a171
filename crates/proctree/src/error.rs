use thiserror::Error;

/// Conditions that stop an invocation without producing output.
///
/// Unknown ancestors and cycles are not errors: they show up in the rendered output as
/// placeholders and cycle markers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("Target PID {pid} not found in events.")]
    NotFound { pid: String },
}

pub type TreeResult<T> = Result<T, TreeError>;
