use thiserror::Error;

/// Errors a relay session can produce.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The pseudo-terminal pair could not be allocated.
    #[error("failed to open pty: {0}")]
    OpenFailed(String),
    /// The child process could not be started.
    #[error("failed to spawn command: {0}")]
    SpawnFailed(String),
    /// Input could not be delivered to the child.
    #[error("failed to write to pty: {0}")]
    WriteFailed(String),
    /// The pseudo-terminal rejected a size change.
    #[error("failed to resize pty: {0}")]
    ResizeFailed(String),
    /// Child output could not be written to the output sink.
    #[error("failed to write output: {0}")]
    OutputFailed(String),
    /// The wait thread ended without reporting how the child exited.
    #[error("child exit status was lost")]
    ExitSignalLost,
}
