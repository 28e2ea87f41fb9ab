#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("container runtime binary `{binary}` was not found")]
    MissingBinary { binary: String },
    #[error("failed to spawn container runtime `{binary}`: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },
    #[error("container runtime `{operation}` timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },
    #[error("container runtime `{operation}` exited with code {exit_code}: {stderr}")]
    CommandFailed {
        operation: String,
        exit_code: i32,
        stderr: String,
    },
    #[error("failed to parse `{operation}` output: {reason}")]
    Parse { operation: String, reason: String },
    #[error("container `{handle}` not found")]
    NotFound { handle: String },
}
