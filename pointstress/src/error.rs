//! Error types shared across the load generator.

use reqwest::StatusCode;

/// Errors that can happen within a single exchange with the service.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Any error emitted from the underlying [`reqwest`] client.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    /// The service answered, but not with the expected status code.
    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus {
        /// The status code the service answered with.
        status: StatusCode,
        /// The response body, as far as it could be read.
        body: String,
    },
}

/// Irrecoverable conditions that abort the whole run.
///
/// These used to be in-place process aborts; they are now propagated
/// up to the [`Driver`](crate::driver::Driver), which flushes the
/// report and exits non-zero.
#[derive(Debug, thiserror::Error)]
pub enum FatalError {
    /// A transfer kept failing past the retry ceiling.
    ///
    /// Retry exhaustion is treated as a systemic service problem, not
    /// an individual request's bad luck, so it ends the entire run.
    #[error("transfer failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// How many attempts were made before giving up.
        attempts: usize,
        /// The error from the final attempt.
        last: ClientError,
    },
    /// A wave worker disappeared without reporting a completion.
    ///
    /// Workers always push exactly one token; a missing token means
    /// the worker died mid-flight (e.g. panicked), and the wave's
    /// completion count can no longer be trusted.
    #[error("a wave worker vanished without completing")]
    WorkerLost,
}

/// A convenience alias that defaults our [`ClientError`] type.
pub type Result<T, E = ClientError> = std::result::Result<T, E>;
