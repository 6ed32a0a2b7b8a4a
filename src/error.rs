use std::time::Duration;

use thiserror::Error;

/// Failure of a single inference call. Never retried by the client; the
/// sampling loop reports it and carries on with the next tick.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("analysis request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("analysis request timed out after {0:?}")]
    Timeout(Duration),

    #[error("analysis endpoint returned {0}")]
    Status(reqwest::StatusCode),

    /// The endpoint answered 2xx but the body was not valid JSON. Shape
    /// oddities inside valid JSON are not an error; the normalizer absorbs
    /// them.
    #[error("analysis response was not valid JSON: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    /// Camera access denied or no device available. Fatal to session start:
    /// no stream is held and the session stays idle until the user retries.
    #[error("could not access camera: {0}")]
    Permission(anyhow::Error),

    #[error("a session is already streaming")]
    AlreadyStreaming,

    /// Transient per-tick failure; the session keeps streaming.
    #[error(transparent)]
    Inference(#[from] InferenceError),
}
