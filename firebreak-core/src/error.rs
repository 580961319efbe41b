use thiserror::Error;

/// Everything that can go wrong inside a handler, classified by the
/// HTTP-style status code reported back to the caller.
///
/// Errors never propagate past the handler boundary - the Lambda always
/// returns a completed response envelope built from one of these.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Malformed or out-of-range invocation input. Status 400.
    #[error("{0}")]
    Validation(String),

    /// Required configuration missing or invalid at invocation start. Status 500.
    #[error("{0}")]
    Configuration(String),

    /// The device could not be reached or answered with a non-success
    /// HTTP status. Status 502.
    #[error("Goldilock FireBreak API error: {0}")]
    UpstreamUnreachable(String),

    /// The device answered, but the body was not the JSON we expected. Status 500.
    #[error("Invalid response from Goldilock FireBreak API: {0}")]
    UpstreamResponse(String),
}

impl HandlerError {
    /// The status code placed in the response envelope for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            HandlerError::Validation(_) => 400,
            HandlerError::Configuration(_) => 500,
            HandlerError::UpstreamUnreachable(_) => 502,
            HandlerError::UpstreamResponse(_) => 500,
        }
    }
}
