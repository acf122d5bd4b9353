use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssistError {
    #[error("assistant gateway is not configured (url, model and API key are required)")]
    NotConfigured,

    #[error("rate limit exceeded, try again shortly")]
    RateLimited,

    #[error("AI credits exhausted")]
    CreditsExhausted,

    #[error("gateway returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request cancelled")]
    Cancelled,

    #[error("gateway returned no text")]
    EmptyResponse,

    #[error("could not classify observation: {0}")]
    Unclassifiable(String),
}
