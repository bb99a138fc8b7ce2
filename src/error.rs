use thiserror::Error;

#[derive(Error, Debug)]
pub enum SapwiseError {
    #[error("Agent unavailable: {0}")]
    AgentUnavailable(String),

    #[error("Agent run failed: {0}")]
    RunFailure(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{message}: {source}")]
    Context {
        message: String,
        #[source]
        source: Box<SapwiseError>,
    },
}

pub type Result<T> = std::result::Result<T, SapwiseError>;
