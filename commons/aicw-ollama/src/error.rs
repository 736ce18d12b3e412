#[derive(thiserror::Error, Debug)]
pub enum OllamaError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status} from {endpoint}: {body}")]
    Status {
        endpoint: &'static str,
        status: u16,
        body: String,
    },
    /// The runtime reported a failure inside a progress stream.
    #[error("model runtime error: {0}")]
    Remote(String),
    #[error("{operation} stream ended without a success status")]
    Incomplete { operation: &'static str },
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
}
