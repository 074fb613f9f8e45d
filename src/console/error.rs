use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Server answered {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Could not decode response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ConsoleError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ConsoleError::Decode(e.to_string())
        } else {
            ConsoleError::Transport(e.to_string())
        }
    }
}
