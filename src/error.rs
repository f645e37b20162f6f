use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("request to {url} failed: {reason}")]
    Http { url: String, reason: String },

    #[error("malformed song list: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not decode audio: {0}")]
    Decode(String),

    #[error("could not decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("audio output unavailable: {0}")]
    Output(String),
}

pub type Result<T> = std::result::Result<T, PlayerError>;
