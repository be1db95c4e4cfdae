use thiserror::Error;

/// Everything that can go wrong between the movies API, the poster fetch and the stats file.
#[derive(Debug, Error)]
pub enum QuizError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("server responded with HTTP {0}")]
    HttpStatus(u16),

    #[error("server error: {message}")]
    Server { message: String },

    #[error("failed to decode movies: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("no movies loaded")]
    NoMovies,

    #[error("poster image is empty")]
    EmptyImage,

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("stats file is corrupt: {0}")]
    CorruptStore(serde_json::Error),

    #[error("invalid config value for {key}: {value:?}")]
    Config { key: String, value: String },
}
