use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A geometry query the simulator needs returned nothing.
    #[error("missing {0} geometry; simulator not started")]
    Configuration(&'static str),

    #[error("please enter one clean word (letters only)")]
    InvalidWord,

    #[error("word is not allowed")]
    BlockedWord,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
