use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedPocketError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parsing error: {0}")]
    FeedParse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IMAP error: {0}")]
    Imap(#[from] imap::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Content server error: {0}")]
    Server(String),

    #[error("Delivery rejected: {0}")]
    Rejected(String),

    #[error("Mailbox error: {0}")]
    Mailbox(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, FeedPocketError>;
