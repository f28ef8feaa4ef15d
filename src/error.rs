use thiserror::Error;

#[derive(Debug, Error)]
pub enum EtlError {
    #[error("remote service returned {status}: {body}")]
    RemoteService { status: u16, body: String },

    #[error("remote service returned a malformed body: {0}")]
    MalformedBody(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store error: {0}")]
    StoreConnection(#[from] rusqlite::Error),

    #[error("query '{0}' needs an artifact id")]
    MissingParameter(&'static str),

    #[error("unknown query: {0}")]
    UnknownQuery(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type EtlResult<T> = Result<T, EtlError>;
