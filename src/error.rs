use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("http transport failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Fault returned by the server inside a JSON-RPC error envelope.
    #[error("odoo fault {code} ({name}): {message}")]
    Remote {
        code: i64,
        name: String,
        message: String,
    },

    #[error("authentication refused for {username}@{db}")]
    Authentication { db: String, username: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("malformed {model} record: {reason}")]
    MalformedRecord { model: String, reason: String },
}

impl Error {
    pub fn malformed(model: &str, reason: impl Into<String>) -> Self {
        Error::MalformedRecord {
            model: model.to_string(),
            reason: reason.into(),
        }
    }
}
