//! Error type shared by the libscraper library crates.

/// Failures raised below the application layer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// SQLite, pool or migration failure.
    #[error("Database error: {0}")]
    Database(String),

    /// An overwrite mode other than `""` or `force_all`.
    #[error("Unknown overwrite mode: {0:?}")]
    UnknownMode(String),
}

impl Error {
    pub fn database<S: Into<String>>(msg: S) -> Self {
        Self::Database(msg.into())
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
