use std::time::Duration;

use crate::hh::FetchError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("API error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Section [{section}] is not found in the {file} file")]
    MissingSection { section: String, file: String },

    #[error("Timed out connecting to the database after {0:?}")]
    ConnectTimeout(Duration),
}

impl AppError {
    /// True for failures to reach the database at all, as opposed to a
    /// statement failing on a live connection.
    pub fn is_connection_failure(&self) -> bool {
        match self {
            AppError::ConnectTimeout(_) => true,
            AppError::Database(
                sqlx::Error::Io(_)
                | sqlx::Error::Tls(_)
                | sqlx::Error::PoolTimedOut
                | sqlx::Error::Configuration(_),
            ) => true,
            // 28xxx: invalid authorization, 3D000: unknown database
            AppError::Database(sqlx::Error::Database(db)) => db
                .code()
                .is_some_and(|code| code.starts_with("28") || code == "3D000"),
            _ => false,
        }
    }
}
