//! Error types for GiveLink search

use thiserror::Error;

/// Result type alias using GiveLink's Error
pub type Result<T> = std::result::Result<T, Error>;

/// GiveLink search error types
#[derive(Error, Debug)]
pub enum Error {
    // Input errors (E100-E199)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown sort field '{0}'. Valid fields: created_at, title, category, view_count.")]
    UnknownSortField(String),

    #[error("Unknown sort order '{0}'. Use 'asc' or 'desc'.")]
    UnknownSortOrder(String),

    #[error("Invalid date '{0}'. Use RFC 3339 or YYYY-MM-DD.")]
    InvalidDate(String),

    // Database errors (E400-E499)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    Config(String),

    // Generic errors
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "E100",
            Self::UnknownSortField(_) => "E101",
            Self::UnknownSortOrder(_) => "E102",
            Self::InvalidDate(_) => "E103",
            Self::Database(_) => "E400",
            Self::Config(_) => "E600",
            Self::Other(_) | Self::Io(_) => "E9999",
        }
    }

    /// Whether this error stems from caller input rather than the service
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_)
                | Self::UnknownSortField(_)
                | Self::UnknownSortOrder(_)
                | Self::InvalidDate(_)
        )
    }
}
