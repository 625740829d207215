//! Common error types for the duty roster

use thiserror::Error;

/// Common result type for roster operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types shared by the scheduling core and the persistence layer
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed TOML configuration file
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// No active members are registered, so no season can be generated
    #[error("No active members registered; cannot generate shifts")]
    EmptyRoster,

    /// Invalid user input or persisted value
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
