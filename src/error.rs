// src/error.rs

//! Unified error handling for the autopost application.

use std::fmt;

use thiserror::Error;

/// Result type alias for autopost operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Text generation error
    #[error("Generation error: {0}")]
    Generation(String),

    /// Publishing error
    #[error("Publish error for {context}: {message}")]
    Publish { context: String, message: String },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a text-generation error.
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    /// Create a publish error with context.
    pub fn publish(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Publish {
            context: context.into(),
            message: message.to_string(),
        }
    }
}
