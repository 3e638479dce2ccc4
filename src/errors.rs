/*!
 * Error types for the yapt application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when working with translation backends
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The local LLM server has no models installed
    #[error("No Ollama models found (try: ollama pull gemma2:9b)")]
    NoModels,

    /// The requested model is not installed on the local LLM server
    #[error("Model '{requested}' not found. Available: {available}")]
    ModelNotFound {
        /// Model name that was asked for
        requested: String,
        /// Comma separated list of installed models
        available: String,
    },
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_connect() || error.is_timeout() {
            Self::ConnectionError(error.to_string())
        } else if error.is_decode() {
            Self::ParseError(error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}

/// Errors that can occur while reading or rewriting a PDF
#[derive(Error, Debug)]
pub enum PdfError {
    /// The document could not be opened or parsed
    #[error("Failed to load PDF: {0}")]
    Load(String),

    /// A page content stream could not be decoded or encoded
    #[error("Invalid content on page {page}: {message}")]
    Content {
        /// 1-based page number
        page: usize,
        /// Underlying library message
        message: String,
    },

    /// A page index outside the document was requested
    #[error("Page {0} is out of range")]
    PageOutOfRange(usize),

    /// The document could not be written
    #[error("Failed to save PDF: {0}")]
    Save(String),
}

/// Errors produced while parsing a page selection such as "1-10,15"
#[derive(Error, Debug, PartialEq)]
pub enum PageRangeError {
    /// A part is not a number or a range of numbers
    #[error("Invalid page number '{0}'")]
    InvalidNumber(String),

    /// A part contains more than one dash
    #[error("Invalid page range '{0}'")]
    InvalidRange(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a translation backend
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from PDF processing
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Error from the page selection
    #[error("Page range error: {0}")]
    PageRange(#[from] PageRangeError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The user interrupted the run
    #[error("Translation cancelled by user")]
    Cancelled,

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
