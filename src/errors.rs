/*!
 * Error types for the lexisub application.
 *
 * This module contains custom error types for different parts of the
 * filtering pipeline, using the thiserror crate for ergonomic error
 * definitions. The taxonomy mirrors how errors propagate at runtime:
 *
 * - `InputError` — rejected before a task is ever created
 * - `NotFoundError` — a missing file or record; a dictionary miss is an
 *   expected outcome and is NOT represented here
 * - `DependencyError` — an external adapter (lemmatizer, translator,
 *   transcriber, store) is unavailable; fails the owning task only
 * - `CacheError` — never fatal; callers degrade to direct store access
 */

use thiserror::Error;

/// Maximum length of an error message captured onto a failed task.
pub const MAX_CAPTURED_ERROR_LEN: usize = 500;

/// Errors in the submitted input, detected before any task is created
#[derive(Error, Debug)]
pub enum InputError {
    /// Source text was empty or contained no parseable segments
    #[error("Empty or unparseable source: {0}")]
    EmptySource(String),

    /// A time window failed validation (end <= start, negative, ...)
    #[error("Invalid time window: {0}")]
    InvalidTimeWindow(String),

    /// An unsupported or malformed language code
    #[error("Invalid language: {0}")]
    InvalidLanguage(String),

    /// Any other request-shape problem
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Errors for resources that should exist but do not
#[derive(Error, Debug)]
pub enum NotFoundError {
    /// The source file is missing
    #[error("Source file not found: {0}")]
    SourceFile(String),

    /// A referenced task id is unknown to the poll registry
    #[error("Task not found: {0}")]
    Task(String),
}

/// Errors raised by external adapters
#[derive(Error, Debug)]
pub enum DependencyError {
    /// The lemmatizer backend failed or is unreachable
    #[error("Lemmatizer failure: {0}")]
    Lemmatizer(String),

    /// The translation backend failed or is unreachable
    #[error("Translator failure: {0}")]
    Translator(String),

    /// The transcription backend failed or is unreachable
    #[error("Transcriber failure: {0}")]
    Transcriber(String),

    /// The persistent store failed
    #[error("Store failure: {0}")]
    Store(String),

    /// The adapter responded with a protocol-level error
    #[error("Adapter responded with error: {status_code} - {message}")]
    Protocol {
        /// Status code reported by the backend
        status_code: u16,
        /// Error message from the backend
        message: String,
    },
}

/// Errors on the cache fast path. Callers must treat these as advisory
/// and fall back to the underlying store.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The cache backend rejected an operation
    #[error("Cache backend error: {0}")]
    Backend(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error in the submitted input
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    /// A required resource was missing
    #[error("Not found: {0}")]
    NotFound(#[from] NotFoundError),

    /// An external adapter failed
    #[error("Dependency error: {0}")]
    Dependency(#[from] DependencyError),

    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

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

/// Truncate an error message to the bound captured onto TaskProgress
pub fn bounded_message(message: &str) -> String {
    if message.len() <= MAX_CAPTURED_ERROR_LEN {
        message.to_string()
    } else {
        let mut end = MAX_CAPTURED_ERROR_LEN;
        while !message.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &message[..end])
    }
}
