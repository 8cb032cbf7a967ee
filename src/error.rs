//! Error types for the allergen-extract library.
//!
//! Two distinct error types reflect two distinct failure sites:
//!
//! * [`SelectionError`]: **Local**: the user picked or dropped something that
//!   is not a PDF. Raised by [`crate::selector::FileSelector`] and handled
//!   there; it never reaches the workflow controller.
//!
//! * [`ExtractError`]: **Remote or setup**: the upload failed (timeout,
//!   service rejection, connectivity) or the client could not be configured.
//!   Upload failures become [`crate::controller::WorkflowState::Failure`]
//!   through [`ExtractError::user_message`].

use std::path::PathBuf;
use thiserror::Error;

/// Shown when neither the service nor the transport gave a usable message.
pub const GENERIC_FAILURE_MESSAGE: &str = "An error occurred while processing the file";

/// Warning surfaced for a rejected (non-PDF) selection.
pub const NOT_A_PDF_WARNING: &str = "Please upload a PDF file";

/// Errors returned by the extraction client and its configuration.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Upload errors ─────────────────────────────────────────────────────
    /// No response within the request budget; the request was abandoned.
    #[error("timeout of {}ms exceeded", .secs * 1000)]
    Timeout { secs: u64 },

    /// The service answered with a non-success status.
    #[error("Request failed with status code {status}")]
    Service { status: u16, detail: Option<String> },

    /// The request never produced a response (connection refused, reset, DNS).
    #[error("Network Error: {reason}")]
    Network { reason: String },

    /// A 2xx response whose body is not a valid extraction result.
    #[error("Unexpected response from extraction service: {reason}")]
    Decode { reason: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not write the JSON export artifact.
    #[error("Failed to write export file '{path}': {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not serialise a result to JSON.
    #[error("Failed to serialise extraction result: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ExtractError {
    /// The single human-readable message shown for a failed upload.
    ///
    /// Priority: service-supplied `detail`, then the transport-level message,
    /// then [`GENERIC_FAILURE_MESSAGE`].
    pub fn user_message(&self) -> String {
        match self {
            ExtractError::Service {
                detail: Some(detail),
                ..
            } if !detail.is_empty() => detail.clone(),
            ExtractError::Network { reason } | ExtractError::Decode { reason }
                if reason.trim().is_empty() =>
            {
                GENERIC_FAILURE_MESSAGE.to_string()
            }
            other => other.to_string(),
        }
    }
}

/// A candidate file was refused before staging.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// Declared media type is not exactly `application/pdf`.
    #[error("Please upload a PDF file ('{name}' is {media_type})")]
    NotAPdf { name: String, media_type: String },

    /// The path given for a manual pick could not be read.
    #[error("Cannot read '{path}': {reason}")]
    Unreadable { path: PathBuf, reason: String },
}

impl SelectionError {
    /// Short user-facing warning, without the technical suffix.
    pub fn warning(&self) -> &str {
        match self {
            SelectionError::NotAPdf { .. } => NOT_A_PDF_WARNING,
            SelectionError::Unreadable { .. } => "Could not read the selected file",
        }
    }
}
