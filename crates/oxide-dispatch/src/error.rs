//! Error types for dispatching.

use std::path::PathBuf;

use thiserror::Error;

/// Generic message shown to callers when debug mode is off.
pub const GENERIC_FAULT_MESSAGE: &str = "Internal server error";

/// A fault raised while dispatching a request.
///
/// Faults that escape a middleware or handler end up in the fault funnel,
/// which turns them into a 500 response.
#[derive(Debug, Error)]
pub enum Fault {
    /// A terminal send was asked to use a status outside 100-599.
    #[error("invalid status code: {0} (must be 100-599)")]
    InvalidStatusCode(u16),

    /// Response data could not be encoded as JSON.
    #[error("failed to encode JSON response: {0}")]
    JsonEncode(#[from] serde_json::Error),

    /// A file could not be sent.
    #[error(transparent)]
    File(#[from] FileError),

    /// An uploaded file could not be relocated.
    #[error(transparent)]
    Upload(#[from] UploadError),

    /// A handler or middleware failed.
    #[error("{0}")]
    Handler(String),

    /// A handler or middleware panicked.
    #[error("panic: {0}")]
    Panic(String),
}

impl Fault {
    /// Creates a handler fault from a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Handler(message.into())
    }

    /// Returns the numeric code reported alongside this fault.
    pub fn code(&self) -> i32 {
        match self {
            Self::InvalidStatusCode(_) => 1,
            Self::JsonEncode(_) => 2,
            Self::File(_) => 3,
            Self::Upload(_) => 4,
            Self::Handler(_) => 5,
            Self::Panic(_) => 6,
        }
    }

    /// Whether the message may be shown to the caller outside debug mode.
    ///
    /// Only the checks performed by the send helpers qualify; everything else
    /// is reported as [`GENERIC_FAULT_MESSAGE`].
    pub fn is_public(&self) -> bool {
        matches!(self, Self::InvalidStatusCode(_) | Self::JsonEncode(_))
    }
}

/// Errors from sending a file.
#[derive(Debug, Error)]
pub enum FileError {
    /// The file does not exist or is not a regular file.
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The file exists but could not be opened or read.
    #[error("file not readable: {}: {source}", path.display())]
    NotReadable {
        /// Path of the file.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
}

/// Errors from relocating an uploaded file.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The upload itself is unusable (no filename, empty transfer).
    #[error("upload error: {0}")]
    Upload(String),

    /// The file is larger than the policy allows.
    #[error("uploaded file is too large: {size} bytes (max {max})")]
    Size {
        /// Size of the uploaded file.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },

    /// The file extension is not allowed by the policy.
    #[error("file extension not allowed: {0:?}")]
    Extension(String),

    /// Writing the file to its destination failed.
    #[error("failed to write uploaded file to {}: {source}", path.display())]
    Write {
        /// Destination path.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
}

/// Errors from decoding a multipart body.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MultipartError {
    /// The content type carries no boundary parameter.
    #[error("missing boundary in multipart content type")]
    MissingBoundary,

    /// The body does not start with the boundary delimiter.
    #[error("multipart body does not contain the boundary delimiter")]
    MissingDelimiter,

    /// A part has no blank line between headers and content.
    #[error("malformed multipart part: {0}")]
    MalformedPart(String),
}

/// Errors from loading [`Options`](crate::Options).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The options file could not be read.
    #[error("failed to read options file {}: {source}", path.display())]
    Io {
        /// Path of the options file.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The options file is not valid JSON.
    #[error("invalid options: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type alias for dispatch operations.
pub type Result<T> = std::result::Result<T, Fault>;
