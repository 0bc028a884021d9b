//! Sending files from disk.

use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::Path;

use crate::error::FileError;
use crate::response::{Body, Response, CONTENT_TYPE};

/// How a file is sent.
#[derive(Debug, Clone, Default)]
pub struct SendFile {
    /// Content type; guessed from the extension when unset.
    pub content_type: Option<String>,
    /// Stream the file from disk instead of reading it into memory.
    pub stream: bool,
    /// Offer the file as a download under this name.
    pub download_name: Option<String>,
}

impl SendFile {
    /// Sets the content type.
    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Streams the file instead of buffering it.
    #[must_use]
    pub fn stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Offers the file as a download.
    #[must_use]
    pub fn download_as(mut self, name: impl Into<String>) -> Self {
        self.download_name = Some(name.into());
        self
    }
}

/// Builds a 200 response carrying a file.
///
/// A streamed response holds [`Body::File`]; the file is checked to be
/// readable now and copied by the host when the response is written.
pub fn send_file(path: impl AsRef<Path>, options: &SendFile) -> Result<Response, FileError> {
    let path = path.as_ref();
    let metadata = fs::metadata(path).map_err(|e| classify(path, e))?;
    if !metadata.is_file() {
        return Err(FileError::NotFound(path.to_path_buf()));
    }

    let body = if options.stream {
        File::open(path).map_err(|e| classify(path, e))?;
        Body::File {
            path: path.to_path_buf(),
            len: metadata.len(),
        }
    } else {
        Body::Bytes(fs::read(path).map_err(|e| classify(path, e))?)
    };

    let content_type = options.content_type.clone().unwrap_or_else(|| {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        mime_type_for_extension(&extension).to_string()
    });

    let mut response = Response::new(200).header(CONTENT_TYPE, content_type);
    if let Some(name) = &options.download_name {
        response = response.header(
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", name.replace('"', "")),
        );
    }
    response.body = body;
    Ok(response)
}

fn classify(path: &Path, error: std::io::Error) -> FileError {
    if error.kind() == ErrorKind::NotFound {
        FileError::NotFound(path.to_path_buf())
    } else {
        FileError::NotReadable {
            path: path.to_path_buf(),
            source: error,
        }
    }
}

/// Returns the content type for a file extension.
pub fn mime_type_for_extension(extension: &str) -> &'static str {
    match extension {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" => "application/json",
        "txt" => "text/plain; charset=utf-8",
        "csv" => "text/csv",
        "xml" => "application/xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "wasm" => "application/wasm",
        _ => "application/octet-stream",
    }
}
