//! Uploaded files and their relocation to disk.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::UploadError;

/// Maximum upload size unless a policy says otherwise (10MB).
pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// A file received in a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Form field the file was sent under.
    pub field: String,
    /// Filename given by the client.
    pub file_name: String,
    /// Content type given by the client.
    pub content_type: String,
    /// File contents.
    pub data: Vec<u8>,
}

/// Constraints checked before an upload is written.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    /// Maximum size in bytes.
    pub max_size: usize,
    /// Allowed extensions, lowercase and without the dot. Empty allows all.
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_UPLOAD_SIZE,
            allowed_extensions: Vec::new(),
        }
    }
}

impl UploadPolicy {
    /// Sets the maximum size.
    #[must_use]
    pub fn max_size(mut self, size: usize) -> Self {
        self.max_size = size;
        self
    }

    /// Restricts uploads to the given extensions.
    #[must_use]
    pub fn allow_extensions(mut self, extensions: &[&str]) -> Self {
        self.allowed_extensions = extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }
}

impl UploadedFile {
    /// Returns the size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Returns the lowercased extension of the client filename.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
    }

    /// Returns the contents as text, if valid UTF-8.
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }

    /// Writes the file into `dir`, after checking it against `policy`.
    ///
    /// The file is stored as `file_name` if given, else under the sanitized
    /// client filename. Returns the destination path.
    pub fn relocate(
        &self,
        dir: impl AsRef<Path>,
        file_name: Option<&str>,
        policy: &UploadPolicy,
    ) -> Result<PathBuf, UploadError> {
        let name = sanitize_filename(file_name.unwrap_or(&self.file_name));
        if name.is_empty() {
            return Err(UploadError::Upload("upload has no usable filename".into()));
        }
        if self.data.is_empty() {
            return Err(UploadError::Upload(format!(
                "upload {:?} is empty",
                self.file_name
            )));
        }
        if self.size() > policy.max_size {
            return Err(UploadError::Size {
                size: self.size(),
                max: policy.max_size,
            });
        }
        if !policy.allowed_extensions.is_empty() {
            let extension = self.extension().unwrap_or_default();
            if !policy.allowed_extensions.contains(&extension) {
                return Err(UploadError::Extension(extension));
            }
        }

        let dir = dir.as_ref();
        let path = dir.join(&name);
        fs::create_dir_all(dir)
            .and_then(|()| fs::write(&path, &self.data))
            .map_err(|source| UploadError::Write {
                path: path.clone(),
                source,
            })?;

        debug!(field = %self.field, path = %path.display(), size = self.size(), "relocated upload");
        Ok(path)
    }
}

/// Makes a client filename safe to join onto a directory.
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .replace(['/', '\\'], "_")
        .replace("..", "_")
        .trim_start_matches('.')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, data: &[u8]) -> UploadedFile {
        UploadedFile {
            field: "file1".into(),
            file_name: name.into(),
            content_type: "text/plain".into(),
            data: data.to_vec(),
        }
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "____etc_passwd");
        assert_eq!(sanitize_filename(".hidden"), "hidden");
        assert_eq!(sanitize_filename("ok.txt"), "ok.txt");
    }

    #[test]
    fn test_relocate() {
        let dir = tempfile::tempdir().unwrap();
        let upload = file("notes.TXT", b"hello");
        let policy = UploadPolicy::default().allow_extensions(&[".txt"]);

        let path = upload.relocate(dir.path().join("sub"), None, &policy).unwrap();
        assert_eq!(path, dir.path().join("sub").join("notes.TXT"));
        assert_eq!(std::fs::read(&path).unwrap(), b"hello");
    }

    #[test]
    fn test_relocate_with_custom_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = file("a.txt", b"x")
            .relocate(dir.path(), Some("renamed.txt"), &UploadPolicy::default())
            .unwrap();
        assert_eq!(path.file_name().unwrap(), "renamed.txt");
    }

    #[test]
    fn test_relocate_policy_violations() {
        let dir = tempfile::tempdir().unwrap();

        let err = file("big.txt", b"0123456789")
            .relocate(dir.path(), None, &UploadPolicy::default().max_size(4))
            .unwrap_err();
        assert!(matches!(err, UploadError::Size { size: 10, max: 4 }));

        let err = file("run.exe", b"x")
            .relocate(dir.path(), None, &UploadPolicy::default().allow_extensions(&["txt"]))
            .unwrap_err();
        assert!(matches!(err, UploadError::Extension(ref e) if e == "exe"));

        let err = file("", b"x")
            .relocate(dir.path(), None, &UploadPolicy::default())
            .unwrap_err();
        assert!(matches!(err, UploadError::Upload(_)));

        let err = file("empty.txt", b"")
            .relocate(dir.path(), None, &UploadPolicy::default())
            .unwrap_err();
        assert!(matches!(err, UploadError::Upload(_)));
    }

    #[test]
    fn test_relocate_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let err = file("a.txt", b"x")
            .relocate(&blocker, None, &UploadPolicy::default())
            .unwrap_err();
        assert!(matches!(err, UploadError::Write { .. }));
    }
}
