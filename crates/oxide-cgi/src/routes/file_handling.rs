//! File download and upload routes.

use std::fs;
use std::path::{Path, PathBuf};

use oxide_dispatch::{
    send_file, Reply, RequestContext, Result, RouteSource, RouteTable, SendFile, UploadError,
    UploadPolicy,
};
use serde_json::{json, Value};
use tracing::warn;

/// Name of the file served by the download routes.
pub const DOWNLOAD_FILE: &str = "to_download.txt";

/// Route source for the file routes, rooted at a directory.
#[derive(Debug, Clone)]
pub struct FileHandling {
    dir: PathBuf,
    policy: UploadPolicy,
}

impl FileHandling {
    /// Creates the file routes for `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            policy: UploadPolicy::default(),
        }
    }

    /// Sets the policy uploads are checked against.
    #[must_use]
    pub fn policy(mut self, policy: UploadPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl RouteSource for FileHandling {
    fn register(&self, routes: &mut RouteTable) {
        let download = self.dir.join(DOWNLOAD_FILE);

        let path = download.clone();
        routes.get("/download_file", move |_, _| {
            let options = SendFile::default().content_type("text/plain");
            Ok(send_file(&path, &options)?.into())
        });

        routes.get("/download_file/stream", move |_, _| {
            let options = SendFile::default().content_type("text/plain").stream(true);
            Ok(send_file(&download, &options)?.into())
        });

        let dir = self.dir.clone();
        let policy = self.policy.clone();
        routes.post("/upload_file", move |ctx, _| upload(ctx, &dir, &policy));
    }
}

/// Stores the single uploaded `file1`, reads it back, and echoes it with the
/// form fields.
fn upload(ctx: &RequestContext, dir: &Path, policy: &UploadPolicy) -> Result<Reply> {
    if ctx.files.is_empty() {
        return reject(ctx, "No files could be found in request!");
    }
    if ctx.files.len() > 1 {
        return reject(ctx, "Too many files in request, only 1 is expected!");
    }
    let Some(file) = ctx.files.get("file1") else {
        return reject(ctx, "Couldn't find the uploaded file under the property \"file1\"!");
    };

    let name = file
        .extension()
        .map_or_else(|| "uploaded_file".to_string(), |ext| format!("uploaded_file.{ext}"));
    let target = match file.relocate(dir, Some(&name), policy) {
        Ok(target) => target,
        Err(e @ UploadError::Write { .. }) => return Err(e.into()),
        Err(e) => {
            warn!(error = %e, "upload rejected");
            return reject(ctx, "An error occurred with the upload!");
        }
    };

    let contents = fs::read_to_string(&target);
    if let Err(e) = fs::remove_file(&target) {
        warn!(path = %target.display(), error = %e, "failed to remove uploaded file");
    }
    let Ok(contents) = contents else {
        return ctx.send_json(&json!({ "error": "Failed to read uploaded file!" }), 500);
    };

    let mut data = ctx.body.clone();
    data.insert("file1".to_string(), Value::String(contents));
    ctx.send_json(&data, 200)
}

fn reject(ctx: &RequestContext, message: &str) -> Result<Reply> {
    ctx.send_json(&json!({ "error": message }), 400)
}
