#![allow(dead_code)]

use oxide_cgi::routes::{demo_dispatcher, DOWNLOAD_FILE};
use oxide_dispatch::{Dispatcher, HostRequest, Options, Response};
use tempfile::TempDir;

pub const BOUNDARY: &str = "----oxideboundary";

/// The demo application, serving files from a fresh directory.
pub struct App {
    pub dispatcher: Dispatcher,
    pub files: TempDir,
}

impl App {
    pub fn new() -> Self {
        Self::with_options(Options {
            debug_mode: true,
            ..Options::default()
        })
    }

    pub fn with_options(options: Options) -> Self {
        let files = tempfile::tempdir().unwrap();
        std::fs::write(files.path().join(DOWNLOAD_FILE), "bye world!").unwrap();
        Self {
            dispatcher: demo_dispatcher(options, files.path()),
            files,
        }
    }

    pub fn send(&self, request: HostRequest) -> Response {
        self.dispatcher.dispatch(request)
    }

    pub fn get(&self, uri: &str) -> Response {
        self.send(HostRequest::get(uri))
    }
}

pub fn text(response: &Response) -> String {
    response
        .body_string()
        .unwrap_or_else(|| panic!("Expected a buffered UTF-8 body, got {:?}", response.body))
}

/// Builds a multipart body from text fields and `(field, filename, contents)`
/// files.
pub fn multipart(fields: &[(&str, &str)], files: &[(&str, &str, &str)]) -> (String, Vec<u8>) {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    for (name, filename, contents) in files {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: text/plain\r\n\r\n{contents}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    (
        format!("multipart/form-data; boundary={BOUNDARY}"),
        body.into_bytes(),
    )
}
