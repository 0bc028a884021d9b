//! The CGI request and response boundary.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read, Write};

use oxide_dispatch::{Body, HostRequest, Method, Options, Response};
use thiserror::Error;

/// Errors reading a CGI request.
#[derive(Debug, Error)]
pub enum CgiError {
    /// A variable every CGI request carries is absent.
    #[error("missing CGI variable {0}")]
    MissingVariable(&'static str),

    /// The request method is not one the dispatcher knows.
    #[error("unsupported request method: {0}")]
    UnsupportedMethod(String),
}

/// A request described by CGI meta-variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CgiRequest {
    /// `REQUEST_METHOD` as given.
    pub method: String,
    /// `REQUEST_URI`, or the URI rebuilt from the script name, path info and
    /// query string.
    pub request_uri: String,
    /// `SCRIPT_NAME`, the path the gateway mounted the program under.
    pub script_name: String,
    /// `CONTENT_LENGTH`, zero when absent or invalid.
    pub content_length: u64,
    /// Headers recovered from `HTTP_*`, `CONTENT_TYPE` and `CONTENT_LENGTH`.
    pub headers: HashMap<String, String>,
}

impl CgiRequest {
    /// Reads the request from the process environment.
    pub fn from_env() -> Result<Self, CgiError> {
        Self::from_vars(std::env::vars())
    }

    /// Reads the request from a set of meta-variables.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, CgiError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let method = vars
            .get("REQUEST_METHOD")
            .cloned()
            .ok_or(CgiError::MissingVariable("REQUEST_METHOD"))?;
        let request_uri = vars
            .get("REQUEST_URI")
            .cloned()
            .unwrap_or_else(|| rebuild_uri(&vars));
        let script_name = vars.get("SCRIPT_NAME").cloned().unwrap_or_default();
        let content_length = vars
            .get("CONTENT_LENGTH")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0);
        let headers = vars
            .iter()
            .filter_map(|(k, v)| header_name(k).map(|name| (name, v.clone())))
            .collect();

        Ok(Self {
            method,
            request_uri,
            script_name,
            content_length,
            headers,
        })
    }

    /// The prefix the application is mounted under: the script name without
    /// a trailing `/index.cgi` or slash.
    pub fn mount_root(&self) -> &str {
        let name = self.script_name.trim_end_matches('/');
        name.strip_suffix("/index.cgi").unwrap_or(name)
    }

    /// Uses [`Self::mount_root`] as the root URI unless one is configured.
    pub fn default_root_uri(&self, options: &mut Options) {
        if options.root_uri.is_empty() {
            options.root_uri = self.mount_root().to_string();
        }
    }

    /// Turns this into a host request whose body reads at most
    /// `content_length` bytes from `body`.
    pub fn into_host_request(self, body: impl Read + 'static) -> Result<HostRequest, CgiError> {
        let method = Method::parse(&self.method)
            .ok_or_else(|| CgiError::UnsupportedMethod(self.method.clone()))?;

        let mut request = HostRequest::new(method, self.request_uri);
        for (key, value) in self.headers {
            request = request.header(key, value);
        }
        Ok(request.body_reader(body.take(self.content_length)))
    }
}

fn rebuild_uri(vars: &HashMap<String, String>) -> String {
    let var = |key: &str| vars.get(key).map_or("", String::as_str);
    let mut uri = format!("{}{}", var("SCRIPT_NAME"), var("PATH_INFO"));
    let query = var("QUERY_STRING");
    if !query.is_empty() {
        uri.push('?');
        uri.push_str(query);
    }
    uri
}

/// `HTTP_X_REQUESTED_WITH` becomes `X-Requested-With`.
fn header_name(var: &str) -> Option<String> {
    let raw = match var {
        "CONTENT_TYPE" | "CONTENT_LENGTH" => var,
        _ => var.strip_prefix("HTTP_")?,
    };
    let name = raw
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let lower = part.to_ascii_lowercase();
            let mut chars = lower.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_ascii_uppercase().to_string() + chars.as_str()
            })
        })
        .collect::<Vec<_>>()
        .join("-");
    (!name.is_empty()).then_some(name)
}

/// Writes a response in CGI form: a `Status:` line, the headers, a blank
/// line, then the body. File bodies are copied from disk.
pub fn write_response(response: &Response, out: &mut impl Write) -> io::Result<()> {
    write!(out, "Status: {} {}\r\n", response.status, response.status_text())?;

    let mut headers: Vec<(&String, &String)> = response
        .headers
        .iter()
        .filter(|(k, _)| !k.eq_ignore_ascii_case("content-length"))
        .collect();
    headers.sort();
    for (key, value) in headers {
        write!(out, "{key}: {}\r\n", value.replace(['\r', '\n'], " "))?;
    }

    match &response.body {
        Body::Bytes(bytes) => {
            write!(out, "Content-Length: {}\r\n\r\n", bytes.len())?;
            out.write_all(bytes)?;
        }
        Body::File { path, .. } => {
            let file = File::open(path)?;
            let len = file.metadata()?.len();
            write!(out, "Content-Length: {len}\r\n\r\n")?;
            io::copy(&mut file.take(len), out)?;
        }
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_from_vars() {
        let request = CgiRequest::from_vars(vars(&[
            ("REQUEST_METHOD", "POST"),
            ("REQUEST_URI", "/app/items?x=1"),
            ("CONTENT_TYPE", "application/json"),
            ("CONTENT_LENGTH", "7"),
            ("HTTP_AUTHORIZATION", "Bearer abc"),
            ("HTTP_X_REQUESTED_WITH", "fetch"),
            ("PATH", "/usr/bin"),
        ]))
        .unwrap();

        assert_eq!(request.method, "POST");
        assert_eq!(request.request_uri, "/app/items?x=1");
        assert_eq!(request.content_length, 7);
        assert_eq!(request.headers.get("Authorization").unwrap(), "Bearer abc");
        assert_eq!(request.headers.get("X-Requested-With").unwrap(), "fetch");
        assert_eq!(request.headers.get("Content-Type").unwrap(), "application/json");
        assert!(!request.headers.contains_key("Path"));
    }

    #[test]
    fn test_uri_rebuilt_without_request_uri() {
        let request = CgiRequest::from_vars(vars(&[
            ("REQUEST_METHOD", "GET"),
            ("SCRIPT_NAME", "/app"),
            ("PATH_INFO", "/users/42"),
            ("QUERY_STRING", "a=1"),
        ]))
        .unwrap();
        assert_eq!(request.request_uri, "/app/users/42?a=1");
    }

    #[test]
    fn test_mount_root() {
        let request = CgiRequest::from_vars(vars(&[
            ("REQUEST_METHOD", "GET"),
            ("SCRIPT_NAME", "/cgi-bin/app/index.cgi"),
        ]))
        .unwrap();
        assert_eq!(request.mount_root(), "/cgi-bin/app");

        let mut options = Options::default();
        request.default_root_uri(&mut options);
        assert_eq!(options.root_uri, "/cgi-bin/app");

        let mut options = Options {
            root_uri: "/configured".to_string(),
            ..Options::default()
        };
        request.default_root_uri(&mut options);
        assert_eq!(options.root_uri, "/configured");
    }

    #[test]
    fn test_missing_method() {
        let err = CgiRequest::from_vars(vars(&[("REQUEST_URI", "/")])).unwrap_err();
        assert!(matches!(err, CgiError::MissingVariable("REQUEST_METHOD")));
    }

    #[test]
    fn test_into_host_request_limits_body() {
        let request = CgiRequest::from_vars(vars(&[
            ("REQUEST_METHOD", "post"),
            ("REQUEST_URI", "/items"),
            ("CONTENT_TYPE", "text/plain"),
            ("CONTENT_LENGTH", "5"),
        ]))
        .unwrap();

        let mut host = request
            .into_host_request(Cursor::new(b"hello and more".to_vec()))
            .unwrap();
        assert_eq!(host.method, Method::Post);
        assert_eq!(host.content_type, "text/plain");
        assert_eq!(host.body.read_once().unwrap(), b"hello");
    }

    #[test]
    fn test_unsupported_method() {
        let request = CgiRequest::from_vars(vars(&[("REQUEST_METHOD", "BREW")])).unwrap();
        let err = request.into_host_request(io::empty()).unwrap_err();
        assert!(matches!(err, CgiError::UnsupportedMethod(ref m) if m == "BREW"));
    }

    #[test]
    fn test_write_response() {
        let response = Response::send("Not found!", 404, "text/plain").unwrap();
        let mut out = Vec::new();
        write_response(&response, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Status: 404 Not Found\r\nContent-Type: text/plain\r\nContent-Length: 10\r\n\r\nNot found!"
        );
    }

    #[test]
    fn test_write_streamed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("to_download.txt");
        std::fs::write(&path, "bye world!").unwrap();

        let mut response = Response::new(200).header("Content-Type", "text/plain");
        response.body = Body::File { path: path.clone(), len: 10 };
        std::fs::write(&path, "bye world, again!").unwrap();

        let mut out = Vec::new();
        write_response(&response, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Status: 200 OK\r\n"));
        assert!(text.ends_with("Content-Length: 17\r\n\r\nbye world, again!"));
    }
}
