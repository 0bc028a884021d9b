//! Per-request state shared by middleware and handlers.

use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::Result;
use crate::multipart;
use crate::options::Options;
use crate::request::{parse_urlencoded, HostRequest, Method, PathParams};
use crate::response::{Reply, Response};
use crate::upload::UploadedFile;

/// Username and password from a Basic authorization header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// The username (everything before the first colon).
    pub username: String,
    /// The password (everything after the first colon).
    pub password: String,
}

/// The request as seen by middleware and handlers.
///
/// Created once per dispatch cycle. `query`, `files` and `body` are only
/// filled in when a route was selected; `params` only for a positional match.
#[derive(Debug)]
pub struct RequestContext {
    /// HTTP method.
    pub method: Method,
    /// Normalized request URI.
    pub uri: String,
    /// Value of the Content-Type header, empty if absent.
    pub content_type: String,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// Query string parameters.
    pub query: HashMap<String, String>,
    /// Path parameters captured by the matched route.
    pub params: PathParams,
    /// Decoded request body.
    pub body: Map<String, Value>,
    /// Uploaded files keyed by form field.
    pub files: HashMap<String, UploadedFile>,
    /// Bearer token, after [`Self::parse_auth`].
    pub token: Option<String>,
    /// Basic credentials, after [`Self::parse_auth`].
    pub credentials: Option<Credentials>,
    query_string: Option<String>,
    include_status_in_json: bool,
    output: String,
    response_headers: Vec<(String, String)>,
}

impl RequestContext {
    /// Creates the context for a host request, normalizing method and URI.
    pub fn new(request: &HostRequest, options: &Options) -> Self {
        Self {
            method: request.method,
            uri: normalize_uri(&request.request_uri, &options.root_uri),
            content_type: request.content_type.clone(),
            headers: request.headers.clone(),
            query: HashMap::new(),
            params: PathParams::new(),
            body: Map::new(),
            files: HashMap::new(),
            token: None,
            credentials: None,
            query_string: request.query_string().map(str::to_string),
            include_status_in_json: options.include_status_code_in_json,
            output: String::new(),
            response_headers: Vec::new(),
        }
    }

    /// Fills in query, files and body from the host request.
    ///
    /// The raw body is read at most once, and only for content types that
    /// carry form fields or JSON. A malformed body leaves `body` empty.
    pub fn negotiate_body(&mut self, request: &mut HostRequest) {
        if let Some(query) = &self.query_string {
            self.query = parse_urlencoded(query).unwrap_or_else(|| {
                warn!(query = %query, "failed to decode query string");
                HashMap::new()
            });
        }

        let essence = mime_essence(&self.content_type);
        let needs_body = matches!(
            essence.as_str(),
            "application/x-www-form-urlencoded" | "multipart/form-data" | "application/json"
        );
        if !needs_body {
            return;
        }

        let raw = match request.body.read_once() {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "failed to read request body");
                return;
            }
        };

        match essence.as_str() {
            "application/x-www-form-urlencoded" => {
                let fields = parse_urlencoded(&String::from_utf8_lossy(&raw)).unwrap_or_else(|| {
                    warn!("failed to decode form body");
                    HashMap::new()
                });
                self.body = fields
                    .into_iter()
                    .map(|(k, v)| (k, Value::String(v)))
                    .collect();
            }
            "multipart/form-data" => match multipart::parse(&self.content_type, &raw) {
                Ok(form) => {
                    self.body = form
                        .fields
                        .into_iter()
                        .map(|(k, v)| (k, Value::String(v)))
                        .collect();
                    if self.method != Method::Get {
                        self.files = form
                            .files
                            .into_iter()
                            .map(|file| (file.field.clone(), file))
                            .collect();
                    }
                }
                Err(e) => warn!(error = %e, "failed to decode multipart body"),
            },
            _ => self.body = decode_json_body(&raw),
        }
    }

    /// Reads the Authorization header into [`Self::token`] or
    /// [`Self::credentials`].
    ///
    /// `Bearer <token>` sets the token. `Basic <base64>` is decoded and split
    /// on the first colon, so passwords may contain colons. Anything else
    /// leaves both unset.
    pub fn parse_auth(&mut self) {
        self.token = None;
        self.credentials = None;

        let Some(header) = self.header("Authorization") else {
            return;
        };
        let Some((scheme, value)) = header.trim().split_once(' ') else {
            debug!("authorization header without scheme");
            return;
        };
        let value = value.trim();

        if scheme.eq_ignore_ascii_case("bearer") {
            if !value.is_empty() {
                self.token = Some(value.to_string());
            }
        } else if scheme.eq_ignore_ascii_case("basic") {
            self.credentials = decode_basic(value);
            if self.credentials.is_none() {
                debug!("undecodable basic credentials");
            }
        } else {
            debug!(scheme = %scheme, "unsupported authorization scheme");
        }
    }

    /// Gets a request header, ignoring the case of the name.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Gets a query parameter.
    pub fn get_query(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    /// Gets a path parameter, or an empty string if it was not captured.
    pub fn param(&self, key: &str) -> &str {
        self.params.get(key).unwrap_or_default()
    }

    /// Appends to the rendered output.
    pub fn write(&mut self, content: &str) {
        self.output.push_str(content);
    }

    /// Returns what has been rendered so far.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Takes the rendered output, leaving it empty.
    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    /// Stages a header for whatever response ends this cycle.
    ///
    /// Staged headers never replace a header the final response already has.
    pub fn set_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.response_headers.push((key.into(), value.into()));
    }

    /// Merges the staged headers into a response.
    pub fn apply_headers(&mut self, mut response: Response) -> Response {
        for (key, value) in self.response_headers.drain(..) {
            if response.get_header(&key).is_none() {
                response.headers.insert(key, value);
            }
        }
        response
    }

    /// Terminal send, see [`Response::send`].
    pub fn send(&self, body: impl Into<Vec<u8>>, status: u16, content_type: &str) -> Result<Reply> {
        Ok(Response::send(body, status, content_type)?.into())
    }

    /// Sends plain text with status 200.
    pub fn text(&self, body: impl Into<Vec<u8>>) -> Result<Reply> {
        self.send(body, 200, "text/plain")
    }

    /// Sends JSON, including the status field if the options ask for it.
    pub fn send_json<T: Serialize + ?Sized>(&self, data: &T, status: u16) -> Result<Reply> {
        Ok(Response::send_json(data, status, self.include_status_in_json)?.into())
    }

    /// Sends JSON whose status is read from its own `status` field.
    pub fn send_json_body<T: Serialize + ?Sized>(&self, data: &T) -> Result<Reply> {
        Ok(Response::send_json_body(data, self.include_status_in_json)?.into())
    }
}

/// Normalizes a request URI.
///
/// Strips the root prefix once, drops the query string when it carries
/// parameters, trims trailing slashes and turns an empty result into `/`.
pub fn normalize_uri(request_uri: &str, root_uri: &str) -> String {
    let root = root_uri.trim_end_matches('/');
    let mut uri = request_uri;
    if !root.is_empty() {
        if let Some(rest) = uri.strip_prefix(root) {
            if rest.is_empty() || rest.starts_with('/') || rest.starts_with('?') {
                uri = rest;
            }
        }
    }

    if let Some((path, query)) = uri.split_once('?') {
        let has_params = parse_urlencoded(query).is_some_and(|q| !q.is_empty());
        if has_params {
            uri = path;
        }
    }

    let trimmed = uri.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Returns the lowercased media type of a content type, without parameters.
pub fn mime_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn decode_json_body(raw: &[u8]) -> Map<String, Value> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Map::new();
    }
    match serde_json::from_slice::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            warn!(kind = json_kind(&other), "JSON body is not an object; ignoring");
            Map::new()
        }
        Err(e) => {
            warn!(error = %e, "failed to decode JSON body");
            Map::new()
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn decode_basic(value: &str) -> Option<Credentials> {
    let decoded = STANDARD.decode(value).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some(Credentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}
