//! HTTP response type and the terminal send helpers.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Fault, Result};

/// Name of the content type header as written by this crate.
pub const CONTENT_TYPE: &str = "Content-Type";

/// A response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// Bytes held in memory.
    Bytes(Vec<u8>),
    /// A file the host streams from disk when writing the response.
    File {
        /// Path of the file.
        path: PathBuf,
        /// Length in bytes when the response was built.
        len: u64,
    },
}

impl Default for Body {
    fn default() -> Self {
        Self::Bytes(Vec::new())
    }
}

/// An HTTP response.
#[derive(Debug, Clone, Default)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: Body,
}

impl Response {
    /// Creates a new response with the given status.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Body::default(),
        }
    }

    /// Terminal send: body, status and content type.
    ///
    /// Fails with [`Fault::InvalidStatusCode`] unless `status` is in 100-599.
    pub fn send(body: impl Into<Vec<u8>>, status: u16, content_type: &str) -> Result<Self> {
        check_status(status)?;
        Ok(Self::new(status)
            .header(CONTENT_TYPE, content_type.trim())
            .body(body))
    }

    /// Terminal send of JSON data.
    ///
    /// With `include_status` set, a `status` field holding `status` is
    /// emitted first in the object (replacing any `status` the data had).
    /// Data that is not an object is wrapped as `{"status": .., "data": ..}`.
    pub fn send_json<T: Serialize + ?Sized>(
        data: &T,
        status: u16,
        include_status: bool,
    ) -> Result<Self> {
        check_status(status)?;
        let value = serde_json::to_value(data)?;
        let payload = if include_status {
            with_status_first(value, status)
        } else {
            value
        };
        let body = serde_json::to_vec(&payload)?;
        Self::send(body, status, "application/json")
    }

    /// Terminal send of JSON data that carries its own status.
    ///
    /// The status is read from the data's `status` field (a number or a
    /// numeric string) and defaults to 200. The field is moved first, or
    /// removed when `include_status` is false.
    pub fn send_json_body<T: Serialize + ?Sized>(data: &T, include_status: bool) -> Result<Self> {
        let mut value = serde_json::to_value(data)?;
        let status = value
            .get("status")
            .and_then(status_from_value)
            .unwrap_or(200);
        if !include_status {
            if let Value::Object(map) = &mut value {
                map.remove("status");
            }
        }
        Self::send_json(&value, status, include_status)
    }

    /// The built-in "not found" response.
    pub fn not_found() -> Self {
        Self::new(404)
            .header(CONTENT_TYPE, "text/plain")
            .body("Not found!")
    }

    /// Creates a 500 response with a plain text body.
    pub fn internal_server_error(message: &str) -> Self {
        Self::new(500)
            .header(CONTENT_TYPE, "text/plain")
            .body(message)
    }

    /// Sets a header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Sets the status code.
    #[must_use]
    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Sets an in-memory body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Body::Bytes(body.into());
        self
    }

    /// Gets a header value, ignoring the case of the name.
    pub fn get_header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the content type, if set.
    pub fn content_type(&self) -> Option<&str> {
        self.get_header(CONTENT_TYPE)
    }

    /// Returns an in-memory body as a string.
    pub fn body_string(&self) -> Option<String> {
        match &self.body {
            Body::Bytes(bytes) => String::from_utf8(bytes.clone()).ok(),
            Body::File { .. } => None,
        }
    }

    /// Parses an in-memory body as JSON.
    pub fn body_json(&self) -> Option<Value> {
        match &self.body {
            Body::Bytes(bytes) => serde_json::from_slice(bytes).ok(),
            Body::File { .. } => None,
        }
    }

    /// Returns the status text for the current status code.
    pub fn status_text(&self) -> &'static str {
        match self.status {
            100 => "Continue",
            200 => "OK",
            201 => "Created",
            204 => "No Content",
            301 => "Moved Permanently",
            302 => "Found",
            304 => "Not Modified",
            400 => "Bad Request",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "Not Found",
            405 => "Method Not Allowed",
            409 => "Conflict",
            413 => "Payload Too Large",
            422 => "Unprocessable Entity",
            500 => "Internal Server Error",
            501 => "Not Implemented",
            502 => "Bad Gateway",
            503 => "Service Unavailable",
            _ => "Unknown",
        }
    }
}

/// What a handler hands back to the dispatcher.
#[derive(Debug)]
pub enum Reply {
    /// A terminal send ended the cycle with this response.
    Sent(Response),
    /// The handler returned without sending. Whatever it wrote to the
    /// context output is flushed by the dispatcher.
    Rendered,
}

impl From<Response> for Reply {
    fn from(response: Response) -> Self {
        Self::Sent(response)
    }
}

fn check_status(status: u16) -> Result<()> {
    if (100..=599).contains(&status) {
        Ok(())
    } else {
        Err(Fault::InvalidStatusCode(status))
    }
}

fn status_from_value(value: &Value) -> Option<u16> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn with_status_first(value: Value, status: u16) -> Value {
    let mut out = Map::new();
    out.insert("status".to_string(), Value::from(status));
    match value {
        Value::Object(map) => {
            for (key, v) in map {
                if key != "status" {
                    out.insert(key, v);
                }
            }
        }
        other => {
            out.insert("data".to_string(), other);
        }
    }
    Value::Object(out)
}
