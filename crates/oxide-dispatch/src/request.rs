//! HTTP methods and the raw request handed over by the host.

use std::collections::HashMap;
use std::fmt;
use std::io::{self, Cursor, Read};

/// HTTP request methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET method
    Get,
    /// POST method
    Post,
    /// PUT method
    Put,
    /// PATCH method
    Patch,
    /// DELETE method
    Delete,
    /// HEAD method
    Head,
    /// OPTIONS method
    Options,
}

impl Method {
    /// Parses a method from a string, ignoring case.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "PATCH" => Some(Self::Patch),
            "DELETE" => Some(Self::Delete),
            "HEAD" => Some(Self::Head),
            "OPTIONS" => Some(Self::Options),
            _ => None,
        }
    }

    /// Returns the method as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The method a route is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteMethod {
    /// Only requests with this method.
    Only(Method),
    /// Requests with any method.
    All,
}

impl RouteMethod {
    /// Returns true if a request with `method` may select this route.
    pub fn accepts(self, method: Method) -> bool {
        match self {
            Self::Only(m) => m == method,
            Self::All => true,
        }
    }
}

impl From<Method> for RouteMethod {
    fn from(method: Method) -> Self {
        Self::Only(method)
    }
}

impl fmt::Display for RouteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Only(m) => m.fmt(f),
            Self::All => f.write_str("ALL"),
        }
    }
}

/// Path parameters captured from `:name` segments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    params: HashMap<String, String>,
}

impl PathParams {
    /// Creates new empty path params.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a parameter.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), value.into());
    }

    /// Gets a parameter value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Parses a parameter as a specific type.
    pub fn parse<T: std::str::FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    /// Returns the number of captured parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns true if nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Returns an iterator over the parameters.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// The raw request body, readable once.
#[derive(Default)]
pub struct RawBody {
    reader: Option<Box<dyn Read>>,
}

impl RawBody {
    /// Wraps a reader.
    pub fn from_reader(reader: impl Read + 'static) -> Self {
        Self {
            reader: Some(Box::new(reader)),
        }
    }

    /// Reads the whole body. Later calls return an empty buffer.
    pub fn read_once(&mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        if let Some(mut reader) = self.reader.take() {
            reader.read_to_end(&mut buf)?;
        }
        Ok(buf)
    }

    /// Returns true once the body has been consumed (or was never set).
    pub fn is_consumed(&self) -> bool {
        self.reader.is_none()
    }
}

impl fmt::Debug for RawBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawBody")
            .field("consumed", &self.is_consumed())
            .finish()
    }
}

/// One request as supplied by the hosting environment.
///
/// `request_uri` is the full URI the client asked for, including any root
/// prefix the application is mounted under and the query string.
#[derive(Debug)]
pub struct HostRequest {
    /// HTTP method.
    pub method: Method,
    /// Full request URI.
    pub request_uri: String,
    /// Value of the Content-Type header, empty if absent.
    pub content_type: String,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// Request body.
    pub body: RawBody,
}

impl HostRequest {
    /// Creates a new request.
    pub fn new(method: Method, request_uri: impl Into<String>) -> Self {
        Self {
            method,
            request_uri: request_uri.into(),
            content_type: String::new(),
            headers: HashMap::new(),
            body: RawBody::default(),
        }
    }

    /// Creates a GET request.
    pub fn get(uri: impl Into<String>) -> Self {
        Self::new(Method::Get, uri)
    }

    /// Creates a POST request.
    pub fn post(uri: impl Into<String>) -> Self {
        Self::new(Method::Post, uri)
    }

    /// Creates a PUT request.
    pub fn put(uri: impl Into<String>) -> Self {
        Self::new(Method::Put, uri)
    }

    /// Creates a DELETE request.
    pub fn delete(uri: impl Into<String>) -> Self {
        Self::new(Method::Delete, uri)
    }

    /// Sets a header. A Content-Type header also sets [`Self::content_type`].
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        if key.eq_ignore_ascii_case("content-type") {
            self.content_type.clone_from(&value);
        }
        self.headers.insert(key, value);
        self
    }

    /// Sets the body from bytes.
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = RawBody::from_reader(Cursor::new(body.into()));
        self
    }

    /// Sets the body from a reader.
    #[must_use]
    pub fn body_reader(mut self, reader: impl Read + 'static) -> Self {
        self.body = RawBody::from_reader(reader);
        self
    }

    /// Gets a header value, ignoring the case of the name.
    pub fn get_header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the query string part of the request URI, without the `?`.
    pub fn query_string(&self) -> Option<&str> {
        self.request_uri.split_once('?').map(|(_, q)| q)
    }
}

/// Parses an `application/x-www-form-urlencoded` string.
///
/// Repeated keys keep their last value. Undecodable input yields `None`.
pub fn parse_urlencoded(input: &str) -> Option<HashMap<String, String>> {
    serde_urlencoded::from_str::<Vec<(String, String)>>(input)
        .ok()
        .map(|pairs| pairs.into_iter().collect())
}
