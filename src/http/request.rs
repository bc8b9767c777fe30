use crate::http::headers::Headers;

/// HTTP request methods.
///
/// Only GET is part of the protocol. Any other method token on the wire is
/// rejected by the parser and answered with 404.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
}

/// Represents an HTTP request, either parsed from a client or about to be
/// sent by one.
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method
    pub method: Method,
    /// The request target exactly as sent (e.g., "/index.html")
    pub path: String,
    /// HTTP version (always "HTTP/1.1" for accepted requests)
    pub version: String,
    /// Request headers in wire order
    pub headers: Headers,
    /// Request body, empty for well-formed GETs
    pub body: Vec<u8>,
}

/// Builder for constructing Request objects.
///
/// # Example
///
/// ```
/// # use ferry::http::request::{Method, RequestBuilder};
/// let request = RequestBuilder::new(Method::GET, "/index.html")
///     .header("Host", "localhost")
///     .build();
/// assert_eq!(request.version, "HTTP/1.1");
/// ```
pub struct RequestBuilder {
    method: Method,
    path: String,
    headers: Headers,
}

impl Method {
    /// Parses an HTTP method from a string.
    ///
    /// # Example
    ///
    /// ```
    /// # use ferry::http::request::Method;
    /// assert_eq!(Method::from_token("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_token("get"), None);
    /// assert_eq!(Method::from_token("POST"), None);
    /// ```
    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Method::GET),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
        }
    }
}

impl RequestBuilder {
    /// Starts a request for `path`. The path is kept verbatim, including
    /// empty or malformed values.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Headers::new(),
        }
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key, value);
        self
    }

    pub fn build(self) -> Request {
        Request {
            method: self.method,
            path: self.path,
            version: "HTTP/1.1".to_string(),
            headers: self.headers,
            body: Vec::new(),
        }
    }
}

impl Request {
    /// Retrieves a header value by name, ignoring case.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key)
    }
}
