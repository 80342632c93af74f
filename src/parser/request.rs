//! HTTP request parsing and representation.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::address::Address;
use crate::parser::error::Error;
use crate::parser::framing::leading_digits;
use crate::parser::method::Method;
use crate::parser::query::{parse_query, sorted_query_string};
use crate::parser::version::HttpVersion;
use crate::routing::{Registry, Route};

/// Default cap on the size of a buffered request: 10 MiB.
pub const DEFAULT_MAX_REQUEST_SIZE: usize = 10 * 1024 * 1024;

/// Default cap on the number of header fields.
pub const DEFAULT_MAX_HEADERS: usize = 100;

/// Size limits applied while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseLimits {
    /// Largest accepted request, and largest accepted `Content-Length`.
    pub max_request_size: usize,
    /// Largest accepted number of header fields.
    pub max_headers: usize,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self {
            max_request_size: DEFAULT_MAX_REQUEST_SIZE,
            max_headers: DEFAULT_MAX_HEADERS,
        }
    }
}

/// A parsed request resolved against a registered route.
#[derive(Clone)]
pub struct Request {
    /// The peer that sent the request.
    pub address: Address,
    /// The HTTP method (GET, POST, etc.)
    pub method: Method,
    /// The normalized path, without the query string
    pub path: String,
    /// The HTTP version
    pub version: HttpVersion,
    /// The route this request resolved to
    pub route: Arc<Route>,
    /// Query parameters parsed from the path
    pub query_params: HashMap<String, String>,
    /// The HTTP headers, names kept as sent
    pub headers: HashMap<String, String>,
    /// The request body
    pub body: String,
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("address", &self.address)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("version", &self.version)
            .field("route", &self.route.full_path())
            .field("query_params", &self.query_params)
            .field("headers", &self.headers)
            .field("body", &self.body)
            .finish()
    }
}

impl Request {
    /// Get a header value by its exact name.
    pub fn get_header(&self, name: &str) -> Option<&String> {
        self.headers.get(name)
    }

    /// Check if a header exists.
    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains_key(name)
    }

    /// Get a query parameter value.
    pub fn get_query(&self, name: &str) -> Option<&String> {
        self.query_params.get(name)
    }

    /// Check if a query parameter exists.
    pub fn has_query(&self, name: &str) -> bool {
        self.query_params.contains_key(name)
    }

    /// The query parameters encoded in key order.
    pub fn sorted_query(&self) -> String {
        sorted_query_string(&self.query_params)
    }

    /// Parse the request body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Parse a complete request buffer and resolve its route.
///
/// # Arguments
///
/// * `address` - The peer the bytes came from
/// * `input` - A complete request, as framed by [`FrameBuffer`](crate::parser::FrameBuffer)
/// * `registry` - Routes to resolve against
/// * `limits` - Size limits
///
/// # Returns
///
/// The resolved request, or the failure to answer the client with
pub fn parse_request(
    address: &Address,
    input: &[u8],
    registry: &Registry,
    limits: &ParseLimits,
) -> Result<Request, Error> {
    if input.len() > limits.max_request_size {
        return Err(Error::PayloadTooLarge(input.len() as u64));
    }

    let input_str = String::from_utf8_lossy(input);
    let mut lines = input_str.split("\r\n");

    // Split the request line into method, path, and protocol
    let request_line = lines.next().unwrap_or_default().trim();
    let parts: Vec<&str> = request_line.splitn(3, ' ').collect();
    let [method, raw_path, protocol] = parts.as_slice() else {
        return Err(Error::BadRequest(format!("malformed request line: {request_line}")));
    };

    let method = Method::from_str(method)?;
    if !method.is_supported() {
        return Err(Error::MethodNotAllowed(method.to_string()));
    }

    let version = HttpVersion::from_str(protocol)?;

    let full_path = format!("/{}", raw_path.trim_matches('/'));
    if full_path.contains('\0') || full_path.contains("..") {
        return Err(Error::BadRequest(format!("unsafe path: {full_path}")));
    }
    if !full_path.chars().skip(1).all(is_path_char) {
        return Err(Error::BadRequest(format!("illegal characters in path: {full_path}")));
    }

    let (path, query_params) = match full_path.split_once('?') {
        Some((path, query)) => (path.to_string(), parse_query(query)),
        None => (full_path.clone(), HashMap::new()),
    };

    // Parse the headers
    let mut headers = HashMap::new();
    let mut header_count = 0;
    for line in lines.by_ref() {
        // Empty line indicates the end of headers
        if line.trim().is_empty() {
            break;
        }

        let Some((name, value)) = line.split_once(": ") else {
            continue;
        };
        if name.is_empty() || !name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
            continue;
        }

        header_count += 1;
        if header_count > limits.max_headers {
            return Err(Error::HeaderFieldsTooLarge(limits.max_headers));
        }

        let value: String = value.trim().chars().filter(|c| !matches!(c, '\r' | '\n')).collect();
        headers.insert(name.to_string(), value);
    }

    let body = lines
        .collect::<Vec<_>>()
        .join("\r\n")
        .trim_end_matches(['\r', '\n'])
        .to_string();

    if let Some(length) = headers.get("Content-Length") {
        let length = leading_digits(length);
        if length > limits.max_request_size as u64 {
            return Err(Error::PayloadTooLarge(length));
        }
    }

    let route = registry
        .resolve_route(method, &path)
        .ok_or_else(|| Error::NotFound(format!("{method} {path}")))?;

    Ok(Request {
        address: address.clone(),
        method,
        path,
        version,
        route,
        query_params,
        headers,
        body,
    })
}

/// Characters permitted in a request target after the leading slash.
fn is_path_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '/' | '_' | '-' | '.' | '~' | '!' | '$' | '&' | '"' | '(' | ')' | '*' | '+' | ','
                | ';' | '=' | ':' | '@' | '%' | '?' | '#' | '[' | ']'
        )
}
