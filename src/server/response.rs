//! HTTP response types and utilities.

use std::fmt;

use serde::Serialize;

use crate::server::error::Error;

/// HTTP status codes with their standard reason phrases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Ok = 200,
    Created = 201,
    Accepted = 202,
    NoContent = 204,
    MovedPermanently = 301,
    Found = 302,
    NotModified = 304,
    BadRequest = 400,
    Unauthorized = 401,
    Forbidden = 403,
    NotFound = 404,
    MethodNotAllowed = 405,
    Conflict = 409,
    PayloadTooLarge = 413,
    UnprocessableEntity = 422,
    TooManyRequests = 429,
    RequestHeaderFieldsTooLarge = 431,
    InternalServerError = 500,
    NotImplemented = 501,
    BadGateway = 502,
    ServiceUnavailable = 503,
    HttpVersionNotSupported = 505,
}

impl StatusCode {
    /// The numeric code.
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Get the reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Created => "Created",
            StatusCode::Accepted => "Accepted",
            StatusCode::NoContent => "No Content",
            StatusCode::MovedPermanently => "Moved Permanently",
            StatusCode::Found => "Found",
            StatusCode::NotModified => "Not Modified",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Unauthorized => "Unauthorized",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::Conflict => "Conflict",
            StatusCode::PayloadTooLarge => "Payload Too Large",
            StatusCode::UnprocessableEntity => "Unprocessable Entity",
            StatusCode::TooManyRequests => "Too Many Requests",
            StatusCode::RequestHeaderFieldsTooLarge => "Request Header Fields Too Large",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::NotImplemented => "Not Implemented",
            StatusCode::BadGateway => "Bad Gateway",
            StatusCode::ServiceUnavailable => "Service Unavailable",
            StatusCode::HttpVersionNotSupported => "HTTP Version Not Supported",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}

/// An immutable HTTP response. Build one with [`ResponseBuilder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    custom_message: Option<String>,
}

impl HttpResponse {
    /// A response with the default headers and no body.
    pub fn new(status: StatusCode) -> Self {
        ResponseBuilder::new().code(status).build()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Headers in insertion order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Get a header value by exact name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// A message for logs or callers; never written to the wire.
    pub fn custom_message(&self) -> Option<&str> {
        self.custom_message.as_deref()
    }

    /// Convert the response to bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(128 + self.body.len());

        // Add the status line
        let status_line = format!("HTTP/1.1 {}\r\n", self.status);
        bytes.extend_from_slice(status_line.as_bytes());

        // Add the headers, stripped of anything that could split the line
        for (name, value) in &self.headers {
            let name: String = name.chars().filter(|c| !matches!(c, '\r' | '\n' | ':')).collect();
            let value: String = value.chars().filter(|c| !matches!(c, '\r' | '\n')).collect();
            bytes.extend_from_slice(format!("{name}: {value}\r\n").as_bytes());
        }

        // Add the empty line that separates headers from body
        bytes.extend_from_slice(b"\r\n");

        // Add the body
        bytes.extend_from_slice(&self.body);

        bytes
    }
}

/// Mutable builder for [`HttpResponse`].
///
/// Starts as `200 OK` with `Content-Type: application/json`,
/// `Content-Length: 0` and `Connection: close`.
#[derive(Debug, Clone)]
pub struct ResponseBuilder {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    custom_message: Option<String>,
}

impl Default for ResponseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseBuilder {
    pub fn new() -> Self {
        Self {
            status: StatusCode::Ok,
            headers: vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("Content-Length".to_string(), "0".to_string()),
                ("Connection".to_string(), "close".to_string()),
            ],
            body: Vec::new(),
            custom_message: None,
        }
    }

    /// Set the status code.
    pub fn code(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        self
    }

    /// The status currently set.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Add or replace a header, keeping its original position when replaced.
    pub fn header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let name = name.into();
        let value = value.into();
        match self.headers.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => self.headers.push((name, value)),
        }
        self
    }

    /// Set the content type.
    pub fn content_type(&mut self, content_type: impl Into<String>) -> &mut Self {
        self.header("Content-Type", content_type)
    }

    /// Set the response body with a string.
    pub fn body(&mut self, body: impl Into<String>) -> &mut Self {
        self.bytes(body.into().into_bytes())
    }

    /// Set the response body with bytes.
    pub fn bytes(&mut self, body: impl Into<Vec<u8>>) -> &mut Self {
        self.body = body.into();
        let content_length = self.body.len().to_string();
        self.header("Content-Length", content_length)
    }

    /// Set the response body with a JSON value.
    pub fn json<T: Serialize>(&mut self, value: &T) -> Result<&mut Self, Error> {
        let json = serde_json::to_vec(value)?;
        Ok(self.content_type("application/json").bytes(json))
    }

    /// Set an HTML body.
    pub fn html(&mut self, body: impl Into<String>) -> &mut Self {
        self.content_type("text/html").body(body)
    }

    /// Redirect with `302 Found`, optionally with a small HTML body linking
    /// to the target.
    pub fn redirect(&mut self, url: &str, update_body: bool) -> &mut Self {
        let url: String = url.chars().filter(|c| !matches!(c, '\r' | '\n')).collect();
        self.header("Location", url.clone()).code(StatusCode::Found);
        if update_body {
            let escaped = escape_html(&url);
            self.html(format!("<p>Redirecting to <a href='{escaped}'>{escaped}</a></p>"));
        }
        self
    }

    /// Attach a message that is kept on the response but not sent.
    pub fn custom_message(&mut self, message: impl Into<String>) -> &mut Self {
        self.custom_message = Some(message.into());
        self
    }

    /// Snapshot the builder into an immutable response.
    pub fn build(&self) -> HttpResponse {
        HttpResponse {
            status: self.status,
            headers: self.headers.clone(),
            body: self.body.clone(),
            custom_message: self.custom_message.clone(),
        }
    }
}

fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_headers_and_serialization() {
        let response = ResponseBuilder::new().body("{\"ok\":true}").build();
        let text = String::from_utf8(response.to_bytes()).unwrap();

        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-Type: application/json\r\n"));
        assert!(text.contains("Content-Length: 11\r\n"));
        assert!(text.contains("Connection: close\r\n"));
        assert!(text.ends_with("\r\n\r\n{\"ok\":true}"));
    }

    #[test]
    fn test_header_injection_is_stripped() {
        let response = ResponseBuilder::new()
            .header("X-Bad:\r\nName", "value\r\nSet-Cookie: a=b")
            .build();
        let text = String::from_utf8(response.to_bytes()).unwrap();
        assert!(text.contains("X-BadName: valueSet-Cookie: a=b\r\n"));
    }

    #[test]
    fn test_redirect_escapes_target() {
        let response = ResponseBuilder::new()
            .redirect("/next?a=<b>", true)
            .build();
        assert_eq!(response.status(), StatusCode::Found);
        assert_eq!(response.header("Location"), Some("/next?a=<b>"));
        assert_eq!(response.header("Content-Type"), Some("text/html"));
        let body = String::from_utf8_lossy(response.body());
        assert!(body.contains("/next?a=&lt;b&gt;"));
    }

    #[test]
    fn test_json_body() {
        #[derive(Serialize)]
        struct Widget {
            id: u32,
        }

        let mut builder = ResponseBuilder::new();
        builder.json(&Widget { id: 7 }).unwrap();
        let response = builder.code(StatusCode::Created).build();

        assert_eq!(response.body(), b"{\"id\":7}");
        assert_eq!(response.header("Content-Length"), Some("8"));
        assert_eq!(response.status().as_u16(), 201);
    }
}
