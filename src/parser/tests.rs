//! Tests for the HTTP parser.

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use crate::address::Address;
    use crate::parser::{parse_request, Error, HttpVersion, Method, ParseLimits, Request};
    use crate::routing::{ApiVersion, Registry, Route};
    use crate::server::{HttpResponse, ResponseBuilder, StatusCode};

    fn ok(_req: &Request) -> HttpResponse {
        ResponseBuilder::new().build()
    }

    fn registry() -> Registry {
        let mut registry = Registry::new(true);
        registry.register_version(ApiVersion::new("v1")).unwrap();
        for method in Method::SUPPORTED {
            registry.register_route(Route::plain(method, "/index.html", ok)).unwrap();
        }
        registry.register_route(Route::plain(Method::POST, "/submit", ok)).unwrap();
        registry
            .register_route(Route::versioned("v1", Method::GET, "/widgets/", ok))
            .unwrap();
        registry
    }

    fn client() -> Address {
        Address::new("192.168.1.20", 40000)
    }

    fn parse(input: &[u8]) -> Result<Request, Error> {
        parse_request(&client(), input, &registry(), &ParseLimits::default())
    }

    #[test]
    fn test_parse_simple_get_request() {
        let request = parse(b"GET /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n").unwrap();
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.path, "/index.html");
        assert_eq!(request.version, HttpVersion::Http11);
        assert_eq!(request.get_header("Host").unwrap(), "example.com");
        assert_eq!(request.address, client());
        assert!(request.body.is_empty());
    }

    #[test]
    fn test_parse_request_with_multiple_headers() {
        let request = parse(b"GET /index.html HTTP/1.0\r\nHost: example.com\r\nUser-Agent: test\r\nAccept: */*\r\n\r\n").unwrap();
        assert_eq!(request.version, HttpVersion::Http10);
        assert_eq!(request.headers.len(), 3);
        assert_eq!(request.get_header("User-Agent").unwrap(), "test");
        assert_eq!(request.get_header("Accept").unwrap(), "*/*");
    }

    #[test]
    fn test_header_names_are_case_sensitive() {
        let request = parse(b"GET /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n").unwrap();
        assert!(request.has_header("Host"));
        assert!(!request.has_header("host"));
    }

    #[test]
    fn test_malformed_header_lines_are_skipped() {
        let request = parse(
            b"GET /index.html HTTP/1.1\r\nInvalidHeader\r\nBad_Name: x\r\nX-Test: value:with:colons\r\nNo-Space:x\r\n\r\n",
        )
        .unwrap();
        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.get_header("X-Test").unwrap(), "value:with:colons");
    }

    #[test]
    fn test_header_values_are_trimmed() {
        let request = parse(b"GET /index.html HTTP/1.1\r\nX-Padded:    spaced out   \r\n\r\n").unwrap();
        assert_eq!(request.get_header("X-Padded").unwrap(), "spaced out");
    }

    #[test]
    fn test_too_many_headers() {
        let mut raw = String::from("GET /index.html HTTP/1.1\r\n");
        for i in 0..101 {
            raw.push_str(&format!("X-Header-{i}: {i}\r\n"));
        }
        raw.push_str("\r\n");
        assert_eq!(parse(raw.as_bytes()).unwrap_err(), Error::HeaderFieldsTooLarge(100));
    }

    #[test]
    fn test_exactly_max_headers_is_accepted() {
        let mut raw = String::from("GET /index.html HTTP/1.1\r\n");
        for i in 0..100 {
            raw.push_str(&format!("X-Header-{i}: {i}\r\n"));
        }
        raw.push_str("\r\n");
        assert_eq!(parse(raw.as_bytes()).unwrap().headers.len(), 100);
    }

    #[test]
    fn test_invalid_method() {
        let result = parse(b"INVALID /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n");
        assert!(matches!(result, Err(Error::MethodNotAllowed(ref m)) if m == "INVALID"));
    }

    #[test]
    fn test_recognised_but_unsupported_methods() {
        for raw in [&b"HEAD /index.html HTTP/1.1\r\n\r\n"[..], b"OPTIONS /index.html HTTP/1.1\r\n\r\n"] {
            let err = parse(raw).unwrap_err();
            assert_eq!(err.status(), StatusCode::MethodNotAllowed);
        }
    }

    #[test]
    fn test_all_supported_methods() {
        for method in Method::SUPPORTED {
            let raw = format!("{method} /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n");
            assert_eq!(parse(raw.as_bytes()).unwrap().method, method);
        }
    }

    #[test]
    fn test_unsupported_http_version() {
        for protocol in ["HTTP/9.9", "HTTP/2", "HTTP/2.0", "http/1.1"] {
            let raw = format!("GET /index.html {protocol}\r\n\r\n");
            let err = parse(raw.as_bytes()).unwrap_err();
            assert_eq!(err, Error::HttpVersionNotSupported(protocol.to_string()));
            assert_eq!(err.status(), StatusCode::HttpVersionNotSupported);
        }
    }

    #[test]
    fn test_malformed_request_line() {
        for raw in [&b""[..], b"GET\r\n\r\n", b"GET /index.html\r\n\r\n"] {
            assert!(matches!(parse(raw), Err(Error::BadRequest(_))));
        }
    }

    #[test]
    fn test_extra_request_line_token_fails_protocol_check() {
        let err = parse(b"GET /index.html HTTP/1.1 extra\r\n\r\n").unwrap_err();
        assert_eq!(err.status(), StatusCode::HttpVersionNotSupported);
    }

    #[test]
    fn test_path_is_normalized() {
        let request = parse(b"GET //index.html/ HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(request.path, "/index.html");
    }

    #[test]
    fn test_traversal_and_nul_are_rejected() {
        for path in ["/../etc/passwd", "/index.html/..", "/a/..%2f", "/index\0.html"] {
            let raw = format!("GET {path} HTTP/1.1\r\n\r\n");
            assert!(
                matches!(parse(raw.as_bytes()), Err(Error::BadRequest(_))),
                "{path:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_illegal_path_characters() {
        for path in ["/index<script>", "/caf\u{e9}", "/a\\b", "/a{b}", "/a|b"] {
            let raw = format!("GET {path} HTTP/1.1\r\n\r\n");
            assert!(matches!(parse(raw.as_bytes()), Err(Error::BadRequest(_))), "{path:?}");
        }
    }

    #[test]
    fn test_query_parameters() {
        let request = parse(b"GET /index.html?page=2&sort=name&page=3&q=a%20b HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(request.path, "/index.html");
        assert_eq!(request.get_query("page").unwrap(), "3");
        assert_eq!(request.get_query("q").unwrap(), "a b");
        assert!(request.has_query("sort"));
        assert!(!request.has_query("missing"));
        assert_eq!(request.sorted_query(), "page=3&q=a+b&sort=name");
    }

    #[test]
    fn test_body_after_blank_line() {
        let request = parse(b"POST /submit HTTP/1.1\r\nContent-Length: 13\r\n\r\nline1\r\nline2\r\n").unwrap();
        assert_eq!(request.body, "line1\r\nline2");
    }

    #[test]
    fn test_json_body() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Submission {
            name: String,
        }

        let request = parse(b"POST /submit HTTP/1.1\r\nContent-Type: application/json\r\n\r\n{\"name\":\"gear\"}").unwrap();
        let submission: Submission = request.json().unwrap();
        assert_eq!(submission, Submission { name: "gear".to_string() });

        let request = parse(b"POST /submit HTTP/1.1\r\n\r\nnot json").unwrap();
        assert!(matches!(request.json::<Submission>(), Err(Error::Json(_))));
    }

    #[test]
    fn test_declared_content_length_over_cap() {
        let err = parse(b"POST /submit HTTP/1.1\r\nContent-Length: 20000000\r\n\r\n").unwrap_err();
        assert_eq!(err, Error::PayloadTooLarge(20_000_000));
        assert_eq!(err.status(), StatusCode::PayloadTooLarge);
    }

    #[test]
    fn test_declared_content_length_uses_leading_digits() {
        let err = parse(b"POST /submit HTTP/1.1\r\nContent-Length: 20000000xyz\r\n\r\n").unwrap_err();
        assert_eq!(err, Error::PayloadTooLarge(20_000_000));

        let request = parse(b"POST /submit HTTP/1.1\r\nContent-Length: 4abc\r\n\r\nbody").unwrap();
        assert_eq!(request.body, "body");
    }

    #[test]
    fn test_buffer_over_cap() {
        let limits = ParseLimits {
            max_request_size: 32,
            ..ParseLimits::default()
        };
        let raw = b"GET /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let result = parse_request(&client(), raw, &registry(), &limits);
        assert!(matches!(result, Err(Error::PayloadTooLarge(_))));
    }

    #[test]
    fn test_unregistered_paths_are_not_found() {
        for method in Method::SUPPORTED {
            let raw = format!("{method} /nowhere HTTP/1.1\r\n\r\n");
            let err = parse(raw.as_bytes()).unwrap_err();
            assert_eq!(err.status(), StatusCode::NotFound);
        }

        // Registered path, wrong method.
        let err = parse(b"DELETE /submit HTTP/1.1\r\n\r\n").unwrap_err();
        assert_eq!(err, Error::NotFound("DELETE /submit".to_string()));
    }

    #[test]
    fn test_versioned_route_resolution() {
        let request = parse(b"GET /v1/widgets HTTP/1.1\r\nHost: x\r\n\r\n").unwrap();
        assert_eq!(request.route.full_path(), "/v1/widgets");
        assert_eq!(request.route.api_version(), Some("v1"));

        assert!(parse(b"GET /widgets HTTP/1.1\r\n\r\n").is_err());
    }
}
