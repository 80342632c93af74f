//! A versioned JSON API demonstrating routing, authentication, rate limiting
//! and response caching.
//!
//! Run with `RUST_LOG=debug cargo run --example versioned_api`, then try:
//!
//! ```text
//! curl -i http://127.0.0.1:8081/health
//! curl -i http://127.0.0.1:8081/v1/users?page=1
//! curl -i -H 'Authorization: Bearer demo' http://127.0.0.1:8081/v2/reports
//! curl -i -X POST -d '{"name":"ada"}' http://127.0.0.1:8081/v1/users
//! ```

use log::{info, warn};
use serde::Deserialize;
use serde_json::json;

use pollhttp_rs::{
    Address, ApiVersion, HttpResponse, HttpServer, Method, RateLimitConfig, Request, ResponseBuilder, Route,
    RouteHandler, ServerConfig, StatusCode,
};

#[derive(Debug, Deserialize)]
struct NewUser {
    name: String,
}

/// Validates the body before the handler runs.
struct CreateUser;

impl RouteHandler for CreateUser {
    fn handle(&self, request: &Request) -> HttpResponse {
        let mut response = ResponseBuilder::new();
        response.code(StatusCode::Created);
        if let Ok(user) = request.json::<NewUser>() {
            if let Err(e) = response.json(&json!({ "created": user.name })) {
                warn!("Failed to encode created user: {e}");
            }
        }
        response.build()
    }

    fn is_bad_request(&self, request: &Request, response: &mut ResponseBuilder) -> bool {
        if request.json::<NewUser>().is_ok() {
            return false;
        }
        response.body("{\"error\":\"expected {\\\"name\\\": string}\"}");
        true
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize the logger
    env_logger::init();

    let config = ServerConfig::default()
        .with_addr("127.0.0.1:8081".parse()?)
        .with_versioning(true)
        .with_response_caching(true, 30)
        .with_rate_limit(RateLimitConfig::enabled(60, 20, 10));

    let mut server = HttpServer::new(config);

    server.register_version(ApiVersion::new("v1"))?;
    server.register_version(
        ApiVersion::new("v2").with_authentication(|_client: &Address, req: &Request| {
            req.get_header("Authorization").is_some_and(|token| token == "Bearer demo")
        }),
    )?;

    server.register_route(Route::plain(Method::GET, "/health", |_req: &Request| {
        ResponseBuilder::new().body("{\"status\":\"ok\"}").build()
    }))?;

    server.register_route(Route::versioned("v1", Method::GET, "/users", |req: &Request| {
        let page = req.get_query("page").map_or("1", String::as_str);
        ResponseBuilder::new()
            .body(format!("{{\"page\":{page},\"users\":[\"ada\",\"grace\"]}}"))
            .build()
    }))?;

    server.register_route(Route::versioned("v1", Method::POST, "/users", CreateUser))?;

    server.register_route(Route::versioned("v2", Method::GET, "/reports", |_req: &Request| {
        ResponseBuilder::new().body("{\"reports\":[]}").build()
    }))?;

    server.register_route(
        Route::plain(Method::GET, "/admin", |_req: &Request| {
            ResponseBuilder::new().redirect("/health", true).build()
        })
        .with_authentication(|client: &Address, _req: &Request| client.host() == "127.0.0.1"),
    )?;

    info!("Starting server on http://127.0.0.1:8081");

    // Start the server
    server.start().await?;

    Ok(())
}
