//! Access logging and CORS for the snipvault API.

use actix_cors::Cors;
use actix_web::http::{header, Method};
use actix_web::middleware::Logger;

/// Peer, request line, status, body bytes and latency in milliseconds.
const ACCESS_LOG_FORMAT: &str = r#"%a "%r" %s %b %Dms"#;

/// Request log for every route except the liveness check.
pub fn access_log() -> Logger {
    Logger::new(ACCESS_LOG_FORMAT).exclude("/health")
}

/// Browsers on any origin may call the API with a bearer token.
pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allowed_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(3600)
}
