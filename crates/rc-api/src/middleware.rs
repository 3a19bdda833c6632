//! rp-community/crates/rc-api/src/middleware.rs Middleware
//!
//! Access logging and cross-origin policy.

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::middleware::Logger;

// remote-ip "request-line" status-code response-size "referrer" "user-agent"
pub fn standard_middleware() -> Logger {
    Logger::default()
}

/// With no configured origin any origin is accepted; bearer tokens travel in
/// a header, not a cookie.
pub fn cors_policy(allowed_origin: Option<&str>) -> Cors {
    let cors = match allowed_origin {
        Some(origin) => Cors::default().allowed_origin(origin),
        None => Cors::default().allow_any_origin(),
    };
    cors.allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE"])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(3600)
}
