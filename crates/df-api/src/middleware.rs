//! Middleware for access logging and cross-origin access.

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::middleware::Logger;

use crate::identity::IDENTITY_HEADER;

/// Access log: remote-ip "request-line" status-code response-size and
/// request duration.
pub fn standard_middleware() -> Logger {
    Logger::new("%a \"%r\" %s %b %Dms")
}

/// The web front end may live on another origin; it sends the identity
/// header on every call.
pub fn cors_policy() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST", "PATCH", "DELETE"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
        .allowed_header(IDENTITY_HEADER)
        .max_age(3600)
}
