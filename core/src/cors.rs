use actix_cors::Cors;
use actix_web::http::header::{self, HeaderName};

/// Browsers send the session token as a bearer header, so no cookies are allowed.
pub fn middleware(origin: &str) -> Cors {
    Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static("x-api-key"),
        ])
        .allowed_origin(origin)
        .max_age(3600)
}
