use middleware::extractor::ExtractionMiddleware;

pub mod middleware {
    pub mod extractor;
}

/// Pulls the session token and the API key off each request.
pub fn middleware() -> ExtractionMiddleware {
    ExtractionMiddleware::new()
}
