use actix_web::web;
use middleware::key::KeyMiddleware;

pub mod routes {
    pub mod key;
}
pub mod middleware {
    pub mod key;
}

pub mod service {
    pub mod key;
}
mod dtos {
    pub(crate) mod key;
}

/// SDK login, mounted under `/sdk`.
pub fn mount_sdk_auth() -> actix_web::Scope {
    web::scope("/auth").service(routes::key::post_sdk_login)
}
pub fn middleware() -> KeyMiddleware {
    KeyMiddleware::new()
}
