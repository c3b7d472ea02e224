use actix_web::web;
use middleware::session::SessionMiddleware;

pub mod middleware {
    pub mod session;
}
pub mod services {
    pub mod auth;
    pub mod user;
}
pub mod routes {
    pub mod auth;
}
mod dtos {
    pub(crate) mod auth;
}

/// `/admin/login`
pub fn mount_admin_auth() -> actix_web::Scope {
    web::scope("/admin").service(routes::auth::post_admin_login)
}

/// `/customer/login` and `/customer/signup`
pub fn mount_customer_auth() -> actix_web::Scope {
    web::scope("/customer")
        .service(routes::auth::post_customer_login)
        .service(routes::auth::post_signup)
}

/// Session middleware
pub fn session_middleware() -> SessionMiddleware {
    SessionMiddleware::new()
}
