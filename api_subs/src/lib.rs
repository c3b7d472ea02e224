use actix_web::web::{self};

pub mod lifecycle;

pub mod routes {
    pub mod admin;
    pub mod customer;
}

pub mod services {
    pub mod sub;
}

pub mod dtos {
    pub mod sub;
}

/// Admin subscription management, mounted under `/admin`.
pub fn mount_admin_subs() -> actix_web::Scope {
    web::scope("/subscriptions")
        .service(routes::admin::get_subscriptions)
        .service(routes::admin::post_subscription)
        .service(routes::admin::get_subscription)
        .service(routes::admin::delete_subscription)
        .service(routes::admin::put_approve)
        .service(routes::admin::put_assign)
        .service(routes::admin::put_unassign)
        .service(routes::admin::put_reject)
        .service(routes::admin::put_renew)
}

/// Customer self-service, shared by the session (`/api/v1/customer`) and SDK (`/sdk/v1`) surfaces.
pub fn mount_customer_subs() -> actix_web::Scope {
    web::scope("/subscription")
        .service(routes::customer::get_current)
        .service(routes::customer::post_request)
        .service(routes::customer::put_deactivate)
        .service(routes::customer::get_history)
        .service(routes::customer::put_renew)
}
