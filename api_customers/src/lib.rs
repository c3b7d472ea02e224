use actix_web::web;

pub mod routes {
    pub mod admin;
    pub mod profile;
}

pub mod services {
    pub mod customer;
}

mod dtos {
    pub(crate) mod customer;
}

pub fn mount_admin_customers() -> actix_web::Scope {
    web::scope("/customers")
        .service(routes::admin::get_customers)
        .service(routes::admin::post_customer)
        .service(routes::admin::get_customer)
        .service(routes::admin::put_customer)
        .service(routes::admin::delete_customer)
}

pub fn mount_profile() -> actix_web::Scope {
    web::scope("/profile")
        .service(routes::profile::get_profile)
        .service(routes::profile::put_profile)
}
