use actix_web::web;

pub mod routes {
    pub mod pack;
}

pub mod services {
    pub mod pack;
}

mod dtos {
    pub(crate) mod pack;
}

pub fn mount_packs() -> actix_web::Scope {
    web::scope("/packs")
        .service(routes::pack::get_packs)
        .service(routes::pack::post_pack)
        .service(routes::pack::get_pack)
        .service(routes::pack::put_pack)
        .service(routes::pack::delete_pack)
}
