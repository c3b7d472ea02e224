mod cors;

use actix_web::{App, HttpServer, web};
use common::{env_config::Config, error::AppError};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // get env vars
    let config = Config::from_env();
    let config_data = config.clone();
    let is_production = config.is_production();
    let origin = config.cors_allowed_origin.clone();

    // init logger
    if config.console_logging_enabled {
        logger::setup(is_production).expect("Failed to set up logger");
    }

    // init db connection and run migrations
    let pool = db::setup(&config.database_url, is_production)
        .await
        .expect("Failed to set up database");

    // make sure an admin can log in on a fresh database
    api_auth::services::user::bootstrap_admin(&pool, &config.admin)
        .await
        .expect("Failed to bootstrap admin account");

    // keep stored statuses in line with expiry dates
    checker::spawn(pool.clone(), config.expiry_sweep_interval_secs);

    log::info!(
        "Listening on {}:{} ({})",
        config.server_host,
        config.server_port,
        config.environment
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(config_data.clone()))
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                AppError::BadRequest(err.to_string()).into()
            }))
            .app_data(web::QueryConfig::default().error_handler(|err, _req| {
                AppError::BadRequest(err.to_string()).into()
            }))
            .app_data(web::PathConfig::default().error_handler(|err, _req| {
                AppError::BadRequest(err.to_string()).into()
            }))
            .wrap(extractor::middleware()) // 4th
            .wrap(logger::middleware(config_data.console_logging_enabled)) // 3rd
            .wrap(limiter::global_middleware(config_data.rate_limit_per_second)) // 2nd
            .wrap(cors::middleware(&origin)) // 1st
            .service(
                web::scope("/api")
                    .service(
                        web::scope("/v1")
                            .wrap(api_auth::session_middleware())
                            .service(
                                web::scope("/admin")
                                    .service(api_customers::mount_admin_customers())
                                    .service(api_packs::mount_packs())
                                    .service(api_subs::mount_admin_subs()),
                            )
                            .service(
                                web::scope("/customer")
                                    .service(api_customers::mount_profile())
                                    .service(api_subs::mount_customer_subs()),
                            ),
                    )
                    .service(api_auth::mount_admin_auth())
                    .service(api_auth::mount_customer_auth()),
            )
            .service(
                web::scope("/sdk")
                    .service(api_keys::mount_sdk_auth())
                    .service(
                        web::scope("/v1")
                            .wrap(api_keys::middleware())
                            .service(api_subs::mount_customer_subs()),
                    ),
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .workers(config.num_workers)
    .run()
    .await
}
