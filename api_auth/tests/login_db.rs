//! Customer login against a real database.
//!
//! Run with `DATABASE_URL` set: `cargo test -p api_auth -- --ignored`.

use std::sync::Arc;

use actix_web::{App, http::StatusCode, test, web};
use api_auth::services::user::{NewCustomerAccount, create_customer_account};
use common::env_config::{AdminConfig, Config, JwtConfig};
use sqlx::PgPool;

fn config() -> Arc<Config> {
    Arc::new(Config {
        environment: "development".to_string(),
        database_url: "postgres://localhost/unused".to_string(),
        jwt_config: JwtConfig {
            secret: "login-test-secret".to_string(),
            expiration_hours: 1,
        },
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        num_workers: 1,
        cors_allowed_origin: "http://localhost:3000".to_string(),
        console_logging_enabled: false,
        rate_limit_per_second: 100,
        expiry_sweep_interval_secs: 300,
        admin: AdminConfig {
            email: "admin@example.com".to_string(),
            password: None,
        },
    })
}

#[sqlx::test(migrations = "../db/migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn customer_login_returns_profile_until_deleted(pool: PgPool) {
    let (_, customer) = create_customer_account(
        &pool,
        NewCustomerAccount {
            email: "login@example.com".to_string(),
            password: "secret1".to_string(),
            name: "Login Customer".to_string(),
            phone: String::new(),
        },
    )
    .await
    .unwrap();

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(Arc::new(pool.clone())))
            .app_data(web::Data::new(config()))
            .service(web::scope("/api").service(api_auth::mount_customer_auth())),
    )
    .await;

    let login = || {
        test::TestRequest::post()
            .uri("/api/customer/login")
            .set_json(serde_json::json!({
                "email": "login@example.com",
                "password": "secret1"
            }))
            .to_request()
    };

    let res = test::call_service(&app, login()).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(body["customer"]["id"], customer.id.to_string());
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));

    db::customer::soft_delete_customer(&pool, customer.id)
        .await
        .unwrap();

    let res = test::call_service(&app, login()).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(body["error"], "Authorization error: Invalid credentials");
}
