use std::{future::Future, pin::Pin, sync::Arc};

use actix_web::{
    Error, HttpMessage,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use common::{identity::Identity, jwt};
use futures::future::{Ready, ok};

/// Requires a valid session token on every request of the wrapped scope.
///
/// The token itself is checked by the extractor middleware; this one turns
/// the verified claims into an [`Identity`] for the handlers, or answers 401.
pub struct SessionMiddleware {}

impl SessionMiddleware {
    pub fn new() -> Self {
        SessionMiddleware {}
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Transform = SessionMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(SessionMiddlewareService {
            service: Arc::new(service),
        })
    }
}

pub struct SessionMiddlewareService<S> {
    service: Arc<S>,
}

impl<S, B> Service<ServiceRequest> for SessionMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = Arc::clone(&self.service);

        Box::pin(async move {
            match jwt::get_jwt_claims_or_error(&req) {
                Err(response) => Ok(req.into_response(response)),
                Ok(claims) => {
                    req.extensions_mut().insert(Identity::from(claims));
                    srv.call(req).await.map(|res| res.map_into_boxed_body())
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, HttpResponse, Responder, get, http::StatusCode, test, web};
    use common::{
        env_config::{AdminConfig, Config, JwtConfig},
        error::Res,
        identity::{Identity, Role, require_role},
        jwt::{ClaimsSpec, generate_jwt},
    };
    use uuid::Uuid;

    use super::SessionMiddleware;

    const SECRET: &str = "test-secret";

    fn config() -> Arc<Config> {
        Arc::new(Config {
            environment: "development".to_string(),
            database_url: "postgres://localhost/unused".to_string(),
            jwt_config: JwtConfig {
                secret: SECRET.to_string(),
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

    fn token(role: Role, secret: &str) -> String {
        generate_jwt(
            ClaimsSpec {
                user_id: Uuid::new_v4(),
                email: "someone@example.com".to_string(),
                role,
            },
            &JwtConfig {
                secret: secret.to_string(),
                expiration_hours: 1,
            },
        )
        .unwrap()
    }

    #[get("/admin/ping")]
    async fn admin_ping(identity: web::ReqData<Identity>) -> Res<impl Responder> {
        require_role(&identity, Role::Admin)?;
        Ok(HttpResponse::Ok().json(serde_json::json!({ "email": identity.email })))
    }

    macro_rules! app {
        () => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(config()))
                    .wrap(extractor::middleware())
                    .service(
                        web::scope("/v1")
                            .wrap(SessionMiddleware::new())
                            .service(admin_ping),
                    ),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn missing_token_is_unauthorized() {
        let app = app!();
        let req = test::TestRequest::get().uri("/v1/admin/ping").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let body: serde_json::Value = test::read_body_json(res).await;
        assert!(body["error"].as_str().unwrap().contains("Authorization header required"));
    }

    #[actix_web::test]
    async fn forged_token_is_unauthorized() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/v1/admin/ping")
            .insert_header(("Authorization", format!("Bearer {}", token(Role::Admin, "other"))))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn admin_token_reaches_admin_handler() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/v1/admin/ping")
            .insert_header(("Authorization", format!("Bearer {}", token(Role::Admin, SECRET))))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);

        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body["email"], "someone@example.com");
    }

    #[actix_web::test]
    async fn customer_token_is_forbidden_on_admin_handler() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/v1/admin/ping")
            .insert_header((
                "Authorization",
                format!("Bearer {}", token(Role::Customer, SECRET)),
            ))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }
}
