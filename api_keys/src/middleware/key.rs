use actix_web::{
    Error, HttpMessage,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    web,
};
use common::{error::AppError, key};
use futures::future::{Ready, ok};
use sqlx::PgPool;
use std::{future::Future, pin::Pin, sync::Arc};

use crate::service;

// KeyMiddleware struct (as a Transform)
pub struct KeyMiddleware {}

impl KeyMiddleware {
    pub fn new() -> Self {
        KeyMiddleware {}
    }
}

impl<S, B> Transform<S, ServiceRequest> for KeyMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Transform = KeyMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(KeyMiddlewareService {
            service: Arc::new(service),
        })
    }
}

pub struct KeyMiddlewareService<S> {
    service: Arc<S>,
}

impl<S, B> Service<ServiceRequest> for KeyMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    actix_web::dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = Arc::clone(&self.service);

        Box::pin(async move {
            let api_key = match key::get_api_key_or_error(&req) {
                Ok(api_key) => api_key,
                Err(response) => return Ok(req.into_response(response)),
            };

            let Some(pool) = req
                .app_data::<web::Data<Arc<PgPool>>>()
                .map(|pool| Arc::clone(pool.get_ref()))
            else {
                return Ok(req.error_response(AppError::Internal(
                    "Database pool missing".to_string(),
                )));
            };

            match service::key::resolve_api_key(&pool, &api_key).await {
                Ok(identity) => {
                    req.extensions_mut().insert(identity);
                    srv.call(req).await.map(|res| res.map_into_boxed_body())
                }
                Err(e) => Ok(req.error_response(e)),
            }
        })
    }
}
