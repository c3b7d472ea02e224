use std::{num::NonZeroU32, rc::Rc, sync::Arc};

use actix_web::{
    Error, HttpResponse,
    body::{BoxBody, MessageBody},
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header::{self, HeaderValue},
};
use common::error::AppError;
use futures::future::{LocalBoxFuture, Ready, ready};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};

/// Server-wide request budget, refilled every second and shared by all callers.
pub struct GlobalLimiter {
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl GlobalLimiter {
    /// A budget of `0` is raised to one request per second.
    pub fn new(permits_per_second: u32) -> Self {
        let permits = NonZeroU32::new(permits_per_second).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: Arc::new(RateLimiter::direct(Quota::per_second(permits))),
        }
    }
}

/// 429 carrying the usual `{ "error": ... }` body and a one second `Retry-After`.
fn overloaded() -> HttpResponse {
    let error = AppError::TooManyRequests("Server overloaded. Please try again later.".to_string());
    let mut res = error.to_http_response();
    res.headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
    res
}

impl<S, B> Transform<S, ServiceRequest> for GlobalLimiter
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Transform = GlobalLimiterService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(GlobalLimiterService {
            service: Rc::new(service),
            limiter: Arc::clone(&self.limiter),
        }))
    }
}

pub struct GlobalLimiterService<S> {
    service: Rc<S>,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl<S, B> Service<ServiceRequest> for GlobalLimiterService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if self.limiter.check().is_err() {
            log::warn!("Rate limit reached, rejecting {} {}", req.method(), req.path());
            return Box::pin(ready(Ok(req.into_response(overloaded()))));
        }

        let srv = Rc::clone(&self.service);
        Box::pin(async move { srv.call(req).await.map(|res| res.map_into_boxed_body()) })
    }
}
