use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::Method,
    Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use lazy_static::lazy_static;
use regex::Regex;

use crate::auth::{bearer_token, TokenKeys};
use crate::error::AppError;

lazy_static! {
    static ref PUBLIC_AVATAR_PATH: Regex =
        Regex::new(r"^/users/[0-9a-fA-F-]{36}/avatar$").unwrap();
}

/// Routes reachable without a session token.
pub fn is_public(method: &Method, path: &str) -> bool {
    match (method, path) {
        (_, "/health") => true,
        (&Method::POST, "/users") | (&Method::POST, "/users/login") => true,
        (&Method::GET, path) => PUBLIC_AVATAR_PATH.is_match(path),
        _ => false,
    }
}

/// Rejects requests to protected routes unless they carry a bearer token with a
/// valid signature and expiry. Verified claims and the raw token are stored in
/// request extensions; whether the session is still active is checked by the
/// `CurrentSession` extractor.
pub struct AuthMiddleware {
    keys: TokenKeys,
}

impl AuthMiddleware {
    pub fn new(keys: TokenKeys) -> Self {
        Self { keys }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            keys: self.keys.clone(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    keys: TokenKeys,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if is_public(req.method(), req.path()) {
            return Box::pin(self.service.call(req));
        }

        let token = match bearer_token(req.headers()) {
            Some(token) => token,
            None => {
                let err = AppError::Unauthorized("Please authenticate.".into());
                return Box::pin(async move { Err(err.into()) });
            }
        };

        match self.keys.verify(&token.0) {
            Ok(claims) => {
                req.extensions_mut().insert(claims);
                req.extensions_mut().insert(token);
                Box::pin(self.service.call(req))
            }
            Err(err) => {
                log::debug!("Rejected token on {}: {}", req.path(), err);
                let err = AppError::Unauthorized("Please authenticate.".into());
                Box::pin(async move { Err(err.into()) })
            }
        }
    }
}
