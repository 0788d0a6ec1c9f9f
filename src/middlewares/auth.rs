use crate::error::AppError;
use crate::utils::JwtService;
use crate::middlewares::Actor;
use actix_web::http::Method;
use actix_web::http::header::{AUTHORIZATION, HeaderValue};
use actix_web::{
    Error, HttpMessage,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};

/// Resolves the caller from `Authorization: Bearer <token>`.
///
/// Requests without the header pass through as guests; each handler decides whether a guest
/// may proceed. A header carrying an invalid or expired token is rejected here with 401.
pub struct AuthMiddleware {
    jwt_service: JwtService,
}

impl AuthMiddleware {
    pub fn new(jwt_service: JwtService) -> Self {
        Self { jwt_service }
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
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            jwt_service: self.jwt_service.clone(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    jwt_service: JwtService,
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
        // 放行所有 CORS 预检请求
        if req.method() == Method::OPTIONS {
            return Box::pin(self.service.call(req));
        }

        match resolve_actor(&self.jwt_service, req.headers().get(AUTHORIZATION)) {
            Ok(Some(actor)) => {
                req.extensions_mut().insert(actor);
                Box::pin(self.service.call(req))
            }
            Ok(None) => Box::pin(self.service.call(req)),
            Err(error) => Box::pin(async move { Err(error.into()) }),
        }
    }
}

/// `None` means no credentials were presented.
fn resolve_actor(
    jwt_service: &JwtService,
    header: Option<&HeaderValue>,
) -> Result<Option<Actor>, AppError> {
    let Some(header) = header else {
        return Ok(None);
    };

    let token = header
        .to_str()
        .ok()
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::AuthError("Malformed Authorization header".to_string()))?;

    match jwt_service.verify_access_token(token) {
        Ok(claims) => Ok(Some(claims.actor())),
        Err(e) => {
            log::debug!("Rejected access token: {e}");
            Err(AppError::AuthError("Invalid access token".to_string()))
        }
    }
}
