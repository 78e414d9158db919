use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    error::InternalError,
    http::header::{HeaderMap, AUTHORIZATION},
    Error, FromRequest, HttpMessage, HttpRequest, HttpResponse,
};
use crypto_core::jwt::{SessionClaims, TokenKeys};
use error_types::ErrorResponse;
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::sync::Arc;

/// Authenticated user, taken from a verified session token
#[derive(Debug, Clone)]
pub struct CurrentUser(pub SessionClaims);

impl CurrentUser {
    pub fn id(&self) -> i32 {
        self.0.id
    }

    pub fn email(&self) -> &str {
        &self.0.email
    }
}

/// JWT Authentication Middleware
///
/// Verifies the bearer token when one is present and stores the claims in the
/// request extensions. A missing, malformed or invalid token leaves the
/// request anonymous; rejection happens only where a handler asks for a
/// [`CurrentUser`].
#[derive(Clone)]
pub struct JwtAuthMiddleware {
    keys: Arc<TokenKeys>,
}

impl JwtAuthMiddleware {
    pub fn new(keys: Arc<TokenKeys>) -> Self {
        Self { keys }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = JwtAuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service,
            keys: self.keys.clone(),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: S,
    keys: Arc<TokenKeys>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
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
        if let Some(token) = bearer_token(req.headers()) {
            match self.keys.verify_session_token(token) {
                Ok(claims) => {
                    req.extensions_mut().insert(CurrentUser(claims));
                }
                Err(e) => {
                    tracing::debug!(path = %req.path(), error = %e, "Ignoring invalid bearer token");
                }
            }
        }

        Box::pin(self.service.call(req))
    }
}

/// Token from an `Authorization: Bearer <token>` header; the scheme is
/// matched case-insensitively
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(' ')?;

    if scheme.eq_ignore_ascii_case("bearer") {
        let token = token.trim();
        (!token.is_empty()).then_some(token)
    } else {
        None
    }
}

fn unauthorized() -> Error {
    InternalError::from_response(
        "Unauthorized",
        HttpResponse::Unauthorized().json(ErrorResponse::unauthorized()),
    )
    .into()
}

/// FromRequest implementation for CurrentUser
impl FromRequest for CurrentUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<CurrentUser>() {
            Some(user) => ready(Ok(user.clone())),
            None => ready(Err(unauthorized())),
        }
    }
}
