//! Bearer token middleware.
//!
//! Wrap the whole app with this middleware. If a request carries an `Authorization: Bearer <token>` header, the token
//! is validated and its [`JwtClaims`] are stored in the request extensions, where the [`JwtClaims`] extractor and the
//! ACL middleware pick them up. A request with a bad token is rejected with a 401 straight away. Requests without the
//! header pass through untouched, so public routes keep working.
use std::{pin::Pin, rc::Rc, sync::Arc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error,
    HttpMessage,
};
use futures::{
    future::{ok, Ready},
    Future,
};
use log::*;

use crate::{
    auth::{JwtClaims, TokenIssuer},
    errors::{AuthError, ServerError},
};

pub struct JwtMiddlewareFactory {
    issuer: Arc<TokenIssuer>,
}

impl JwtMiddlewareFactory {
    pub fn new(issuer: Arc<TokenIssuer>) -> Self {
        Self { issuer }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = JwtMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(JwtMiddlewareService { issuer: Arc::clone(&self.issuer), service: Rc::new(service) })
    }
}

pub struct JwtMiddlewareService<S> {
    issuer: Arc<TokenIssuer>,
    service: Rc<S>,
}

fn bearer_claims(req: &ServiceRequest, issuer: &TokenIssuer) -> Result<Option<JwtClaims>, AuthError> {
    let Some(value) = req.headers().get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
    let token = value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::PoorlyFormattedToken("Expected 'Bearer <token>'".into()))?;
    issuer.validate(token).map(Some)
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let claims = bearer_claims(&req, &self.issuer);
        Box::pin(async move {
            match claims {
                Ok(Some(claims)) => {
                    trace!("🔐️ Request authenticated for user #{} ({})", claims.sub, claims.role);
                    req.extensions_mut().insert(claims);
                },
                Ok(None) => trace!("🔐️ Anonymous request to {}", req.path()),
                Err(e) => {
                    debug!("🔐️ Rejecting request to {}. {e}", req.path());
                    return Err(ServerError::AuthenticationError(e).into());
                },
            }
            service.call(req).await
        })
    }
}
