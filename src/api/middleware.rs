//! Authorization gate
//!
//! Two middleware composed per route: [`Authenticate`] verifies the token
//! and re-resolves the account from the store, [`RequireRole`] checks that
//! account's role. Register `RequireRole` first so `Authenticate` runs
//! outermost:
//!
//! ```ignore
//! web::scope("/admin")
//!     .wrap(RequireRole(Role::Admin))
//!     .wrap(Authenticate)
//! ```
//!
//! Handlers behind the gate read the caller with `web::ReqData<Account>`.

use std::future::{ready, Ready};
use std::rc::Rc;

use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderMap, AUTHORIZATION};
use actix_web::{web, Error, HttpMessage, ResponseError};
use futures::future::LocalBoxFuture;
use tracing::{debug, warn};

use crate::api::AppState;
use crate::db::accounts;
use crate::error::{ApiError, NO_TOKEN};
use crate::models::{Account, AccountStatus, Role};

/// Custom header the web client sends the token in.
pub const TOKEN_HEADER: &str = "token";

/// Token from the `token` header, falling back to `Authorization: Bearer`.
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let custom = headers
        .get(TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if custom.is_some() {
        return custom;
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim())
        .filter(|token| !token.is_empty())
}

async fn authenticate(req: &ServiceRequest) -> Result<Account, ApiError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| ApiError::internal("Server error.", "application state missing"))?;

    let token = extract_token(req.headers())
        .ok_or_else(|| ApiError::Unauthenticated(NO_TOKEN.into()))?;

    let claims = state.tokens.verify(token).map_err(|err| {
        debug!(error = %err, "token rejected");
        ApiError::authentication_failed()
    })?;

    match accounts::find_by_id(state.db.pool(), &claims.account_id).await? {
        Some(account) if account.status == AccountStatus::Active => Ok(account),
        Some(_) => {
            debug!(account_id = %claims.account_id, "token for an inactive account");
            Err(ApiError::authentication_failed())
        }
        None => {
            debug!(account_id = %claims.account_id, "token for a deleted account");
            Err(ApiError::authentication_failed())
        }
    }
}

pub struct Authenticate;

impl<S, B> Transform<S, ServiceRequest> for Authenticate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthenticateMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthenticateMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthenticateMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthenticateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            match authenticate(&req).await {
                Ok(account) => {
                    req.extensions_mut().insert(account);
                    service.call(req).await.map(ServiceResponse::map_into_left_body)
                }
                Err(err) => {
                    warn!(path = %req.path(), reason = %err, "request not authenticated");
                    let response = err.error_response();
                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}

/// Lets the request through only when the authenticated account has
/// exactly this role.
pub struct RequireRole(pub Role);

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RequireRoleMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireRoleMiddleware {
            service,
            role: self.0,
        }))
    }
}

pub struct RequireRoleMiddleware<S> {
    service: S,
    role: Role,
}

impl<S, B> Service<ServiceRequest> for RequireRoleMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let caller_role = req.extensions().get::<Account>().map(|account| account.role);

        if caller_role != Some(self.role) {
            warn!(path = %req.path(), required = %self.role, actual = ?caller_role, "role check failed");
            let err = ApiError::Forbidden(format!(
                "Access denied. Only {}s can perform this action.",
                self.role
            ));
            let response = req.into_response(err.error_response()).map_into_right_body();
            return Box::pin(async move { Ok(response) });
        }

        let fut = self.service.call(req);
        Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                actix_web::http::header::HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }
        map
    }

    #[test]
    fn token_header_takes_precedence() {
        let map = headers(&[("token", "abc"), ("authorization", "Bearer xyz")]);
        assert_eq!(extract_token(&map), Some("abc"));
    }

    #[test]
    fn bearer_fallback() {
        assert_eq!(extract_token(&headers(&[("authorization", "Bearer xyz")])), Some("xyz"));
        assert_eq!(extract_token(&headers(&[("authorization", "bearer xyz")])), Some("xyz"));
    }

    #[test]
    fn missing_or_malformed_headers_yield_nothing() {
        assert_eq!(extract_token(&headers(&[])), None);
        assert_eq!(extract_token(&headers(&[("token", "  ")])), None);
        assert_eq!(extract_token(&headers(&[("authorization", "Basic dXNlcg==")])), None);
        assert_eq!(extract_token(&headers(&[("authorization", "xyz")])), None);
    }
}
