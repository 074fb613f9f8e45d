use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures::future::{ready, Ready};

use crate::domain::errors::DomainError;
use crate::domain::notification::Principal;
use crate::domain::ports::TokenVerifier;
use crate::errors::AppError;

/// Any caller holding a valid bearer token.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub Principal);

/// A caller whose token carries the admin role.
#[derive(Debug, Clone, Copy)]
pub struct AdminUser(pub Principal);

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req).map(AuthenticatedUser))
    }
}

impl FromRequest for AdminUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req).and_then(|principal| {
            if principal.is_admin() {
                Ok(AdminUser(principal))
            } else {
                Err(AppError::Forbidden)
            }
        }))
    }
}

fn authenticate(req: &HttpRequest) -> Result<Principal, AppError> {
    let verifier = req
        .app_data::<web::Data<dyn TokenVerifier>>()
        .ok_or_else(|| AppError::Internal("token verifier is not configured".to_string()))?;

    let token = bearer_token(req)
        .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;

    verifier.verify(&token).map_err(|e| match e {
        DomainError::Unauthenticated(msg) => AppError::Unauthorized(msg),
        other => other.into(),
    })
}

/// The token from `Authorization: Bearer`, or from the `access_token` query
/// parameter for clients that cannot set headers on a streaming request.
fn bearer_token(req: &HttpRequest) -> Option<String> {
    if let Some(value) = req.headers().get("Authorization") {
        return value
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
    }

    web::Query::<AccessTokenQuery>::from_query(req.query_string())
        .ok()
        .and_then(|q| q.into_inner().access_token)
        .filter(|t| !t.is_empty())
}

#[derive(serde::Deserialize)]
struct AccessTokenQuery {
    access_token: Option<String>,
}
