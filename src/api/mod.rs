//! HTTP handlers for the catalog pages

pub mod access;
pub mod accounts;
pub mod authors;
pub mod books;
pub mod health;
pub mod home;
pub mod loans;
pub mod openapi;
pub mod params;
pub mod render;
pub mod router;

use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use chrono::NaiveDate;

use crate::{error::AppError, models::UserClaims, AppState};

/// Who is making the request, resolved once per request by [`identify`]
#[derive(Debug, Clone, Default)]
pub struct Identity(pub Option<UserClaims>);

/// Decode the bearer token (if any) and attach the [`Identity`].
///
/// No `Authorization` header means anonymous; a header that is not a valid
/// bearer token is rejected outright.
pub async fn identify(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = if req.headers().contains_key(AUTHORIZATION) {
        let bearer = req
            .headers()
            .typed_get::<Authorization<Bearer>>()
            .ok_or_else(|| {
                AppError::Authentication("Invalid authorization header format".to_string())
            })?;

        let claims = UserClaims::from_token(bearer.token(), &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;
        Some(claims)
    } else {
        None
    };

    req.extensions_mut().insert(Identity(claims));
    Ok(next.run(req).await)
}

/// Extractor for the identity attached by [`identify`]
pub struct CurrentUser(pub Option<UserClaims>);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = parts.extensions.get::<Identity>().cloned().unwrap_or_default();
        Ok(CurrentUser(identity.0))
    }
}

/// Server-local calendar date used by the date rules
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
