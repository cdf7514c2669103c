//! Route access requirements, checked before the handler runs

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use super::Identity;
use crate::{
    error::AppError,
    models::{UserClaims, CAN_MARK_RETURNED},
    AppState,
};

/// What a route demands of the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    Capability(&'static str),
}

/// Why a caller was turned away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    LoginRequired,
    MissingCapability(&'static str),
}

/// The authorization predicate: may `identity` use a route requiring `access`?
pub fn authorize(identity: Option<&UserClaims>, access: Access) -> Result<(), Denial> {
    match access {
        Access::Public => Ok(()),
        Access::Authenticated => identity.map(|_| ()).ok_or(Denial::LoginRequired),
        Access::Capability(capability) => match identity {
            Some(claims) if claims.has_capability(capability) => Ok(()),
            _ => Err(Denial::MissingCapability(capability)),
        },
    }
}

async fn guard(
    state: &AppState,
    access: Access,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = req.extensions().get::<Identity>().and_then(|i| i.0.as_ref());

    if let Err(denial) = authorize(identity, access) {
        tracing::debug!("Denied {} {}: {:?}", req.method(), req.uri().path(), denial);
        return Err(match denial {
            Denial::LoginRequired => AppError::LoginRequired {
                login_url: state.config.auth.login_url.clone(),
                next: req
                    .uri()
                    .path_and_query()
                    .map(|pq| pq.as_str())
                    .unwrap_or_else(|| req.uri().path())
                    .to_string(),
            },
            Denial::MissingCapability(capability) => {
                AppError::Authorization(format!("Missing capability {}", capability))
            }
        });
    }

    Ok(next.run(req).await)
}

pub async fn require_login(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    guard(&state, Access::Authenticated, req, next).await
}

pub async fn require_can_mark_returned(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    guard(&state, Access::Capability(CAN_MARK_RETURNED), req, next).await
}
