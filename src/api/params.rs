//! Typed path captures
//!
//! Route segments that do not fit the capture pattern are treated as an
//! unmatched URL (404), not as a bad request.

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};

use crate::error::{AppError, AppResult};

/// `\d+` primary key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegerPk(pub i32);

/// `[-\w]+` token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlugPk(pub String);

pub fn parse_integer_pk(raw: &str) -> AppResult<i32> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::NotFound(format!("No route for id {}", raw)));
    }
    raw.parse::<i32>()
        .map_err(|_| AppError::NotFound(format!("No record with id {}", raw)))
}

pub fn parse_slug(raw: &str) -> AppResult<String> {
    let valid = !raw.is_empty()
        && raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(raw.to_string())
    } else {
        Err(AppError::NotFound(format!("No route for id {}", raw)))
    }
}

async fn raw_segment<S: Send + Sync>(parts: &mut Parts, state: &S) -> AppResult<String> {
    let Path(raw) = Path::<String>::from_request_parts(parts, state)
        .await
        .map_err(|e| AppError::NotFound(e.to_string()))?;
    Ok(raw)
}

#[async_trait]
impl<S> FromRequestParts<S> for IntegerPk
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let raw = raw_segment(parts, state).await?;
        parse_integer_pk(&raw).map(IntegerPk)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for SlugPk
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let raw = raw_segment(parts, state).await?;
        parse_slug(&raw).map(SlugPk)
    }
}
