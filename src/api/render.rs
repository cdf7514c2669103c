//! Page output handed to the renderer
//!
//! A page is a template name plus its context. The body is that pair as JSON;
//! turning it into HTML is the renderer's job.

use axum::{
    http::{header::LOCATION, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
    error::{AppError, AppResult},
    services::catalog::Listing,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub template: &'static str,
    pub context: Map<String, Value>,
}

impl Page {
    pub fn new(template: &'static str) -> Self {
        Self {
            template,
            context: Map::new(),
        }
    }

    /// Add one context key
    pub fn with(mut self, key: &str, value: impl Serialize) -> AppResult<Self> {
        let value = serde_json::to_value(value).map_err(|e| {
            AppError::Internal(format!("Failed to encode context key {}: {}", key, e))
        })?;
        self.context.insert(key.to_string(), value);
        Ok(self)
    }

    /// Add a page of records under `key`, with the pagination keys
    pub fn with_listing<T: Serialize>(self, key: &str, listing: &Listing<T>) -> AppResult<Self> {
        self.with(key, &listing.items)?
            .with("is_paginated", listing.window.is_paginated())?
            .with("page_obj", listing.window)
    }
}

impl IntoResponse for Page {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Plain 302 to `location`
pub fn redirect(location: impl Into<String>) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.into())]).into_response()
}
