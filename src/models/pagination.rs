//! Page-number pagination for the list pages

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, AppResult};

/// Records per list page
pub const PAGE_SIZE: i64 = 10;

/// `?page=` query parameter; a number or `last`
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// Resolved page: which slice of the ordered records to fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct PageWindow {
    pub number: i64,
    pub num_pages: i64,
    pub count: i64,
    pub per_page: i64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl PageWindow {
    /// Resolve the requested page against `count` records.
    ///
    /// The first page of an empty list is valid; every other page outside
    /// `1..=num_pages` is not found.
    pub fn resolve(requested: Option<&str>, count: i64, per_page: i64) -> AppResult<Self> {
        let num_pages = if count == 0 {
            1
        } else {
            (count + per_page - 1) / per_page
        };

        let number = match requested.map(str::trim) {
            None | Some("") => 1,
            Some("last") => num_pages,
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|_| AppError::NotFound("Page is not a number".to_string()))?,
        };

        if number < 1 || number > num_pages {
            return Err(AppError::NotFound(format!("Invalid page ({})", number)));
        }

        Ok(Self {
            number,
            num_pages,
            count,
            per_page,
            has_next: number < num_pages,
            has_previous: number > 1,
        })
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1) * self.per_page
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }

    pub fn is_paginated(&self) -> bool {
        self.num_pages > 1
    }
}
