//! Borrowed-copy listings and the librarian renewal form

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Form,
};

use super::{
    params::SlugPk,
    render::{redirect, Page},
    today, CurrentUser,
};
use crate::{
    error::{AppError, AppResult},
    forms::FormData,
    models::PageQuery,
    services::renewals::{RenewalOutcome, RenewalPage},
    AppState,
};

/// Copies on loan to the current user
#[utoipa::path(
    get,
    path = "/mybooks/",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "catalog/bookinstance_list_borrowed_user.html"),
        (status = 302, description = "Anonymous; redirect to login")
    )
)]
pub async fn my_borrowed(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Page> {
    let claims = user.ok_or_else(|| AppError::Authentication("Not logged in".to_string()))?;
    tracing::debug!("Listing loans of {}", claims.username());

    let listing = state
        .services
        .catalog
        .list_loans(Some(claims.user_id), query.page.as_deref(), today())
        .await?;

    Page::new("catalog/bookinstance_list_borrowed_user.html")
        .with_listing("bookinstance_list", &listing)
}

/// Every copy currently on loan
#[utoipa::path(
    get,
    path = "/allborrowedbooks/",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "catalog/bookinstance_list_borrowed_all.html"),
        (status = 403, description = "Missing catalog.can_mark_returned")
    )
)]
pub async fn all_borrowed(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Page> {
    let listing = state
        .services
        .catalog
        .list_loans(None, query.page.as_deref(), today())
        .await?;

    Page::new("catalog/bookinstance_list_borrowed_all.html")
        .with_listing("bookinstance_list", &listing)
}

fn renewal_page(page: RenewalPage) -> AppResult<Page> {
    Page::new("catalog/book_renew_librarian.html")
        .with("form", page.form)?
        .with("bookinst", page.instance)
}

/// Renewal form with a proposed due date
#[utoipa::path(
    get,
    path = "/book/{id}/renew/",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Book instance UUID")),
    responses(
        (status = 200, description = "catalog/book_renew_librarian.html"),
        (status = 403, description = "Missing catalog.can_mark_returned"),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn renew_form(
    State(state): State<AppState>,
    SlugPk(token): SlugPk,
) -> AppResult<Page> {
    let page = state.services.renewals.start(&token, today()).await?;
    renewal_page(page)
}

/// Store a new due date
#[utoipa::path(
    post,
    path = "/book/{id}/renew/",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Book instance UUID")),
    responses(
        (status = 302, description = "Renewed; redirect to /allborrowedbooks/"),
        (status = 200, description = "Form re-rendered with errors"),
        (status = 403, description = "Missing catalog.can_mark_returned"),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn renew(
    State(state): State<AppState>,
    SlugPk(token): SlugPk,
    Form(pairs): Form<Vec<(String, String)>>,
) -> AppResult<Response> {
    let data = FormData::new(pairs);
    Ok(
        match state.services.renewals.submit(&token, &data, today()).await? {
            RenewalOutcome::Renewed(_) => redirect("/allborrowedbooks/"),
            RenewalOutcome::Rejected(page) => renewal_page(page)?.into_response(),
        },
    )
}
