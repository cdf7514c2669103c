//! Author pages

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Form,
};

use super::{
    params::IntegerPk,
    render::{redirect, Page},
};
use crate::{
    error::AppResult,
    forms::{FormData, FormView},
    models::PageQuery,
    services::catalog::Submission,
    AppState,
};

/// Paginated list of authors
#[utoipa::path(
    get,
    path = "/authors/",
    tag = "catalog",
    params(PageQuery),
    responses(
        (status = 200, description = "author_list.html"),
        (status = 404, description = "Page out of range")
    )
)]
pub async fn list_authors(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Page> {
    let listing = state
        .services
        .catalog
        .list_authors(query.page.as_deref())
        .await?;

    Page::new("author_list.html")
        .with_listing("author_list", &listing)?
        .with("some_data", "This is just some data")
}

#[utoipa::path(
    get,
    path = "/author/{id}",
    tag = "catalog",
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 200, description = "catalog/author_detail.html"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn get_author(
    State(state): State<AppState>,
    IntegerPk(id): IntegerPk,
) -> AppResult<Page> {
    let author = state.services.catalog.get_author(id).await?;
    Page::new("catalog/author_detail.html").with("author", author)
}

fn form_page(form: FormView) -> AppResult<Page> {
    Page::new("catalog/author_form.html").with("form", form)
}

#[utoipa::path(
    get,
    path = "/author/create/",
    tag = "catalog",
    responses((status = 200, description = "catalog/author_form.html"))
)]
pub async fn create_author_form(State(state): State<AppState>) -> AppResult<Page> {
    form_page(state.services.catalog.new_author_form())
}

#[utoipa::path(
    post,
    path = "/author/create/",
    tag = "catalog",
    responses(
        (status = 302, description = "Created; redirect to the author"),
        (status = 200, description = "Form re-rendered with errors")
    )
)]
pub async fn create_author(
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> AppResult<Response> {
    let data = FormData::new(pairs);
    Ok(match state.services.catalog.create_author(&data).await? {
        Submission::Saved(author) => redirect(author.url()),
        Submission::Rejected(form) => form_page(form)?.into_response(),
    })
}

#[utoipa::path(
    get,
    path = "/author/{id}/update/",
    tag = "catalog",
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 200, description = "catalog/author_form.html filled from the author"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn update_author_form(
    State(state): State<AppState>,
    IntegerPk(id): IntegerPk,
) -> AppResult<Page> {
    let (author, form) = state.services.catalog.edit_author_form(id).await?;
    form_page(form)?.with("author", author)
}

#[utoipa::path(
    post,
    path = "/author/{id}/update/",
    tag = "catalog",
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 302, description = "Saved; redirect to the author"),
        (status = 200, description = "Form re-rendered with errors"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn update_author(
    State(state): State<AppState>,
    IntegerPk(id): IntegerPk,
    Form(pairs): Form<Vec<(String, String)>>,
) -> AppResult<Response> {
    let data = FormData::new(pairs);
    Ok(match state.services.catalog.update_author(id, &data).await? {
        Submission::Saved(author) => redirect(author.url()),
        Submission::Rejected(form) => form_page(form)?.into_response(),
    })
}

#[utoipa::path(
    get,
    path = "/author/{id}/delete/",
    tag = "catalog",
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 200, description = "catalog/author_confirm_delete.html"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn delete_author_form(
    State(state): State<AppState>,
    IntegerPk(id): IntegerPk,
) -> AppResult<Page> {
    let author = state.services.catalog.author_for_delete(id).await?;
    Page::new("catalog/author_confirm_delete.html").with("author", author)
}

#[utoipa::path(
    post,
    path = "/author/{id}/delete/",
    tag = "catalog",
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 302, description = "Deleted; redirect to /authors/"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn delete_author(
    State(state): State<AppState>,
    IntegerPk(id): IntegerPk,
) -> AppResult<Response> {
    state.services.catalog.delete_author(id).await?;
    Ok(redirect("/authors/"))
}
