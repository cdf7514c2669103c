//! Book pages: list, detail and the create/update/delete forms

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

const SOME_DATA: &str = "This is just some data";

/// Paginated list of books
#[utoipa::path(
    get,
    path = "/books/",
    tag = "catalog",
    params(PageQuery),
    responses(
        (status = 200, description = "book_list.html"),
        (status = 404, description = "Page out of range")
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Page> {
    let listing = state
        .services
        .catalog
        .list_books(query.page.as_deref())
        .await?;

    Page::new("book_list.html")
        .with_listing("book_list", &listing)?
        .with("some_data", SOME_DATA)
}

/// One book with its author, genres and copies
#[utoipa::path(
    get,
    path = "/book/{id}",
    tag = "catalog",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "catalog/book_detail.html"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(State(state): State<AppState>, IntegerPk(id): IntegerPk) -> AppResult<Page> {
    let book = state.services.catalog.get_book(id).await?;
    Page::new("catalog/book_detail.html").with("book", book)
}

fn form_page(form: FormView) -> AppResult<Page> {
    Page::new("catalog/book_form.html").with("form", form)
}

#[utoipa::path(
    get,
    path = "/book/create/",
    tag = "catalog",
    responses((status = 200, description = "Empty catalog/book_form.html"))
)]
pub async fn create_book_form(State(state): State<AppState>) -> AppResult<Page> {
    let form = state.services.catalog.new_book_form().await?;
    form_page(form)
}

#[utoipa::path(
    post,
    path = "/book/create/",
    tag = "catalog",
    responses(
        (status = 302, description = "Created; redirect to the book"),
        (status = 200, description = "Form re-rendered with errors")
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> AppResult<Response> {
    let data = FormData::new(pairs);
    Ok(match state.services.catalog.create_book(&data).await? {
        Submission::Saved(book) => redirect(book.url()),
        Submission::Rejected(form) => form_page(form)?.into_response(),
    })
}

#[utoipa::path(
    get,
    path = "/book/{id}/update/",
    tag = "catalog",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "catalog/book_form.html filled from the book"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book_form(
    State(state): State<AppState>,
    IntegerPk(id): IntegerPk,
) -> AppResult<Page> {
    let (book, form) = state.services.catalog.edit_book_form(id).await?;
    form_page(form)?.with("book", book)
}

#[utoipa::path(
    post,
    path = "/book/{id}/update/",
    tag = "catalog",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 302, description = "Saved; redirect to the book"),
        (status = 200, description = "Form re-rendered with errors"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    IntegerPk(id): IntegerPk,
    Form(pairs): Form<Vec<(String, String)>>,
) -> AppResult<Response> {
    let data = FormData::new(pairs);
    Ok(match state.services.catalog.update_book(id, &data).await? {
        Submission::Saved(book) => redirect(book.url()),
        Submission::Rejected(form) => form_page(form)?.into_response(),
    })
}

#[utoipa::path(
    get,
    path = "/book/{id}/delete/",
    tag = "catalog",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "catalog/book_confirm_delete.html"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_book_form(
    State(state): State<AppState>,
    IntegerPk(id): IntegerPk,
) -> AppResult<Page> {
    let book = state.services.catalog.book_for_delete(id).await?;
    Page::new("catalog/book_confirm_delete.html").with("book", book)
}

#[utoipa::path(
    post,
    path = "/book/{id}/delete/",
    tag = "catalog",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 302, description = "Deleted; redirect to /books/"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    IntegerPk(id): IntegerPk,
) -> AppResult<Response> {
    state.services.catalog.delete_book(id).await?;
    Ok(redirect("/books/"))
}
