//! Book create/update form

use serde_json::{json, Value};
use validator::Validate;

use super::{
    add_error, check_allowed, merge_validation_errors, required_text, FieldErrors, FormData,
    FormView, INVALID_CHOICE, REQUIRED,
};
use crate::models::{Author, Book, BookInput, Genre};

pub const BOOK_CREATE_FIELDS: &[&str] = &["title", "author", "summary", "isbn", "genre"];
pub const BOOK_UPDATE_FIELDS: &[&str] = &["title", "author", "summary", "isbn", "genre"];

#[derive(Debug, Validate)]
struct BookText {
    #[validate(length(max = 200, message = "Ensure this value has at most 200 characters."))]
    title: String,
    #[validate(length(max = 1000, message = "Ensure this value has at most 1000 characters."))]
    summary: String,
    #[validate(length(max = 13, message = "Ensure this value has at most 13 characters."))]
    isbn: String,
}

/// Options offered by the author and genre selects
pub struct BookChoices<'a> {
    pub authors: &'a [Author],
    pub genres: &'a [Genre],
}

impl BookChoices<'_> {
    fn to_value(&self) -> Value {
        json!({
            "author": self
                .authors
                .iter()
                .map(|a| json!({ "id": a.id, "name": a.display_name() }))
                .collect::<Vec<_>>(),
            "genre": self
                .genres
                .iter()
                .map(|g| json!({ "id": g.id, "name": g.name }))
                .collect::<Vec<_>>(),
        })
    }
}

/// Bind a submission restricted to `allowed` fields
pub fn bind(
    data: &FormData,
    allowed: &[&str],
    choices: &BookChoices<'_>,
) -> Result<BookInput, FieldErrors> {
    let mut errors = FieldErrors::new();
    check_allowed(data, allowed, &mut errors);

    let text = BookText {
        title: required_text(data, "title", &mut errors),
        summary: required_text(data, "summary", &mut errors),
        isbn: required_text(data, "isbn", &mut errors),
    };
    merge_validation_errors(&mut errors, text.validate());

    let author_id = match data.get("author") {
        None => None,
        Some(raw) => match raw.parse::<i32>() {
            Ok(id) if choices.authors.iter().any(|a| a.id == id) => Some(id),
            _ => {
                add_error(&mut errors, "author", INVALID_CHOICE);
                None
            }
        },
    };

    let raw_genres = data.get_all("genre");
    if raw_genres.is_empty() {
        add_error(&mut errors, "genre", REQUIRED);
    }
    let mut genre_ids = Vec::with_capacity(raw_genres.len());
    for raw in raw_genres {
        match raw.parse::<i32>() {
            Ok(id) if choices.genres.iter().any(|g| g.id == id) => genre_ids.push(id),
            _ => add_error(
                &mut errors,
                "genre",
                format!(
                    "Select a valid choice. {} is not one of the available choices.",
                    raw
                ),
            ),
        }
    }
    genre_ids.sort_unstable();
    genre_ids.dedup();

    if errors.is_empty() {
        Ok(BookInput {
            title: text.title,
            author_id,
            summary: text.summary,
            isbn: text.isbn,
            genre_ids,
        })
    } else {
        Err(errors)
    }
}

/// Empty create form
pub fn initial_create(choices: &BookChoices<'_>) -> FormView {
    let mut view = FormView::default();
    for field in BOOK_CREATE_FIELDS {
        view.fields.insert(field.to_string(), Value::Null);
    }
    view.fields.insert("genre".into(), json!([]));
    view.choices = Some(choices.to_value());
    view
}

/// Update form pre-populated from the stored book and its genre ids
pub fn initial_update(book: &Book, genre_ids: &[i32], choices: &BookChoices<'_>) -> FormView {
    let mut view = FormView::default();
    view.fields.insert("title".into(), Value::from(book.title.as_str()));
    view.fields
        .insert("author".into(), book.author_id.map(Value::from).unwrap_or(Value::Null));
    view.fields
        .insert("summary".into(), Value::from(book.summary.as_str()));
    view.fields.insert("isbn".into(), Value::from(book.isbn.as_str()));
    view.fields.insert("genre".into(), json!(genre_ids));
    view.choices = Some(choices.to_value());
    view
}

/// Bound form echoing a rejected submission
pub fn rejected(
    data: &FormData,
    allowed: &[&str],
    errors: FieldErrors,
    choices: &BookChoices<'_>,
) -> FormView {
    FormView {
        choices: Some(choices.to_value()),
        ..FormView::resubmitted(data, allowed, errors)
    }
}
