//! Author create/update form

use chrono::NaiveDate;
use serde_json::Value;
use validator::Validate;

use super::{
    check_allowed, merge_validation_errors, optional_date, required_text, FieldErrors, FormData,
    FormView,
};
use crate::models::{Author, AuthorInput};

pub const AUTHOR_CREATE_FIELDS: &[&str] =
    &["first_name", "last_name", "date_of_birth", "date_of_death"];
pub const AUTHOR_UPDATE_FIELDS: &[&str] =
    &["first_name", "last_name", "date_of_birth", "date_of_death"];

/// Death date the create form starts with
pub fn default_date_of_death() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(2016, 12, 10)
}

#[derive(Debug, Validate)]
struct AuthorNames {
    #[validate(length(max = 100, message = "Ensure this value has at most 100 characters."))]
    first_name: String,
    #[validate(length(max = 100, message = "Ensure this value has at most 100 characters."))]
    last_name: String,
}

/// Bind a submission restricted to `allowed` fields
pub fn bind(data: &FormData, allowed: &[&str]) -> Result<AuthorInput, FieldErrors> {
    let mut errors = FieldErrors::new();
    check_allowed(data, allowed, &mut errors);

    let first_name = required_text(data, "first_name", &mut errors);
    let last_name = required_text(data, "last_name", &mut errors);
    let date_of_birth = optional_date(data, "date_of_birth", &mut errors);
    let date_of_death = optional_date(data, "date_of_death", &mut errors);

    let names = AuthorNames {
        first_name,
        last_name,
    };
    merge_validation_errors(&mut errors, names.validate());

    if errors.is_empty() {
        Ok(AuthorInput {
            first_name: names.first_name,
            last_name: names.last_name,
            date_of_birth,
            date_of_death,
        })
    } else {
        Err(errors)
    }
}

fn date_value(date: Option<NaiveDate>) -> Value {
    date.map(|d| Value::from(d.format("%Y-%m-%d").to_string()))
        .unwrap_or(Value::Null)
}

fn view_of(input: &AuthorInput) -> FormView {
    let mut view = FormView::default();
    view.fields
        .insert("first_name".into(), Value::from(input.first_name.as_str()));
    view.fields
        .insert("last_name".into(), Value::from(input.last_name.as_str()));
    view.fields
        .insert("date_of_birth".into(), date_value(input.date_of_birth));
    view.fields
        .insert("date_of_death".into(), date_value(input.date_of_death));
    view
}

/// Empty create form, seeded with the default death date
pub fn initial_create() -> FormView {
    let mut view = FormView::default();
    for field in AUTHOR_CREATE_FIELDS {
        view.fields.insert(field.to_string(), Value::Null);
    }
    view.fields
        .insert("date_of_death".into(), date_value(default_date_of_death()));
    view
}

/// Update form pre-populated from the stored author
pub fn initial_update(author: &Author) -> FormView {
    view_of(&AuthorInput::from(author))
}
