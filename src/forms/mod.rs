//! HTML form binding and validation
//!
//! Submissions arrive as urlencoded key/value pairs. A form binds those pairs
//! into a typed input or a map of field errors; a [`FormView`] is what the
//! page context carries back to the renderer either way.

pub mod author;
pub mod book;
pub mod renewal;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use validator::ValidationErrors;

/// Key under which errors not tied to a single field are reported
pub const NON_FIELD_ERRORS: &str = "__all__";

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_DATE: &str = "Enter a valid date.";
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// Accepted date input formats, tried in order: pattern, separator, and the
/// position and digit count of the year field
const DATE_INPUT_FORMATS: &[(&str, char, usize, usize)] = &[
    ("%Y-%m-%d", '-', 0, 4),
    ("%m/%d/%Y", '/', 2, 4),
    ("%m/%d/%y", '/', 2, 2),
];

/// Field name -> messages
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Raw urlencoded submission; keys may repeat (multi-select fields)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    pairs: Vec<(String, String)>,
}

impl FormData {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    /// First value of `name`, trimmed; `None` when absent or blank
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
    }

    /// Every non-blank value of `name`
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
            .collect()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(key, _)| key.as_str())
    }
}

/// Bound or unbound form as handed to the renderer
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FormView {
    pub fields: BTreeMap<String, Value>,
    pub errors: FieldErrors,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_text: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Value>,
}

impl FormView {
    /// Echo a submission back, restricted to `allowed`
    pub fn resubmitted(data: &FormData, allowed: &[&str], errors: FieldErrors) -> Self {
        let fields = allowed
            .iter()
            .map(|name| {
                let values = data.get_all(name);
                let value = match values.len() {
                    0 => Value::Null,
                    1 => Value::from(values[0]),
                    _ => Value::from(values),
                };
                (name.to_string(), value)
            })
            .collect();

        Self {
            fields,
            errors,
            ..Self::default()
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

pub fn add_error(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.into());
}

/// Reject submitted fields outside the allow-list
pub fn check_allowed(data: &FormData, allowed: &[&str], errors: &mut FieldErrors) {
    let mut unexpected: Vec<&str> = data.keys().filter(|key| !allowed.contains(key)).collect();
    unexpected.sort_unstable();
    unexpected.dedup();

    for key in unexpected {
        add_error(errors, NON_FIELD_ERRORS, format!("Unexpected field: {}", key));
    }
}

/// Required text field
pub fn required_text(data: &FormData, field: &str, errors: &mut FieldErrors) -> String {
    match data.get(field) {
        Some(value) => value.to_string(),
        None => {
            add_error(errors, field, REQUIRED);
            String::new()
        }
    }
}

/// Parse a date in one of the accepted input formats.
///
/// chrono's `%Y` takes one to four digits, so the year field width is
/// checked before a pattern is tried: `12/10/16` is a two-digit year.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_INPUT_FORMATS
        .iter()
        .filter(|(_, separator, index, width)| year_width(raw, *separator, *index) == Some(*width))
        .find_map(|(format, ..)| NaiveDate::parse_from_str(raw, format).ok())
}

fn year_width(raw: &str, separator: char, index: usize) -> Option<usize> {
    let parts: Vec<&str> = raw.split(separator).collect();
    if parts.len() != 3 {
        return None;
    }
    let year = parts[index];
    year.bytes().all(|b| b.is_ascii_digit()).then_some(year.len())
}

/// Optional date field; blank is `None`, garbage is an error
pub fn optional_date(data: &FormData, field: &str, errors: &mut FieldErrors) -> Option<NaiveDate> {
    let raw = data.get(field)?;
    let parsed = parse_date(raw);
    if parsed.is_none() {
        add_error(errors, field, INVALID_DATE);
    }
    parsed
}

/// Fold `validator` errors into the field error map
pub fn merge_validation_errors(errors: &mut FieldErrors, result: Result<(), ValidationErrors>) {
    let Err(validation) = result else {
        return;
    };

    for (field, field_errors) in validation.field_errors() {
        for error in field_errors.iter() {
            let message = error
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Invalid value ({})", error.code));
            add_error(errors, &field.to_string(), message);
        }
    }
}
