//! Librarian renewal form: a single proposed due date

use chrono::{Duration, NaiveDate};
use serde_json::Value;

use super::{add_error, parse_date, FieldErrors, FormData, FormView, INVALID_DATE, REQUIRED};

pub const RENEWAL_DATE: &str = "renewal_date";
pub const HELP_TEXT: &str = "Enter a date between now and 4 weeks (default 3).";

pub const ALREADY_PAST: &str = "Invalid date - already past.";
pub const TOO_FAR_IN_FUTURE: &str = "Invalid date - too far in future.";

/// Default offered on the first visit
pub fn proposed_renewal_date(today: NaiveDate) -> NaiveDate {
    today + Duration::weeks(3)
}

/// Latest date a renewal may be pushed to
pub fn latest_renewal_date(today: NaiveDate) -> NaiveDate {
    today + Duration::weeks(4)
}

/// Business rules on an already-parsed date
pub fn clean_renewal_date(date: NaiveDate, today: NaiveDate) -> Result<NaiveDate, &'static str> {
    if date < today {
        return Err(ALREADY_PAST);
    }
    if date > latest_renewal_date(today) {
        return Err(TOO_FAR_IN_FUTURE);
    }
    Ok(date)
}

/// Bind a submission into a valid renewal date
pub fn bind(data: &FormData, today: NaiveDate) -> Result<NaiveDate, FieldErrors> {
    let mut errors = FieldErrors::new();

    let Some(raw) = data.get(RENEWAL_DATE) else {
        add_error(&mut errors, RENEWAL_DATE, REQUIRED);
        return Err(errors);
    };

    let Some(date) = parse_date(raw) else {
        add_error(&mut errors, RENEWAL_DATE, INVALID_DATE);
        return Err(errors);
    };

    clean_renewal_date(date, today).map_err(|message| {
        add_error(&mut errors, RENEWAL_DATE, message);
        errors
    })
}

/// Unbound form pre-filled with the proposal
pub fn initial(today: NaiveDate) -> FormView {
    let mut view = FormView {
        help_text: Some(HELP_TEXT),
        ..FormView::default()
    };
    view.fields.insert(
        RENEWAL_DATE.to_string(),
        Value::from(proposed_renewal_date(today).format("%Y-%m-%d").to_string()),
    );
    view
}

/// Bound form carrying the submitted value and its errors
pub fn rejected(data: &FormData, errors: FieldErrors) -> FormView {
    FormView {
        help_text: Some(HELP_TEXT),
        ..FormView::resubmitted(data, &[RENEWAL_DATE], errors)
    }
}
