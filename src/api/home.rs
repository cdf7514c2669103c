//! Home page with catalog counts and a per-session visit counter

use axum::extract::State;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use uuid::Uuid;

use super::render::Page;
use crate::{error::AppResult, AppState};

/// Site home page
#[utoipa::path(
    get,
    path = "/",
    tag = "catalog",
    responses(
        (status = 200, description = "index.html with record counts and num_visits")
    )
)]
pub async fn index(State(state): State<AppState>, jar: CookieJar) -> AppResult<(CookieJar, Page)> {
    let cookie_name = state.config.session.cookie_name.clone();

    let (session_id, jar) = match jar.get(&cookie_name) {
        Some(cookie) => (cookie.value().to_string(), jar),
        None => {
            let session_id = Uuid::new_v4().simple().to_string();
            let cookie = Cookie::build((cookie_name, session_id.clone()))
                .path("/")
                .http_only(true)
                .build();
            (session_id, jar.add(cookie))
        }
    };

    let counts = state.services.catalog.counts().await?;
    let num_visits = state.services.sessions.record_visit(&session_id).await?;

    let page = Page::new("index.html")
        .with("num_books", counts.books)?
        .with("num_instances", counts.instances)?
        .with("num_instances_available", counts.instances_available)?
        .with("num_authors", counts.authors)?
        .with("num_visits", num_visits)?;

    Ok((jar, page))
}
