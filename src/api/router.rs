//! Application router

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::{access, accounts, authors, books, health, home, identify, loans, openapi};
use crate::{error::AppError, AppState};

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let public = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/accounts/login/", post(accounts::login))
        .route("/", get(home::index))
        // Books
        .route("/books/", get(books::list_books))
        .route("/book/:id", get(books::get_book))
        .route(
            "/book/create/",
            get(books::create_book_form).post(books::create_book),
        )
        .route(
            "/book/:id/update/",
            get(books::update_book_form).post(books::update_book),
        )
        .route(
            "/book/:id/delete/",
            get(books::delete_book_form).post(books::delete_book),
        )
        // Authors
        .route("/authors/", get(authors::list_authors))
        .route("/author/:id", get(authors::get_author))
        .route(
            "/author/create/",
            get(authors::create_author_form).post(authors::create_author),
        )
        .route(
            "/author/:id/update/",
            get(authors::update_author_form).post(authors::update_author),
        )
        .route(
            "/author/:id/delete/",
            get(authors::delete_author_form).post(authors::delete_author),
        );

    let members = Router::new()
        .route("/mybooks/", get(loans::my_borrowed))
        .route_layer(from_fn_with_state(state.clone(), access::require_login));

    let librarians = Router::new()
        .route("/allborrowedbooks/", get(loans::all_borrowed))
        .route("/book/:id/renew/", get(loans::renew_form).post(loans::renew))
        .route_layer(from_fn_with_state(
            state.clone(),
            access::require_can_mark_returned,
        ));

    Router::new()
        .merge(public)
        .merge(members)
        .merge(librarians)
        .merge(openapi::create_openapi_router())
        .fallback(not_found)
        .layer(from_fn_with_state(state.clone(), identify))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn not_found() -> AppError {
    AppError::NotFound("No route matches this URL".to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{
            header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
            Request, StatusCode,
        },
        response::Response,
    };
    use chrono::{Duration, Utc};
    use mockall::predicate::eq;
    use serde_json::Value;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::{
        config::AppConfig,
        error::AppError,
        models::{Author, Book, BookInstance, Genre, LoanStatus, UserClaims, CAN_MARK_RETURNED},
        repository::{CatalogCounts, MockCatalogStore, MockUserStore},
        services::{sessions::MemorySessionStore, Services},
    };

    fn app(store: MockCatalogStore) -> Router {
        let config = AppConfig::default();
        let services = Services::new(
            Arc::new(store),
            Arc::new(MockUserStore::new()),
            Arc::new(MemorySessionStore::new()),
            config.auth.clone(),
        );
        create_router(AppState {
            config: Arc::new(config),
            services: Arc::new(services),
        })
    }

    fn bearer(permissions: &[&str]) -> String {
        let now = Utc::now();
        let claims = UserClaims {
            sub: "reader".into(),
            user_id: 7,
            is_superuser: false,
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
            exp: (now + Duration::hours(1)).timestamp(),
            iat: now.timestamp(),
        };
        let token = claims
            .create_token(&AppConfig::default().auth.jwt_secret)
            .unwrap();
        format!("Bearer {}", token)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_form(uri: &str, body: String, auth: Option<String>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(auth) = auth {
            builder = builder.header(AUTHORIZATION, auth);
        }
        builder.body(Body::from(body)).unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn on_loan(id: Uuid) -> BookInstance {
        BookInstance {
            id,
            book_id: Some(1),
            imprint: "Vintage, 2004".into(),
            due_back: Some(Utc::now().date_naive()),
            status: LoanStatus::OnLoan,
            borrower_id: Some(7),
        }
    }

    #[tokio::test]
    async fn home_counts_visits_per_session_cookie() {
        let mut store = MockCatalogStore::new();
        store.expect_counts().returning(|| {
            Ok(CatalogCounts {
                books: 4,
                instances: 9,
                instances_available: 3,
                authors: 2,
            })
        });
        let app = app(store);

        let first = app.clone().oneshot(get("/")).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        let cookie = first.headers()[SET_COOKIE]
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string();
        assert!(cookie.starts_with("sessionid="));

        let body = json_body(first).await;
        assert_eq!(body["template"], "index.html");
        assert_eq!(body["context"]["num_books"], 4);
        assert_eq!(body["context"]["num_instances_available"], 3);
        assert_eq!(body["context"]["num_visits"], 0);

        let second = app
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(second.headers().get(SET_COOKIE).is_none());
        assert_eq!(json_body(second).await["context"]["num_visits"], 1);
    }

    #[tokio::test]
    async fn non_numeric_book_id_is_not_found() {
        let mut store = MockCatalogStore::new();
        store.expect_get_book_detail().never();

        let response = app(store).oneshot(get("/book/abc")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn book_list_carries_pagination_keys() {
        let mut store = MockCatalogStore::new();
        store.expect_count_books().returning(|| Ok(0));
        store.expect_list_books().returning(|_, _| Ok(vec![]));

        let response = app(store).oneshot(get("/books/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["template"], "book_list.html");
        assert_eq!(body["context"]["is_paginated"], false);
        assert_eq!(body["context"]["page_obj"]["number"], 1);
        assert_eq!(body["context"]["some_data"], "This is just some data");
    }

    #[tokio::test]
    async fn anonymous_my_books_redirects_to_login() {
        let mut store = MockCatalogStore::new();
        store.expect_count_on_loan().never();

        let response = app(store).oneshot(get("/mybooks/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers()[LOCATION],
            "/accounts/login/?next=%2Fmybooks%2F"
        );
    }

    #[tokio::test]
    async fn my_books_is_scoped_to_the_caller() {
        let mut store = MockCatalogStore::new();
        store
            .expect_count_on_loan()
            .with(eq(Some(7)))
            .returning(|_| Ok(0));
        store
            .expect_list_on_loan()
            .with(eq(Some(7)), eq(0), eq(10))
            .returning(|_, _, _| Ok(vec![]));

        let response = app(store)
            .oneshot(
                Request::builder()
                    .uri("/mybooks/")
                    .header(AUTHORIZATION, bearer(&[]))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn bad_token_is_unauthorized() {
        let response = app(MockCatalogStore::new())
            .oneshot(
                Request::builder()
                    .uri("/books/")
                    .header(AUTHORIZATION, "Bearer not-a-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn all_borrowed_needs_the_capability() {
        let mut store = MockCatalogStore::new();
        store.expect_count_on_loan().never();

        let app = app(store);

        let anonymous = app.clone().oneshot(get("/allborrowedbooks/")).await.unwrap();
        assert_eq!(anonymous.status(), StatusCode::FORBIDDEN);

        let member = app
            .oneshot(
                Request::builder()
                    .uri("/allborrowedbooks/")
                    .header(AUTHORIZATION, bearer(&[]))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(member.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn renewal_without_capability_is_forbidden_before_lookup() {
        let mut store = MockCatalogStore::new();
        store.expect_get_instance().never();

        let uri = format!("/book/{}/renew/", Uuid::new_v4());
        let response = app(store)
            .oneshot(post_form(&uri, "renewal_date=2030-01-01".into(), Some(bearer(&[]))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn renewal_get_proposes_three_weeks() {
        let id = Uuid::new_v4();
        let mut store = MockCatalogStore::new();
        store
            .expect_get_instance()
            .with(eq(id))
            .returning(|id| Ok(on_loan(id)));

        let response = app(store)
            .oneshot(
                Request::builder()
                    .uri(format!("/book/{}/renew/", id))
                    .header(AUTHORIZATION, bearer(&[CAN_MARK_RETURNED]))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        let proposed = (chrono::Local::now().date_naive() + Duration::days(21))
            .format("%Y-%m-%d")
            .to_string();
        assert_eq!(body["template"], "catalog/book_renew_librarian.html");
        assert_eq!(body["context"]["form"]["fields"]["renewal_date"], proposed);
        assert_eq!(body["context"]["bookinst"]["id"], id.to_string());
    }

    #[tokio::test]
    async fn accepted_renewal_redirects_to_all_borrowed() {
        let id = Uuid::new_v4();
        let date = chrono::Local::now().date_naive() + Duration::days(14);
        let mut store = MockCatalogStore::new();
        store.expect_get_instance().returning(|id| Ok(on_loan(id)));
        store
            .expect_set_due_back()
            .with(eq(id), eq(date))
            .times(1)
            .returning(|_, _| Ok(()));

        let response = app(store)
            .oneshot(post_form(
                &format!("/book/{}/renew/", id),
                format!("renewal_date={}", date.format("%Y-%m-%d")),
                Some(bearer(&[CAN_MARK_RETURNED])),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[LOCATION], "/allborrowedbooks/");
    }

    #[tokio::test]
    async fn past_renewal_date_re_renders_the_form() {
        let id = Uuid::new_v4();
        let date = chrono::Local::now().date_naive() - Duration::days(1);
        let mut store = MockCatalogStore::new();
        store.expect_get_instance().returning(|id| Ok(on_loan(id)));
        store.expect_set_due_back().never();

        let response = app(store)
            .oneshot(post_form(
                &format!("/book/{}/renew/", id),
                format!("renewal_date={}", date.format("%Y-%m-%d")),
                Some(bearer(&[CAN_MARK_RETURNED])),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(
            body["context"]["form"]["errors"]["renewal_date"][0],
            "Invalid date - already past."
        );
    }

    #[tokio::test]
    async fn renewal_of_non_uuid_token_is_not_found() {
        let mut store = MockCatalogStore::new();
        store.expect_get_instance().never();

        let response = app(store)
            .oneshot(
                Request::builder()
                    .uri("/book/the-hobbit/renew/")
                    .header(AUTHORIZATION, bearer(&[CAN_MARK_RETURNED]))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn author_create_redirects_to_detail() {
        let mut store = MockCatalogStore::new();
        store
            .expect_create_author()
            .withf(|input| input.first_name == "Ursula" && input.last_name == "Le Guin")
            .returning(|input| {
                Ok(Author {
                    id: 12,
                    first_name: input.first_name.clone(),
                    last_name: input.last_name.clone(),
                    date_of_birth: input.date_of_birth,
                    date_of_death: input.date_of_death,
                })
            });

        let response = app(store)
            .oneshot(post_form(
                "/author/create/",
                "first_name=Ursula&last_name=Le+Guin&date_of_birth=1929-10-21".into(),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[LOCATION], "/author/12");
    }

    #[tokio::test]
    async fn author_create_form_seeds_death_date() {
        let response = app(MockCatalogStore::new())
            .oneshot(get("/author/create/"))
            .await
            .unwrap();

        let body = json_body(response).await;
        assert_eq!(body["template"], "catalog/author_form.html");
        assert_eq!(body["context"]["form"]["fields"]["date_of_death"], "2016-12-10");
    }

    #[tokio::test]
    async fn deletes_redirect_to_lists() {
        let mut store = MockCatalogStore::new();
        store
            .expect_delete_author()
            .with(eq(3))
            .returning(|_| Ok(()));
        store.expect_delete_book().with(eq(5)).returning(|_| Ok(()));
        let app = app(store);

        let author = app
            .clone()
            .oneshot(post_form("/author/3/delete/", String::new(), None))
            .await
            .unwrap();
        assert_eq!(author.status(), StatusCode::FOUND);
        assert_eq!(author.headers()[LOCATION], "/authors/");

        let book = app
            .oneshot(post_form("/book/5/delete/", String::new(), None))
            .await
            .unwrap();
        assert_eq!(book.status(), StatusCode::FOUND);
        assert_eq!(book.headers()[LOCATION], "/books/");
    }

    #[tokio::test]
    async fn all_borrowed_lists_every_loan_for_librarians() {
        let mut store = MockCatalogStore::new();
        store
            .expect_count_on_loan()
            .with(eq(None))
            .returning(|_| Ok(1));
        store
            .expect_list_on_loan()
            .with(eq(None), eq(0), eq(10))
            .times(1)
            .returning(|_, _, _| Ok(vec![]));

        let response = app(store)
            .oneshot(
                Request::builder()
                    .uri("/allborrowedbooks/")
                    .header(AUTHORIZATION, bearer(&[CAN_MARK_RETURNED]))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["template"], "catalog/bookinstance_list_borrowed_all.html");
        assert!(body["context"]["bookinstance_list"].is_array());
    }

    #[tokio::test]
    async fn book_update_redirects_to_detail() {
        let mut store = MockCatalogStore::new();
        store.expect_get_book().with(eq(4)).returning(|id| {
            Ok(Book {
                id,
                title: "Old".into(),
                summary: "Old summary".into(),
                isbn: "1".into(),
                author_id: None,
            })
        });
        store.expect_all_authors().returning(|| Ok(vec![]));
        store
            .expect_list_genres()
            .returning(|| Ok(vec![Genre { id: 1, name: "Fantasy".into() }]));
        store
            .expect_update_book()
            .withf(|id, input| *id == 4 && input.title == "Dune")
            .times(1)
            .returning(|id, input| {
                Ok(Book {
                    id,
                    title: input.title.clone(),
                    summary: input.summary.clone(),
                    isbn: input.isbn.clone(),
                    author_id: input.author_id,
                })
            });

        let response = app(store)
            .oneshot(post_form(
                "/book/4/update/",
                "title=Dune&summary=Spice.&isbn=9780441013593&genre=1".into(),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[LOCATION], "/book/4");
    }

    #[tokio::test]
    async fn author_update_redirects_to_detail() {
        let author = |id| Author {
            id,
            first_name: "Ursula".into(),
            last_name: "Le Guin".into(),
            date_of_birth: None,
            date_of_death: None,
        };
        let mut store = MockCatalogStore::new();
        store.expect_get_author().with(eq(12)).returning(move |id| Ok(author(id)));
        store
            .expect_update_author()
            .withf(|id, input| *id == 12 && input.date_of_birth.is_some())
            .times(1)
            .returning(move |id, _| Ok(author(id)));

        let response = app(store)
            .oneshot(post_form(
                "/author/12/update/",
                "first_name=Ursula&last_name=Le+Guin&date_of_birth=10/21/29".into(),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[LOCATION], "/author/12");
    }

    #[tokio::test]
    async fn book_update_of_missing_record_is_not_found() {
        let mut store = MockCatalogStore::new();
        store
            .expect_get_book()
            .returning(|id| Err(AppError::NotFound(format!("Book with id {} not found", id))));
        store.expect_update_book().never();

        let response = app(store)
            .oneshot(post_form("/book/99/update/", "title=Dune".into(), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn deleting_missing_records_is_not_found() {
        let mut store = MockCatalogStore::new();
        store
            .expect_delete_author()
            .returning(|id| Err(AppError::NotFound(format!("Author with id {} not found", id))));
        store
            .expect_delete_book()
            .returning(|id| Err(AppError::NotFound(format!("Book with id {} not found", id))));
        let app = app(store);

        let author = app
            .clone()
            .oneshot(post_form("/author/99/delete/", String::new(), None))
            .await
            .unwrap();
        assert_eq!(author.status(), StatusCode::NOT_FOUND);

        let book = app
            .oneshot(post_form("/book/99/delete/", String::new(), None))
            .await
            .unwrap();
        assert_eq!(book.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn login_redirect_keeps_the_query_string() {
        let response = app(MockCatalogStore::new())
            .oneshot(get("/mybooks/?page=2"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers()[LOCATION],
            "/accounts/login/?next=%2Fmybooks%2F%3Fpage%3D2"
        );
    }
}
