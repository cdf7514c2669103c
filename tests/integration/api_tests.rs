//! End-to-end tests against a running server
//!
//! Needs a migrated database and a provisioned librarian account holding
//! `catalog.can_mark_returned` (see `catalog-server hash-password`).

use reqwest::{redirect::Policy, Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080";

fn librarian() -> (String, String) {
    (
        std::env::var("CATALOG_TEST_USER").unwrap_or_else(|_| "librarian".to_string()),
        std::env::var("CATALOG_TEST_PASSWORD").unwrap_or_else(|_| "librarian".to_string()),
    )
}

/// Client that reports redirects instead of following them
fn client() -> Client {
    Client::builder()
        .redirect(Policy::none())
        .build()
        .expect("Failed to build client")
}

async fn get_auth_token(client: &Client) -> String {
    let (username, password) = librarian();
    let response = client
        .post(format!("{}/accounts/login/", BASE_URL))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let response = client()
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_login() {
    let (username, password) = librarian();
    let response = client()
        .post(format!("{}/accounts/login/", BASE_URL))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["token_type"], "Bearer");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let response = client()
        .post(format!("{}/accounts/login/", BASE_URL))
        .json(&json!({ "username": "librarian", "password": "wrong" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_home_counts_visits() {
    let client = client();

    let first = client
        .get(format!("{}/", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    let cookie = first
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .expect("No session cookie")
        .to_string();
    let body: Value = first.json().await.expect("Failed to parse response");
    assert_eq!(body["context"]["num_visits"], 0);

    let second: Value = client
        .get(format!("{}/", BASE_URL))
        .header("cookie", cookie)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(second["context"]["num_visits"], 1);
}

#[tokio::test]
#[ignore]
async fn test_book_list() {
    let response = client()
        .get(format!("{}/books/", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["template"], "book_list.html");
    assert!(body["context"]["book_list"].as_array().map(|l| l.len() <= 10).unwrap_or(false));
}

#[tokio::test]
#[ignore]
async fn test_page_out_of_range() {
    let response = client()
        .get(format!("{}/authors/?page=9999", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_my_books_requires_login() {
    let response = client()
        .get(format!("{}/mybooks/", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers()["location"],
        "/accounts/login/?next=%2Fmybooks%2F"
    );
}

#[tokio::test]
#[ignore]
async fn test_all_borrowed_forbidden_for_anonymous() {
    let response = client()
        .get(format!("{}/allborrowedbooks/", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore]
async fn test_all_borrowed_for_librarian() {
    let client = client();
    let token = get_auth_token(&client).await;

    let response = client
        .get(format!("{}/allborrowedbooks/", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["template"], "catalog/bookinstance_list_borrowed_all.html");
}

#[tokio::test]
#[ignore]
async fn test_author_lifecycle() {
    let client = client();

    let created = client
        .post(format!("{}/author/create/", BASE_URL))
        .form(&[("first_name", "Test"), ("last_name", "Author")])
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(created.status(), StatusCode::FOUND);
    let location = created.headers()["location"]
        .to_str()
        .expect("Bad location")
        .to_string();
    assert!(location.starts_with("/author/"));

    let deleted = client
        .post(format!("{}{}/delete/", BASE_URL, location))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(deleted.status(), StatusCode::FOUND);
    assert_eq!(deleted.headers()["location"], "/authors/");
}
