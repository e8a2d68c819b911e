//! API integration tests
//!
//! These run against a live server with a seeded database:
//! `cargo test -- --ignored`

use reqwest::Client;
use serde_json::{json, Value};
use uuid::Uuid;

const BASE_URL: &str = "http://localhost:8080/api";

const LIBRARIAN_EMAIL: &str = "librarian@library.com";
const LIBRARIAN_PASSWORD: &str = "Librarian123!";

/// Client with a cookie store; tokens travel as HTTP-only cookies
fn cookie_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to build client")
}

/// Log in as the seeded librarian; the client keeps the token cookies
async fn login_librarian(client: &Client) -> Value {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": LIBRARIAN_EMAIL,
            "password": LIBRARIAN_PASSWORD
        }))
        .send()
        .await
        .expect("Failed to send login request");

    assert!(response.status().is_success());
    response.json().await.expect("Failed to parse login response")
}

/// Register a fresh member account; the client keeps the token cookies
async fn register_member(client: &Client) -> Value {
    let email = format!("member-{}@example.com", Uuid::new_v4());
    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "email": email,
            "password": "Passw0rd"
        }))
        .send()
        .await
        .expect("Failed to send register request");

    assert!(response.status().is_success());
    response.json().await.expect("Failed to parse register response")
}

#[tokio::test]
#[ignore]
async fn test_health_check() {
    let client = Client::new();

    let response = client
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
async fn test_login_librarian() {
    let client = cookie_client();
    let body = login_librarian(&client).await;

    assert_eq!(body["email"], LIBRARIAN_EMAIL);
    assert_eq!(body["role"], "Librarian");
    // Tokens are cookie-only, never in the body
    assert!(body.get("access_token").is_none());
    assert!(body.get("refresh_token").is_none());
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": LIBRARIAN_EMAIL,
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_register_rejects_weak_password() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "email": format!("weak-{}@example.com", Uuid::new_v4()),
            "password": "abc"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.expect("Failed to parse response");
    let message = body["message"].as_str().expect("No message");
    assert!(message.contains("6 characters"));
    assert!(message.contains("uppercase"));
    assert!(message.contains("digit"));
}

#[tokio::test]
#[ignore]
async fn test_register_assigns_member_role() {
    let client = cookie_client();
    let body = register_member(&client).await;

    assert_eq!(body["role"], "Member");
    assert!(body["user_id"].is_string());
}

#[tokio::test]
#[ignore]
async fn test_register_duplicate_email_is_validation_error() {
    let client = Client::new();
    let email = format!("dup-{}@example.com", Uuid::new_v4());
    let payload = json!({
        "email": email,
        "password": "Passw0rd"
    });

    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&payload)
        .send()
        .await
        .expect("Failed to send first register request");
    assert!(response.status().is_success());

    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&payload)
        .send()
        .await
        .expect("Failed to send second register request");

    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.expect("Failed to parse response");
    let message = body["message"].as_str().expect("No message");
    assert!(message.contains("already taken"));
}

#[tokio::test]
#[ignore]
async fn test_refresh_reissues_for_same_subject() {
    let client = cookie_client();
    let login = login_librarian(&client).await;

    let response = client
        .post(format!("{}/auth/refresh", BASE_URL))
        .send()
        .await
        .expect("Failed to send refresh request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["user_id"], login["user_id"]);
    assert_eq!(body["email"], LIBRARIAN_EMAIL);
}

#[tokio::test]
#[ignore]
async fn test_refresh_without_cookies_is_unauthorized() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/refresh", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_unauthenticated_book_access() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_member_cannot_create_book() {
    let client = cookie_client();
    register_member(&client).await;

    let response = client
        .post(format!("{}/books", BASE_URL))
        .json(&json!({
            "title": "Forbidden",
            "author": "Nobody",
            "isbn": "000",
            "published_year": 2024,
            "available_copies": 1
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
}

/// Full borrowing lifecycle: one copy, borrow, conflict, return, restored.
#[tokio::test]
#[ignore]
async fn test_borrowing_inventory_cycle() {
    let librarian = cookie_client();
    login_librarian(&librarian).await;

    // Book with a single copy
    let response = librarian
        .post(format!("{}/books", BASE_URL))
        .json(&json!({
            "title": "Single Copy",
            "author": "Test Author",
            "isbn": format!("cycle-{}", Uuid::new_v4()),
            "published_year": 2024,
            "available_copies": 1
        }))
        .send()
        .await
        .expect("Failed to create book");
    assert_eq!(response.status(), 201);
    let book: Value = response.json().await.expect("Failed to parse book");
    let book_id = book["id"].as_i64().expect("No book id");

    let member = cookie_client();
    register_member(&member).await;

    // Borrow consumes the copy
    let response = member
        .post(format!("{}/borrowings", BASE_URL))
        .json(&json!({
            "book_id": book_id,
            "due_date": "2030-01-01T00:00:00Z"
        }))
        .send()
        .await
        .expect("Failed to create borrowing");
    assert_eq!(response.status(), 201);
    let borrowing: Value = response.json().await.expect("Failed to parse borrowing");
    let borrowing_id = borrowing["id"].as_i64().expect("No borrowing id");
    assert_eq!(borrowing["status"], "borrowed");
    assert_eq!(borrowing["book_title"], "Single Copy");

    let response = member
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to get book");
    let book: Value = response.json().await.expect("Failed to parse book");
    assert_eq!(book["available_copies"], 0);

    // No copies left: second borrow conflicts
    let response = member
        .post(format!("{}/borrowings", BASE_URL))
        .json(&json!({
            "book_id": book_id,
            "due_date": "2030-01-01T00:00:00Z"
        }))
        .send()
        .await
        .expect("Failed to send second borrowing");
    assert_eq!(response.status(), 409);

    // Return restores the copy
    let response = member
        .put(format!("{}/borrowings/{}", BASE_URL, borrowing_id))
        .json(&json!({
            "return_date": "2029-06-01T00:00:00Z",
            "status": "returned"
        }))
        .send()
        .await
        .expect("Failed to return borrowing");
    assert!(response.status().is_success());
    let returned: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(returned["status"], "returned");

    let response = member
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to get book");
    let book: Value = response.json().await.expect("Failed to parse book");
    assert_eq!(book["available_copies"], 1);

    // Re-marking as returned must not credit another copy
    let response = member
        .put(format!("{}/borrowings/{}", BASE_URL, borrowing_id))
        .json(&json!({ "status": "returned" }))
        .send()
        .await
        .expect("Failed to re-return borrowing");
    assert!(response.status().is_success());

    let response = member
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to get book");
    let book: Value = response.json().await.expect("Failed to parse book");
    assert_eq!(book["available_copies"], 1);

    // Cleanup
    let response = member
        .delete(format!("{}/borrowings/{}", BASE_URL, borrowing_id))
        .send()
        .await
        .expect("Failed to delete borrowing");
    assert_eq!(response.status(), 204);

    let response = librarian
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to delete book");
    assert_eq!(response.status(), 204);
}

#[tokio::test]
#[ignore]
async fn test_member_cannot_read_others_borrowings() {
    let librarian = cookie_client();
    login_librarian(&librarian).await;

    let response = librarian
        .post(format!("{}/books", BASE_URL))
        .json(&json!({
            "title": "Private Loan",
            "author": "Test Author",
            "isbn": format!("own-{}", Uuid::new_v4()),
            "published_year": 2024,
            "available_copies": 2
        }))
        .send()
        .await
        .expect("Failed to create book");
    let book: Value = response.json().await.expect("Failed to parse book");
    let book_id = book["id"].as_i64().expect("No book id");

    let owner = cookie_client();
    register_member(&owner).await;

    let response = owner
        .post(format!("{}/borrowings", BASE_URL))
        .json(&json!({
            "book_id": book_id,
            "due_date": "2030-01-01T00:00:00Z"
        }))
        .send()
        .await
        .expect("Failed to create borrowing");
    let borrowing: Value = response.json().await.expect("Failed to parse borrowing");
    let borrowing_id = borrowing["id"].as_i64().expect("No borrowing id");

    let stranger = cookie_client();
    register_member(&stranger).await;

    let response = stranger
        .get(format!("{}/borrowings/{}", BASE_URL, borrowing_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 403);

    // Librarians can read any borrowing
    let response = librarian
        .get(format!("{}/borrowings/{}", BASE_URL, borrowing_id))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    // Cleanup
    let _ = owner
        .delete(format!("{}/borrowings/{}", BASE_URL, borrowing_id))
        .send()
        .await;
    let _ = librarian
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await;
}
