//! API integration tests
//!
//! Require a running server with a migrated database.

use reqwest::{multipart, Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api";
const UPLOADS_URL: &str = "http://localhost:8080/uploads";

const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];

struct TestUser {
    token: String,
    email: String,
}

fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.com", prefix, uuid::Uuid::new_v4())
}

/// Helper to register a fresh user and get its token
async fn signup(client: &Client, name: &str, latitude: Option<f64>, longitude: Option<f64>) -> TestUser {
    let email = unique_email(name);
    let request = json!({
        "name": name,
        "email": email,
        "password": "secret123",
        "latitude": latitude,
        "longitude": longitude,
    });
    let form = multipart::Form::new().text("signUpRequest", request.to_string());

    let response = client
        .post(format!("{}/auth/signup", BASE_URL))
        .multipart(form)
        .send()
        .await
        .expect("Failed to send signup request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = response.json().await.expect("Failed to parse signup response");
    TestUser {
        token: body["token"].as_str().expect("No token in response").to_string(),
        email,
    }
}

async fn create_book(client: &Client, owner: &TestUser, title: &str) -> Value {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(&owner.token)
        .json(&json!({
            "title": title,
            "author": "Frank Herbert",
            "genre": "Science fiction",
            "language": "English",
            "bookCondition": "GOOD",
            "latitude": 51.5074,
            "longitude": -0.1278,
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.expect("Failed to parse response")
}

async fn request_book(client: &Client, user: &TestUser, book_id: i64) -> reqwest::Response {
    client
        .post(format!("{}/swap-requests/book/{}", BASE_URL, book_id))
        .bearer_auth(&user.token)
        .send()
        .await
        .expect("Failed to send request")
}

async fn decide(client: &Client, user: &TestUser, request_id: i64, status: &str) -> reqwest::Response {
    client
        .put(format!("{}/swap-requests/{}", BASE_URL, request_id))
        .bearer_auth(&user.token)
        .json(&json!({ "status": status }))
        .send()
        .await
        .expect("Failed to send request")
}

async fn get_json(client: &Client, user: &TestUser, path: &str) -> Value {
    let response = client
        .get(format!("{}{}", BASE_URL, path))
        .bearer_auth(&user.token)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    response.json().await.expect("Failed to parse response")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
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
async fn test_readiness_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
#[ignore]
async fn test_login() {
    let client = Client::new();
    let user = signup(&client, "alice", None, None).await;

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "email": user.email, "password": "secret123" }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["name"], "alice");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();
    let user = signup(&client, "bob", None, None).await;

    for (email, password) in [(user.email.as_str(), "wrong"), ("nobody@example.com", "secret123")] {
        let response = client
            .post(format!("{}/auth/login", BASE_URL))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
#[ignore]
async fn test_duplicate_signup_is_conflict() {
    let client = Client::new();
    let user = signup(&client, "carol", None, None).await;

    let request = json!({ "name": "carol", "email": user.email.to_uppercase(), "password": "secret123" });
    let form = multipart::Form::new().text("signUpRequest", request.to_string());
    let response = client
        .post(format!("{}/auth/signup", BASE_URL))
        .multipart(form)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore]
async fn test_signup_validation() {
    let client = Client::new();
    let request = json!({ "name": "", "email": "not-an-email", "password": "123" });
    let form = multipart::Form::new().text("signUpRequest", request.to_string());

    let response = client
        .post(format!("{}/auth/signup", BASE_URL))
        .multipart(form)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn test_requires_token() {
    let client = Client::new();

    for path in ["/books/explore", "/books/my-books", "/notifications", "/users/profile"] {
        let response = client
            .get(format!("{}{}", BASE_URL, path))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", path);
    }

    let response = client
        .get(format!("{}/books/explore", BASE_URL))
        .bearer_auth("not-a-token")
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_profile_round_trip() {
    let client = Client::new();
    let user = signup(&client, "dave", None, None).await;

    let profile = get_json(&client, &user, "/users/profile").await;
    assert_eq!(profile["name"], "dave");
    assert_eq!(profile["locationName"], "Location not set");
    assert!(profile["profilePictureUrl"].is_null());

    let response = client
        .put(format!("{}/users/profile", BASE_URL))
        .bearer_auth(&user.token)
        .json(&json!({ "location": "Lyon" }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let profile: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(profile["name"], "dave");
    assert_eq!(profile["locationName"], "Lyon");
}

#[tokio::test]
#[ignore]
async fn test_book_crud_and_ownership() {
    let client = Client::new();
    let owner = signup(&client, "erin", Some(48.8566), Some(2.3522)).await;
    let other = signup(&client, "frank", None, None).await;

    let book = create_book(&client, &owner, "Dune").await;
    let id = book["id"].as_i64().unwrap();
    assert_eq!(book["status"], "AVAILABLE");
    assert!((book["distanceKm"].as_f64().unwrap() - 343.5).abs() < 1.0);

    let mine = get_json(&client, &owner, "/books/my-books").await;
    assert_eq!(mine[0]["id"], id);

    let fetched = get_json(&client, &other, &format!("/books/{}", id)).await;
    assert_eq!(fetched["title"], "Dune");
    assert!(fetched["distanceKm"].is_null());

    let update = json!({
        "title": "Dune Messiah",
        "author": "Frank Herbert",
        "genre": "Science fiction",
        "language": "English",
        "bookCondition": "FAIR",
    });

    let response = client
        .put(format!("{}/books/{}", BASE_URL, id))
        .bearer_auth(&other.token)
        .json(&update)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client
        .put(format!("{}/books/{}", BASE_URL, id))
        .bearer_auth(&owner.token)
        .json(&update)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let updated: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(updated["title"], "Dune Messiah");
    assert_eq!(updated["status"], "AVAILABLE");

    let response = client
        .delete(format!("{}/books/{}", BASE_URL, id))
        .bearer_auth(&other.token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client
        .delete(format!("{}/books/{}", BASE_URL, id))
        .bearer_auth(&owner.token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client
        .get(format!("{}/books/{}", BASE_URL, id))
        .bearer_auth(&owner.token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_swap_accept_flow() {
    let client = Client::new();
    let owner = signup(&client, "grace", None, None).await;
    let requester = signup(&client, "heidi", None, None).await;
    let latecomer = signup(&client, "ivan", None, None).await;

    let book = create_book(&client, &owner, "Neuromancer").await;
    let book_id = book["id"].as_i64().unwrap();

    let explore = get_json(&client, &requester, "/books/explore").await;
    assert!(explore.as_array().unwrap().iter().any(|b| b["id"] == book_id));
    let own_explore = get_json(&client, &owner, "/books/explore").await;
    assert!(!own_explore.as_array().unwrap().iter().any(|b| b["id"] == book_id));

    // own book
    let response = request_book(&client, &owner, book_id).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = request_book(&client, &requester, book_id).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let request: Value = response.json().await.expect("Failed to parse response");
    let request_id = request["id"].as_i64().unwrap();
    assert_eq!(request["status"], "PENDING");
    assert_eq!(request["book"]["id"], book_id);

    let response = request_book(&client, &requester, book_id).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let incoming = get_json(&client, &owner, "/swap-requests/incoming").await;
    assert_eq!(incoming[0]["id"], request_id);
    let outgoing = get_json(&client, &requester, "/swap-requests/outgoing").await;
    assert_eq!(outgoing[0]["id"], request_id);

    let notifications = get_json(&client, &owner, "/notifications").await;
    assert_eq!(notifications[0]["type"], "NEW_REQUEST");
    assert_eq!(notifications[0]["relatedSwapRequestId"], request_id);

    let response = decide(&client, &requester, request_id, "ACCEPTED").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = decide(&client, &owner, request_id, "PENDING").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = decide(&client, &owner, request_id, "ACCEPTED").await;
    assert!(response.status().is_success());
    let accepted: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(accepted["status"], "ACCEPTED");
    assert_eq!(accepted["book"]["status"], "LENT_OUT");

    let response = decide(&client, &owner, request_id, "DECLINED").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = request_book(&client, &latecomer, book_id).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let notifications = get_json(&client, &requester, "/notifications").await;
    assert_eq!(notifications[0]["type"], "REQUEST_ACCEPTED");
}

#[tokio::test]
#[ignore]
async fn test_swap_decline_keeps_book_available() {
    let client = Client::new();
    let owner = signup(&client, "judy", None, None).await;
    let requester = signup(&client, "mallory", None, None).await;

    let book = create_book(&client, &owner, "Hyperion").await;
    let book_id = book["id"].as_i64().unwrap();

    let response = request_book(&client, &requester, book_id).await;
    let request: Value = response.json().await.expect("Failed to parse response");
    let request_id = request["id"].as_i64().unwrap();

    let response = decide(&client, &owner, request_id, "DECLINED").await;
    assert!(response.status().is_success());
    let declined: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(declined["status"], "DECLINED");
    assert_eq!(declined["book"]["status"], "AVAILABLE");

    let notifications = get_json(&client, &requester, "/notifications").await;
    assert_eq!(notifications[0]["type"], "REQUEST_DECLINED");

    // a new request is allowed once the previous one is decided
    let response = request_book(&client, &requester, book_id).await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
#[ignore]
async fn test_notifications_read_state() {
    let client = Client::new();
    let owner = signup(&client, "niaj", None, None).await;
    let requester = signup(&client, "olivia", None, None).await;

    for title in ["Solaris", "Ubik"] {
        let book = create_book(&client, &owner, title).await;
        let response = request_book(&client, &requester, book["id"].as_i64().unwrap()).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let unread = get_json(&client, &owner, "/notifications/unread-count").await;
    assert_eq!(unread["count"], 2);

    let notifications = get_json(&client, &owner, "/notifications").await;
    let id = notifications[0]["id"].as_i64().unwrap();

    let response = client
        .put(format!("{}/notifications/{}/read", BASE_URL, id))
        .bearer_auth(&requester.token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let mut read_at = Vec::new();
    for _ in 0..2 {
        let response = client
            .put(format!("{}/notifications/{}/read", BASE_URL, id))
            .bearer_auth(&owner.token)
            .send()
            .await
            .expect("Failed to send request");
        assert!(response.status().is_success());
        let body: Value = response.json().await.expect("Failed to parse response");
        assert_eq!(body["isRead"], true);
        read_at.push(body["readAt"].clone());
    }
    assert_eq!(read_at[0], read_at[1]);

    let response = client
        .put(format!("{}/notifications/mark-all-read", BASE_URL))
        .bearer_auth(&owner.token)
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["updated"], 1);

    let unread = get_json(&client, &owner, "/notifications/unread-count").await;
    assert_eq!(unread["count"], 0);
}

#[tokio::test]
#[ignore]
async fn test_book_photo_upload() {
    let client = Client::new();
    let owner = signup(&client, "peggy", None, None).await;

    let text = multipart::Part::bytes(b"hello".to_vec())
        .file_name("notes.txt")
        .mime_str("text/plain")
        .unwrap();
    let response = client
        .post(format!("{}/files/upload/book-photo", BASE_URL))
        .bearer_auth(&owner.token)
        .multipart(multipart::Form::new().part("photo", text))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let png = multipart::Part::bytes(PNG_BYTES.to_vec())
        .file_name("my cover.png")
        .mime_str("image/png")
        .unwrap();
    let response = client
        .post(format!("{}/files/upload/book-photo", BASE_URL))
        .bearer_auth(&owner.token)
        .multipart(multipart::Form::new().part("photo", png))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    let filename = body["filename"].as_str().unwrap().to_string();
    assert!(filename.ends_with("_my_cover.png"));

    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(&owner.token)
        .json(&json!({
            "title": "Foundation",
            "author": "Isaac Asimov",
            "genre": "Science fiction",
            "language": "English",
            "bookCondition": "LIKE_NEW",
            "photoFilename": filename,
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let book: Value = response.json().await.expect("Failed to parse response");
    let photo_url = book["photoUrl"].as_str().unwrap();
    assert!(photo_url.ends_with(&format!("/uploads/book-pics/{}", filename)));

    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(&owner.token)
        .json(&json!({
            "title": "Foundation",
            "author": "Isaac Asimov",
            "genre": "Science fiction",
            "language": "English",
            "bookCondition": "LIKE_NEW",
            "photoFilename": "../../etc/passwd",
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

async fn upload_photo(client: &Client, user: &TestUser, name: &str, data: &[u8]) -> reqwest::Response {
    let part = multipart::Part::bytes(data.to_vec())
        .file_name(name.to_string())
        .mime_str("image/png")
        .unwrap();
    client
        .post(format!("{}/files/upload/book-photo", BASE_URL))
        .bearer_auth(&user.token)
        .multipart(multipart::Form::new().part("photo", part))
        .send()
        .await
        .expect("Failed to send request")
}

async fn post_book_with_photo(client: &Client, user: &TestUser, photo: &str) -> reqwest::Response {
    client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(&user.token)
        .json(&json!({
            "title": "Hyperion",
            "author": "Dan Simmons",
            "genre": "Science fiction",
            "language": "English",
            "bookCondition": "GOOD",
            "photoFilename": photo,
        }))
        .send()
        .await
        .expect("Failed to send request")
}

#[tokio::test]
#[ignore]
async fn test_html_upload_is_not_served_as_html() {
    let client = Client::new();
    let user = signup(&client, "mallory", None, None).await;

    let page = b"<html><script>alert(document.cookie)</script></html>";
    let response = upload_photo(&client, &user, "evil.html", page).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = upload_photo(&client, &user, "evil.html", PNG_BYTES).await;
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    let filename = body["filename"].as_str().unwrap();
    assert!(filename.ends_with("_evil.png"));

    let served = client
        .get(format!("{}/book-pics/{}", UPLOADS_URL, filename))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(served.status(), StatusCode::OK);
    assert_eq!(served.headers()["content-type"], "image/png");
}

#[tokio::test]
#[ignore]
async fn test_photos_of_other_users_cannot_be_attached() {
    let client = Client::new();
    let owner = signup(&client, "trent", None, None).await;
    let other = signup(&client, "eve", None, None).await;

    let response = upload_photo(&client, &owner, "cover.png", PNG_BYTES).await;
    let body: Value = response.json().await.expect("Failed to parse response");
    let filename = body["filename"].as_str().unwrap().to_string();

    let response = post_book_with_photo(&client, &other, &filename).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let error: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(error["code"], 3);

    // the owner may reuse the photo, and deleting one listing keeps the file
    let first: Value = post_book_with_photo(&client, &owner, &filename)
        .await
        .json()
        .await
        .expect("Failed to parse response");
    let second = post_book_with_photo(&client, &owner, &filename).await;
    assert_eq!(second.status(), StatusCode::CREATED);

    let response = client
        .delete(format!("{}/books/{}", BASE_URL, first["id"]))
        .bearer_auth(&owner.token)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let served = client
        .get(format!("{}/book-pics/{}", UPLOADS_URL, filename))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(served.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore]
async fn test_blank_fields_are_rejected() {
    let client = Client::new();
    let user = signup(&client, "walter", None, None).await;

    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(&user.token)
        .json(&json!({
            "title": "   ",
            "author": "Frank Herbert",
            "genre": "Science fiction",
            "language": "English",
            "bookCondition": "GOOD",
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .put(format!("{}/users/profile", BASE_URL))
        .bearer_auth(&user.token)
        .json(&json!({ "name": " " }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn test_bad_json_bodies_use_error_format() {
    let client = Client::new();
    let owner = signup(&client, "oscar", None, None).await;
    let requester = signup(&client, "victor", None, None).await;

    let book = create_book(&client, &owner, "Solaris").await;
    let request: Value = request_book(&client, &requester, book["id"].as_i64().unwrap())
        .await
        .json()
        .await
        .expect("Failed to parse response");

    let response = decide(&client, &owner, request["id"].as_i64().unwrap(), "FOO").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(error["code"], 6);
    assert!(error["message"].is_string());

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(error["code"], 6);
}
