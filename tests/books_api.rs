use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use shelf_app::books::{routes, store::MemoryBookStore};
use tower::ServiceExt;

fn app() -> Router {
    routes::router(Arc::new(MemoryBookStore::new()))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn book(isbn: &str, genre: &str) -> Value {
    json!({
        "title": "  A Brief History of Time ",
        "author": "Stephen Hawking",
        "genre": genre,
        "isbn": isbn,
        "copies": 4
    })
}

async fn create(app: &Router, body: Value) -> Value {
    let (status, response) = send(app, "POST", "/", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{response}");
    response["book"].clone()
}

#[tokio::test]
async fn create_returns_201_with_normalised_book() {
    let app = app();

    let (status, body) = send(&app, "POST", "/", Some(book("0553380168", "science"))).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["message"], json!("Book created successfully"));
    assert_eq!(body["book"]["title"], json!("A Brief History of Time"));
    assert_eq!(body["book"]["genre"], json!("SCIENCE"));
    assert_eq!(body["book"]["description"], json!(""));
    assert_eq!(body["book"]["available"], json!(true));
    assert!(body["book"]["id"].is_string());
    assert!(body["book"]["createdAt"].is_string());
    assert_eq!(body["book"]["createdAt"], body["book"]["updatedAt"]);
}

#[tokio::test]
async fn create_rejects_bad_isbn_length() {
    let app = app();

    for isbn in ["123456789", "12345678901", "12345678901234"] {
        let (status, body) = send(&app, "POST", "/", Some(book(isbn, "SCIENCE"))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "isbn {isbn}");
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["message"], json!("Validation failed"));
        assert_eq!(body["error"]["code"], json!("validation_error"));
        assert_eq!(body["error"]["details"][0]["field"], json!("isbn"));
        assert_eq!(
            body["error"]["details"][0]["message"],
            json!("ISBN must be exactly 10 or 13 characters long")
        );
    }
}

#[tokio::test]
async fn create_rejects_unknown_genre() {
    let (status, body) = send(&app(), "POST", "/", Some(book("0553380168", "POETRY"))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"][0]["field"], json!("genre"));
    assert_eq!(
        body["error"]["details"][0]["message"],
        json!("Genre must be one of the predefined values")
    );
}

#[tokio::test]
async fn create_rejects_negative_copies() {
    let mut body = book("0553380168", "SCIENCE");
    body["copies"] = json!(-1);

    let (status, body) = send(&app(), "POST", "/", Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"][0]["field"], json!("copies"));
}

#[tokio::test]
async fn create_rejects_missing_fields_and_malformed_json() {
    let app = app();

    let (status, body) = send(&app, "POST", "/", Some(json!({ "title": "Untitled" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], json!("bad_request"));

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_isbn_is_a_validation_failure() {
    let app = app();
    create(&app, book("0553380168", "SCIENCE")).await;

    let (status, body) = send(&app, "POST", "/", Some(book("0553380168", "HISTORY"))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("Validation failed"));
    assert_eq!(body["error"]["code"], json!("conflict"));
}

#[tokio::test]
async fn list_defaults_to_ten_newest_first() {
    let app = app();
    for n in 0..12 {
        create(&app, book(&format!("{:010}", n), "HISTORY")).await;
    }

    let (status, body) = send(&app, "GET", "/", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], json!("Books retrieved successfully"));
    let books = body["books"].as_array().unwrap();
    assert_eq!(books.len(), 10);

    let created: Vec<chrono::DateTime<chrono::Utc>> = books
        .iter()
        .map(|book| book["createdAt"].as_str().unwrap().parse().unwrap())
        .collect();
    assert!(created.windows(2).all(|pair| pair[0] >= pair[1]));
}

#[tokio::test]
async fn list_filters_by_genre() {
    let app = app();
    create(&app, book("0000000001", "SCIENCE")).await;
    create(&app, book("0000000002", "FANTASY")).await;
    create(&app, book("0000000003", "SCIENCE")).await;

    let (status, body) = send(&app, "GET", "/?filter=SCIENCE", None).await;

    assert_eq!(status, StatusCode::OK);
    let books = body["books"].as_array().unwrap();
    assert_eq!(books.len(), 2);
    assert!(books.iter().all(|book| book["genre"] == json!("SCIENCE")));
}

#[tokio::test]
async fn list_sorts_and_limits() {
    let app = app();
    for (isbn, copies) in [("0000000001", 7), ("0000000002", 2), ("0000000003", 5)] {
        let mut body = book(isbn, "FICTION");
        body["copies"] = json!(copies);
        create(&app, body).await;
    }

    let (_, body) = send(&app, "GET", "/?sortBy=copies&sort=asc&limit=2", None).await;
    let copies: Vec<u64> = body["books"]
        .as_array()
        .unwrap()
        .iter()
        .map(|book| book["copies"].as_u64().unwrap())
        .collect();

    assert_eq!(copies, vec![2, 5]);
}

#[tokio::test]
async fn list_with_unknown_sort_field_fails_with_500() {
    let (status, body) = send(&app(), "GET", "/?sortBy=nope", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["message"], json!("Failed to retrieve books"));
}

#[tokio::test]
async fn get_returns_book_or_null() {
    let app = app();
    let created = create(&app, book("0553380168", "SCIENCE")).await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = send(&app, "GET", &format!("/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], json!("Book retrieved successfully"));
    assert_eq!(body["book"], created);

    let (status, body) = send(&app, "GET", "/does-not-exist", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["book"], Value::Null);
}

#[tokio::test]
async fn update_applies_partial_changes() {
    let app = app();
    let created = create(&app, book("0553380168", "SCIENCE")).await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/{id}"),
        Some(json!({ "copies": 0, "available": false, "genre": "history" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], json!("Book updated successfully"));
    assert_eq!(body["book"]["copies"], json!(0));
    assert_eq!(body["book"]["available"], json!(false));
    assert_eq!(body["book"]["genre"], json!("HISTORY"));
    assert_eq!(body["book"]["title"], created["title"]);
    assert_eq!(body["book"]["createdAt"], created["createdAt"]);
}

#[tokio::test]
async fn update_reruns_model_validation() {
    let app = app();
    let created = create(&app, book("0553380168", "SCIENCE")).await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = send(&app, "PUT", &format!("/{id}"), Some(json!({ "copies": -3 }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("Validation failed"));
    assert_eq!(body["error"]["details"][0]["field"], json!("copies"));
}

#[tokio::test]
async fn update_of_unknown_id_returns_null_book() {
    let (status, body) = send(&app(), "PUT", "/missing", Some(json!({ "copies": 1 }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["book"], Value::Null);
}

#[tokio::test]
async fn delete_returns_null_book_whether_or_not_it_existed() {
    let app = app();
    let created = create(&app, book("0553380168", "SCIENCE")).await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = send(&app, "DELETE", &format!("/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], json!("Book deleted successfully"));
    assert_eq!(body["book"], Value::Null);

    let (_, body) = send(&app, "GET", &format!("/{id}"), None).await;
    assert_eq!(body["book"], Value::Null);

    let (status, body) = send(&app, "DELETE", &format!("/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["book"], Value::Null);
}

#[tokio::test]
async fn update_rejects_explicit_null_on_required_field() {
    let app = app();
    let created = create(&app, book("0553380168", "SCIENCE")).await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = send(&app, "PUT", &format!("/{id}"), Some(json!({ "title": null }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("Validation failed"));
    assert_eq!(body["error"]["details"][0]["field"], json!("title"));
    assert_eq!(body["error"]["details"][0]["message"], json!("title is required"));

    let (_, body) = send(&app, "GET", &format!("/{id}"), None).await;
    assert_eq!(body["book"]["title"], created["title"]);
}

#[tokio::test]
async fn update_treats_null_description_as_omitted() {
    let app = app();
    let created = create(&app, book("0553380168", "SCIENCE")).await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/{id}"),
        Some(json!({ "description": null, "copies": 9 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["book"]["description"], created["description"]);
    assert_eq!(body["book"]["copies"], json!(9));
}

#[tokio::test]
async fn update_of_unknown_id_with_taken_isbn_returns_null_book() {
    let app = app();
    create(&app, book("0553380168", "SCIENCE")).await;

    let (status, body) = send(&app, "PUT", "/missing", Some(json!({ "isbn": "0553380168" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["book"], Value::Null);
}
