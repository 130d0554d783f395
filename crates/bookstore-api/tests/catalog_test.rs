//! End-to-end tests for authors and books through the gateway.

mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
async fn test_created_book_appears_in_genre_listing() {
    // Arrange
    let standalone = common::start(&[]).await;
    let app = common::app(&standalone);
    let (status, empty) = common::get_json(app.clone(), "/books?genre=scifi", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(empty, json!([]));

    // Act
    let (status, body) = common::post_json(
        app.clone(),
        "/books",
        &json!({
            "title": "Dune",
            "authorId": "a-1",
            "synopsis": "Spice",
            "imageUrl": "",
            "genre": "scifi",
        }),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body, Value::Null);
    let (_, books) = common::eventually(&app, "/books?genre=scifi", |_, body| {
        body.as_array().is_some_and(|books| !books.is_empty())
    })
    .await;
    let book = &books[0];
    assert_eq!(book["title"], "Dune");
    let id = book["id"].as_str().unwrap();
    assert!(!id.is_empty());

    let (status, fetched) = common::get_json(app, &format!("/books/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&fetched, book);
    standalone.shutdown().await;
}

#[tokio::test]
async fn test_book_update_and_delete_are_eventually_visible() {
    let standalone = common::start(&[]).await;
    let app = common::app(&standalone);
    common::post_json(
        app.clone(),
        "/books",
        &json!({"title": "Emma", "authorId": "a-2", "synopsis": "Matchmaking", "genre": "romance"}),
    )
    .await;
    let (_, books) = common::eventually(&app, "/books", |_, body| {
        body.as_array().is_some_and(|books| books.len() == 1)
    })
    .await;
    let uri = format!("/books/{}", books[0]["id"].as_str().unwrap());

    let (updated, _) = common::send_json(app.clone(), "PATCH", &uri, &json!({"genre": "classic"})).await;
    common::eventually(&app, &uri, |_, body| body["genre"] == "classic").await;
    let (deleted, _) = common::send_json(app.clone(), "DELETE", &uri, &json!({})).await;
    let (status, body) = common::eventually(&app, &uri, |status, _| status == StatusCode::NOT_FOUND).await;

    assert_eq!(updated, StatusCode::ACCEPTED);
    assert_eq!(deleted, StatusCode::ACCEPTED);
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
    standalone.shutdown().await;
}

#[tokio::test]
async fn test_unknown_author_is_404_with_error() {
    let standalone = common::start(&[]).await;

    let (status, body) =
        common::get_json(common::app(&standalone), "/authors/does-not-exist", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("does-not-exist"));
    standalone.shutdown().await;
}

#[tokio::test]
async fn test_author_create_then_delete() {
    let standalone = common::start(&[]).await;
    let app = common::app(&standalone);

    let (created, _) = common::post_json(
        app.clone(),
        "/authors",
        &json!({"name": "Octavia E. Butler", "dateOfBirth": "1947-06-22T00:00:00Z"}),
    )
    .await;
    let (_, authors) = common::eventually(&app, "/authors", |_, body| {
        body.as_array().is_some_and(|authors| authors.len() == 1)
    })
    .await;
    let uri = format!("/authors/{}", authors[0]["id"].as_str().unwrap());
    let (status, author) = common::get_json(app.clone(), &uri, None).await;
    let (deleted, _) = common::send_json(app.clone(), "DELETE", &uri, &json!({})).await;
    common::eventually(&app, "/authors", |_, body| body == &json!([])).await;

    assert_eq!(created, StatusCode::ACCEPTED);
    assert_eq!(status, StatusCode::OK);
    assert_eq!(author["name"], "Octavia E. Butler");
    assert_eq!(deleted, StatusCode::ACCEPTED);
    standalone.shutdown().await;
}
