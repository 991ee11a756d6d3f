//! HTTP-level integration tests for carousel management.
//!
//! Carousels share the article contract; these tests focus on the routes
//! being wired to their own table.

mod common;

use axum::http::StatusCode;
use common::{delete_json_auth, expect_json, get, post_json_auth};
use serde_json::{json, Value};
use sqlx::PgPool;

fn carousel(title: &str, position: i32) -> Value {
    json!({
        "title": title,
        "imageUrl": "https://media.example.com/banner.jpg",
        "linkUrl": "https://www.example.com",
        "position": position,
    })
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn carousel_crud_roundtrip(pool: PgPool) {
    let test = common::build_test_app(pool);

    let response = post_json_auth(
        test.app.clone(),
        "/bo/discover/carousel/add",
        carousel("Spring Banner", 1),
        &test.admin_token,
    )
    .await;
    let created = expect_json(response, StatusCode::OK).await["data"].clone();
    let id = created["id"].as_i64().unwrap();

    let response = post_json_auth(
        test.app.clone(),
        "/bo/discover/carousel/edit",
        json!({ "id": id, "linkUrl": "https://spring.example.com", "position": 3 }),
        &test.admin_token,
    )
    .await;
    let snapshot = expect_json(response, StatusCode::OK).await;
    assert_eq!(snapshot["data"]["linkUrl"], "https://www.example.com");

    let response = get(test.app.clone(), "/discover/carousel/find").await;
    let page = expect_json(response, StatusCode::OK).await;
    assert_eq!(page["total"], 1);
    assert_eq!(page["data"][0]["linkUrl"], "https://spring.example.com");
    assert_eq!(page["data"][0]["position"], 3);
    assert_eq!(page["data"][0]["title"], "Spring Banner");

    let response = delete_json_auth(
        test.app.clone(),
        "/bo/discover/carousel/del",
        json!({ "id": id }),
        &test.admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(test.app, "/discover/carousel/find").await;
    assert_eq!(expect_json(response, StatusCode::OK).await["total"], 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn carousels_and_articles_are_separate(pool: PgPool) {
    let test = common::build_test_app(pool);

    let response = post_json_auth(
        test.app.clone(),
        "/bo/discover/carousel/add",
        carousel("Shared Title", 1),
        &test.admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // The same title is allowed in the other collection.
    let response = post_json_auth(
        test.app.clone(),
        "/bo/discover/article/add",
        carousel("Shared Title", 1),
        &test.admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(test.app.clone(), "/discover/carousel/find").await;
    assert_eq!(expect_json(response, StatusCode::OK).await["total"], 1);

    let response = get(test.app, "/discover/article/find").await;
    assert_eq!(expect_json(response, StatusCode::OK).await["total"], 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn carousel_find_sorts_by_created_at(pool: PgPool) {
    let test = common::build_test_app(pool.clone());
    for (title, position) in [("First", 3), ("Second", 2), ("Third", 1)] {
        let response = post_json_auth(
            test.app.clone(),
            "/bo/discover/carousel/add",
            carousel(title, position),
            &test.admin_token,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    // Spread creation times so the ordering does not depend on clock
    // resolution.
    sqlx::query(
        "UPDATE carousels SET created_at = NOW() - (position || ' minutes')::interval",
    )
    .execute(&pool)
    .await
    .unwrap();

    let response = get(test.app, "/discover/carousel/find?sortBy=created_at&order=DESC").await;
    let page = expect_json(response, StatusCode::OK).await;
    let titles: Vec<&str> = page["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Third", "Second", "First"]);
}
